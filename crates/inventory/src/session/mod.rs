//! Viewer sessions and switch suppression.
//!
//! Each viewer maps to one [`ViewerSession`] value under a single lock.
//! A programmatic page switch moves the session to
//! [`ViewerSession::Switching`] before the host is asked to show the new
//! container, and a [`SwitchTicket`] moves it back to
//! [`ViewerSession::Viewing`] when dropped. While switching, the close
//! notification that the host emits for the old container is recognised as
//! part of the switch and does not end the session.
//!
//! The lock is never held across host calls or observer callbacks, so a
//! close notification delivered re-entrantly from inside `show_container`
//! can read the table.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::ids::{PageId, ViewerId};

/// Where one viewer currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerSession {
	/// Settled on a page.
	Viewing(PageId),
	/// Mid-switch; the session already points at `to`.
	Switching { from: PageId, to: PageId },
}

impl ViewerSession {
	/// Page the session points at.
	pub fn page(&self) -> PageId {
		match *self {
			Self::Viewing(page) => page,
			Self::Switching { to, .. } => to,
		}
	}

	pub fn is_switching(&self) -> bool {
		matches!(self, Self::Switching { .. })
	}
}

/// Result of a genuine close request against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
	/// The viewer had no session.
	Absent,
	/// The viewer is switching pages; the close belongs to the switch.
	Suppressed,
	/// The session was removed.
	Removed(PageId),
}

/// Viewer to session map for one paged inventory.
#[derive(Default)]
pub struct SessionTable {
	sessions: Mutex<FxHashMap<ViewerId, ViewerSession>>,
}

impl SessionTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, viewer: ViewerId) -> Option<ViewerSession> {
		self.sessions.lock().get(&viewer).copied()
	}

	pub fn current_page(&self, viewer: ViewerId) -> Option<PageId> {
		self.get(viewer).map(|session| session.page())
	}

	pub fn is_switching(&self, viewer: ViewerId) -> bool {
		self.get(viewer).is_some_and(|session| session.is_switching())
	}

	/// Points `viewer` at `page` and returns the ticket that ends the open.
	///
	/// A viewer without a session becomes [`ViewerSession::Viewing`]; a
	/// viewer with one becomes [`ViewerSession::Switching`] until the ticket
	/// is dropped.
	pub fn begin_open(&self, viewer: ViewerId, page: PageId) -> SwitchTicket<'_> {
		let mut sessions = self.sessions.lock();
		let previous = sessions.get(&viewer).copied();
		let next = match previous {
			None => ViewerSession::Viewing(page),
			Some(current) => ViewerSession::Switching {
				from: current.page(),
				to: page,
			},
		};
		sessions.insert(viewer, next);
		drop(sessions);
		trace!(%viewer, ?previous, ?next, "session.begin_open");

		SwitchTicket {
			table: self,
			viewer,
			previous,
			to: page,
			committed: false,
		}
	}

	/// Ends the session unless the viewer is mid-switch.
	pub fn close(&self, viewer: ViewerId) -> CloseDecision {
		let mut sessions = self.sessions.lock();
		match sessions.get(&viewer).copied() {
			None => CloseDecision::Absent,
			Some(ViewerSession::Switching { .. }) => CloseDecision::Suppressed,
			Some(ViewerSession::Viewing(page)) => {
				sessions.remove(&viewer);
				trace!(%viewer, %page, "session.close");
				CloseDecision::Removed(page)
			}
		}
	}

	/// Removes the session only if it is still settled on `page`.
	pub fn close_if_viewing(&self, viewer: ViewerId, page: PageId) -> bool {
		let mut sessions = self.sessions.lock();
		if sessions.get(&viewer) != Some(&ViewerSession::Viewing(page)) {
			return false;
		}
		sessions.remove(&viewer);
		trace!(%viewer, %page, "session.close_if_viewing");
		true
	}

	/// Removes the session regardless of any switch in flight.
	pub fn remove(&self, viewer: ViewerId) -> Option<ViewerSession> {
		let removed = self.sessions.lock().remove(&viewer);
		trace!(%viewer, ?removed, "session.remove");
		removed
	}

	/// Viewer to page copy of the table.
	pub fn snapshot(&self) -> FxHashMap<ViewerId, PageId> {
		self.sessions.lock().iter().map(|(&viewer, session)| (viewer, session.page())).collect()
	}

	pub fn len(&self) -> usize {
		self.sessions.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.sessions.lock().is_empty()
	}
}

/// Scope of one open; ends the switch when dropped.
///
/// Dropping a committed ticket settles a still-switching session on the
/// target page. Dropping an uncommitted ticket (the show command failed or
/// panicked) restores the session that existed before the open.
#[must_use = "dropping the ticket immediately ends the switch"]
pub struct SwitchTicket<'a> {
	table: &'a SessionTable,
	viewer: ViewerId,
	previous: Option<ViewerSession>,
	to: PageId,
	committed: bool,
}

impl SwitchTicket<'_> {
	/// Session state before this open began.
	pub fn previous(&self) -> Option<ViewerSession> {
		self.previous
	}

	pub fn is_switch(&self) -> bool {
		self.previous.is_some()
	}

	/// Marks the show command as successful and ends the switch.
	pub fn commit(mut self) {
		self.committed = true;
	}
}

impl Drop for SwitchTicket<'_> {
	fn drop(&mut self) {
		let mut sessions = self.table.sessions.lock();
		let Some(&current) = sessions.get(&self.viewer) else {
			// Disconnected mid-open.
			return;
		};
		if current.page() != self.to {
			// A later open has taken over this viewer.
			return;
		}

		if self.committed {
			if current.is_switching() {
				sessions.insert(self.viewer, ViewerSession::Viewing(self.to));
			}
			trace!(viewer = %self.viewer, page = %self.to, "session.end_open");
			return;
		}

		match self.previous {
			Some(previous) => {
				sessions.insert(self.viewer, previous);
			}
			None => {
				sessions.remove(&self.viewer);
			}
		}
		trace!(viewer = %self.viewer, previous = ?self.previous, "session.rollback_open");
	}
}

//! Translation of inbound host events into inventory operations.
//!
//! The bridge is what a [`crate::Host`] sees as an [`InventoryListener`].
//! It resolves the viewer's session, consumes switch-generated close
//! notifications, dispatches navigation actions through the host scheduler
//! and fans everything else out to the [`crate::CallbackBus`].

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::{debug, trace, warn};

use crate::callbacks::DispatchReport;
use crate::host::{Host, InventoryListener, Task, Viewer};
use crate::inventory::{PagedInventory, Shared};
use crate::navigation::NavigationAction;
use crate::page::Page;
use crate::session::{CloseDecision, ViewerSession};

/// Kind of click reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickKind {
	Left,
	ShiftLeft,
	Right,
	ShiftRight,
	Middle,
	NumberKey,
	DoubleClick,
	Drop,
	ControlDrop,
	SwapOffhand,
	WindowBorderLeft,
	WindowBorderRight,
	Creative,
	Unknown,
}

/// Inbound click, as delivered by the host.
pub struct ClickEvent<H: Host> {
	pub viewer: H::Viewer,
	/// Stack under the cursor, `None` for an empty slot.
	pub clicked_item: Option<H::Item>,
	pub kind: ClickKind,
	/// Slot within the clicked container.
	pub slot: i32,
	/// Slot within the whole view.
	pub raw_slot: i32,
	/// Pressed hotbar key (0-8) for [`ClickKind::NumberKey`] clicks.
	pub hotbar_button: Option<u8>,
	/// Container that was clicked; `None` when clicking outside the window.
	pub container: Option<Arc<H::Container>>,
	cancelled: bool,
}

impl<H: Host> ClickEvent<H> {
	pub fn new(viewer: H::Viewer, kind: ClickKind, slot: i32) -> Self {
		Self {
			viewer,
			clicked_item: None,
			kind,
			slot,
			raw_slot: slot,
			hotbar_button: None,
			container: None,
			cancelled: false,
		}
	}

	pub fn with_item(mut self, item: Option<H::Item>) -> Self {
		self.clicked_item = item;
		self
	}

	pub fn with_container(mut self, container: Option<Arc<H::Container>>) -> Self {
		self.container = container;
		self
	}

	pub fn with_raw_slot(mut self, raw_slot: i32) -> Self {
		self.raw_slot = raw_slot;
		self
	}

	pub fn with_hotbar_button(mut self, button: Option<u8>) -> Self {
		self.hotbar_button = button;
		self
	}

	/// Whether the host should skip its default item movement.
	pub fn is_cancelled(&self) -> bool {
		self.cancelled
	}

	pub fn set_cancelled(&mut self, cancelled: bool) {
		self.cancelled = cancelled;
	}
}

impl<H: Host> fmt::Debug for ClickEvent<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClickEvent")
			.field("viewer", &self.viewer)
			.field("clicked_item", &self.clicked_item)
			.field("kind", &self.kind)
			.field("slot", &self.slot)
			.field("raw_slot", &self.raw_slot)
			.field("hotbar_button", &self.hotbar_button)
			.field("cancelled", &self.cancelled)
			.finish_non_exhaustive()
	}
}

/// Inbound close notification.
pub struct CloseEvent<H: Host> {
	pub viewer: H::Viewer,
	pub container: Arc<H::Container>,
}

impl<H: Host> CloseEvent<H> {
	pub fn new(viewer: H::Viewer, container: Arc<H::Container>) -> Self {
		Self { viewer, container }
	}
}

/// Click context handed to click observers.
pub struct PageClick<H: Host> {
	pub inventory: PagedInventory<H>,
	pub page: Page<H::Container>,
	pub clicked_item: Option<H::Item>,
	pub viewer: H::Viewer,
	pub kind: ClickKind,
	pub slot: i32,
	pub raw_slot: i32,
	pub hotbar_button: Option<u8>,
}

/// Close context handed to close observers.
pub struct PageClose<H: Host> {
	pub viewer: H::Viewer,
	pub inventory: PagedInventory<H>,
	pub page: Page<H::Container>,
}

/// What the bridge did with a click.
#[derive(Debug)]
pub enum ClickOutcome {
	/// Not a click on a page the viewer's session points at.
	Ignored,
	/// Matched navigation items; one action was scheduled per match.
	Navigated(Vec<NavigationAction>),
	/// Delivered to click observers.
	Observed(DispatchReport),
}

/// What the bridge did with a close notification.
#[derive(Debug)]
pub enum CloseOutcome {
	/// Viewer had no session in this inventory, or the closed container is
	/// not the page the session points at.
	Ignored,
	/// The close was produced by a page switch.
	Suppressed,
	/// The session pointed at a page no longer registered and was dropped.
	DroppedDangling,
	/// Close observers ran and the session ended.
	Closed(DispatchReport),
}

/// Listener wiring one [`PagedInventory`] to its host.
///
/// Holds the inventory weakly; after every inventory handle is dropped the
/// bridge ignores all events.
pub struct EventBridge<H: Host> {
	shared: Weak<Shared<H>>,
}

impl<H: Host> Clone for EventBridge<H> {
	fn clone(&self) -> Self {
		Self {
			shared: Weak::clone(&self.shared),
		}
	}
}

impl<H: Host> EventBridge<H> {
	pub(crate) fn new(shared: Weak<Shared<H>>) -> Self {
		Self { shared }
	}

	fn inventory(&self) -> Option<PagedInventory<H>> {
		self.shared.upgrade().map(PagedInventory::from_shared)
	}

	pub fn handle_click(&self, event: &mut ClickEvent<H>) -> ClickOutcome {
		let Some(inventory) = self.inventory() else {
			return ClickOutcome::Ignored;
		};
		let Some(clicked) = event.container.as_ref() else {
			return ClickOutcome::Ignored;
		};
		let Some(session) = inventory.shared().sessions.get(event.viewer.id()) else {
			return ClickOutcome::Ignored;
		};
		let Some(page) = tracked_page(inventory.shared(), session, clicked) else {
			trace!(viewer = %event.viewer.id(), "click.foreign_container");
			return ClickOutcome::Ignored;
		};
		event.set_cancelled(true);

		let matched = match &event.clicked_item {
			Some(item) => inventory.shared().navigation.matching(item),
			None => Vec::new(),
		};
		if !matched.is_empty() {
			let actions: Vec<NavigationAction> = matched.iter().map(|item| item.action()).collect();
			for &action in &actions {
				schedule_action(&inventory, event.viewer.clone(), action);
			}
			debug!(viewer = %event.viewer.id(), ?actions, "click.navigate");
			return ClickOutcome::Navigated(actions);
		}

		let click = PageClick {
			inventory: inventory.clone(),
			page,
			clicked_item: event.clicked_item.clone(),
			viewer: event.viewer.clone(),
			kind: event.kind,
			slot: event.slot,
			raw_slot: event.raw_slot,
			hotbar_button: event.hotbar_button,
		};
		ClickOutcome::Observed(inventory.shared().callbacks.notify_click(&click))
	}

	pub fn handle_close(&self, event: &CloseEvent<H>) -> CloseOutcome {
		let Some(inventory) = self.inventory() else {
			return CloseOutcome::Ignored;
		};
		let viewer = event.viewer.id();
		let shared = inventory.shared();
		let Some(session) = shared.sessions.get(viewer) else {
			return CloseOutcome::Ignored;
		};
		if session.is_switching() {
			trace!(%viewer, "close.suppressed");
			return CloseOutcome::Suppressed;
		}

		let Some(page) = shared.pages.get_by_id(session.page()) else {
			return match shared.sessions.close(viewer) {
				CloseDecision::Suppressed => CloseOutcome::Suppressed,
				CloseDecision::Absent => CloseOutcome::Ignored,
				CloseDecision::Removed(page) => {
					warn!(%viewer, %page, "close.dangling_session");
					CloseOutcome::DroppedDangling
				}
			};
		};
		if !Arc::ptr_eq(&event.container, page.container()) {
			trace!(%viewer, page = %page.id(), "close.foreign_container");
			return CloseOutcome::Ignored;
		}

		let close = PageClose {
			viewer: event.viewer.clone(),
			inventory: inventory.clone(),
			page,
		};
		let report = shared.callbacks.notify_close(&close);
		shared.sessions.close_if_viewing(viewer, close.page.id());
		debug!(%viewer, page = %close.page.id(), "close.genuine");
		CloseOutcome::Closed(report)
	}

	pub fn handle_disconnect(&self, viewer: &H::Viewer) -> bool {
		let Some(inventory) = self.inventory() else {
			return false;
		};
		let removed = inventory.shared().sessions.remove(viewer.id());
		if removed.is_some() {
			debug!(viewer = %viewer.id(), "disconnect.session_removed");
		}
		removed.is_some()
	}
}

/// Page of `session` whose container is `container`.
///
/// While switching, both the target page and the page being left match.
fn tracked_page<H: Host>(
	shared: &Shared<H>,
	session: ViewerSession,
	container: &Arc<H::Container>,
) -> Option<Page<H::Container>> {
	let candidates = match session {
		ViewerSession::Viewing(page) => [Some(page), None],
		ViewerSession::Switching { from, to } => [Some(to), Some(from)],
	};
	candidates
		.into_iter()
		.flatten()
		.filter_map(|id| shared.pages.get_by_id(id))
		.find(|page| Arc::ptr_eq(page.container(), container))
}

fn schedule_action<H: Host>(inventory: &PagedInventory<H>, viewer: H::Viewer, action: NavigationAction) {
	let host = Arc::clone(&inventory.shared().host);
	let task: Task = match action {
		NavigationAction::PreviousPage => {
			let inventory = inventory.clone();
			Box::new(move || {
				if let Err(err) = inventory.open_previous(&viewer) {
					warn!(viewer = %viewer.id(), %err, "navigation.previous failed");
				}
			})
		}
		NavigationAction::NextPage => {
			let inventory = inventory.clone();
			Box::new(move || {
				if let Err(err) = inventory.open_next(&viewer) {
					warn!(viewer = %viewer.id(), %err, "navigation.next failed");
				}
			})
		}
		NavigationAction::Close => {
			let target = Arc::clone(&host);
			Box::new(move || target.close_container(&viewer))
		}
	};
	trace!(?action, "navigation.schedule");
	host.schedule(task);
}

impl<H: Host> InventoryListener<H> for EventBridge<H> {
	fn on_click(&self, event: &mut ClickEvent<H>) {
		self.handle_click(event);
	}

	fn on_close(&self, event: &CloseEvent<H>) {
		self.handle_close(event);
	}

	fn on_disconnect(&self, viewer: &H::Viewer) {
		self.handle_disconnect(viewer);
	}
}

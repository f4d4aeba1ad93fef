//! The paged inventory aggregate and its builder.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::bridge::{EventBridge, PageClick, PageClose};
use crate::callbacks::{CallbackBus, ObserverId};
use crate::error::{PagedInventoryError, Result};
use crate::host::{Host, Viewer};
use crate::ids::{InventoryId, PageId, ViewerId};
use crate::navigation::{NavigationItem, NavigationRegistry};
use crate::page::{Page, PageRegistry};
use crate::session::{SessionTable, ViewerSession};

/// Result of an open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
	/// First page shown to a viewer without a session.
	Opened { page: PageId },
	/// Viewer moved from one page to another.
	Switched { from: PageId, to: PageId },
	/// No page is registered under the requested number.
	PageMissing(i32),
	/// Previous/next requested for a viewer without a session.
	NoSession,
	/// The viewer's page has been removed from the registry.
	Dangling { page: PageId },
	/// The adjacent page number is not representable.
	NoAdjacentPage,
}

impl OpenOutcome {
	/// True when a container was shown.
	pub fn is_shown(&self) -> bool {
		matches!(self, Self::Opened { .. } | Self::Switched { .. })
	}
}

pub(crate) struct Shared<H: Host> {
	pub(crate) id: InventoryId,
	pub(crate) host: Arc<H>,
	pub(crate) pages: PageRegistry<H::Container>,
	pub(crate) navigation: NavigationRegistry<H::Item>,
	pub(crate) sessions: SessionTable,
	pub(crate) callbacks: CallbackBus<H>,
}

/// A multi-page container shown to many viewers at once.
///
/// Cheap to clone; clones share the same registries. Each viewer may be on a
/// different page. Programmatic switches between pages are not reported to
/// close observers.
pub struct PagedInventory<H: Host> {
	shared: Arc<Shared<H>>,
}

impl<H: Host> Clone for PagedInventory<H> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<H: Host> fmt::Debug for PagedInventory<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PagedInventory")
			.field("id", &self.shared.id)
			.field("pages", &self.shared.pages.len())
			.field("viewers", &self.shared.sessions.len())
			.finish_non_exhaustive()
	}
}

impl<H: Host> PagedInventory<H> {
	/// Creates an empty inventory. Events only reach it once [`Self::bridge`]
	/// is registered with the host; [`Self::builder`] does that for you.
	pub fn new(host: Arc<H>) -> Self {
		Self {
			shared: Arc::new(Shared {
				id: InventoryId::new(),
				host,
				pages: PageRegistry::new(),
				navigation: NavigationRegistry::new(),
				sessions: SessionTable::new(),
				callbacks: CallbackBus::new(),
			}),
		}
	}

	pub fn builder(host: Arc<H>) -> PagedInventoryBuilder<H> {
		PagedInventoryBuilder::new(host)
	}

	pub(crate) fn from_shared(shared: Arc<Shared<H>>) -> Self {
		Self { shared }
	}

	pub(crate) fn shared(&self) -> &Shared<H> {
		&self.shared
	}

	pub fn id(&self) -> InventoryId {
		self.shared.id
	}

	pub fn host(&self) -> &Arc<H> {
		&self.shared.host
	}

	/// Listener to register with the host.
	pub fn bridge(&self) -> EventBridge<H> {
		EventBridge::new(Arc::downgrade(&self.shared))
	}

	pub fn add_page(&self, page: Page<H::Container>) -> Result<i32> {
		self.shared.pages.add(page)
	}

	pub fn set_page(&self, number: i32, page: Page<H::Container>) -> Option<Page<H::Container>> {
		self.shared.pages.set(number, page)
	}

	pub fn remove_page(&self, number: i32) -> Option<Page<H::Container>> {
		self.shared.pages.remove(number)
	}

	pub fn page(&self, number: i32) -> Option<Page<H::Container>> {
		self.shared.pages.get(number)
	}

	pub fn page_by_id(&self, id: PageId) -> Option<Page<H::Container>> {
		self.shared.pages.get_by_id(id)
	}

	pub fn page_number(&self, page: &Page<H::Container>) -> Option<i32> {
		self.shared.pages.number_of(page)
	}

	pub fn page_number_of(&self, id: PageId) -> Option<i32> {
		self.shared.pages.number_of_id(id)
	}

	pub fn pages(&self) -> BTreeMap<i32, Page<H::Container>> {
		self.shared.pages.snapshot()
	}

	/// Registers a navigation item and stamps it onto every current page.
	pub fn set_navigation_item(&self, position: usize, item: NavigationItem<H::Item>) -> Result<()> {
		self.shared.navigation.set(position, item, &self.shared.pages)?;
		Ok(())
	}

	/// Unregisters a navigation item; `None` when the slot was not set.
	pub fn remove_navigation_item(&self, position: usize) -> Option<NavigationItem<H::Item>> {
		self.shared.navigation.remove(position, &self.shared.pages)
	}

	pub fn navigation_items(&self) -> BTreeMap<usize, NavigationItem<H::Item>> {
		self.shared.navigation.snapshot()
	}

	/// Writes every navigation item onto every current page, including pages
	/// added after the items were registered.
	pub fn restamp_navigation(&self) {
		self.shared.navigation.restamp(&self.shared.pages);
	}

	/// Shows page `number` to `viewer`. A missing page is a no-op.
	pub fn open(&self, viewer: &H::Viewer, number: i32) -> Result<OpenOutcome> {
		let Some(page) = self.shared.pages.get(number) else {
			debug!(viewer = %viewer.id(), page = number, "open.page_missing");
			return Ok(OpenOutcome::PageMissing(number));
		};
		self.open_page(viewer, &page)
	}

	fn open_page(&self, viewer: &H::Viewer, page: &Page<H::Container>) -> Result<OpenOutcome> {
		let ticket = self.shared.sessions.begin_open(viewer.id(), page.id());
		let outcome = match ticket.previous() {
			None => OpenOutcome::Opened { page: page.id() },
			Some(previous) => OpenOutcome::Switched {
				from: previous.page(),
				to: page.id(),
			},
		};

		// The host delivers the close for the old container from inside this call.
		if let Err(err) = self.shared.host.show_container(viewer, page.container()) {
			warn!(viewer = %viewer.id(), page = %page.id(), %err, "open.show_failed");
			drop(ticket);
			return Err(PagedInventoryError::Host(err));
		}
		ticket.commit();
		debug!(viewer = %viewer.id(), ?outcome, "open");
		Ok(outcome)
	}

	pub fn open_previous(&self, viewer: &H::Viewer) -> Result<OpenOutcome> {
		self.open_adjacent(viewer, -1)
	}

	pub fn open_next(&self, viewer: &H::Viewer) -> Result<OpenOutcome> {
		self.open_adjacent(viewer, 1)
	}

	fn open_adjacent(&self, viewer: &H::Viewer, step: i32) -> Result<OpenOutcome> {
		let Some(current) = self.shared.sessions.current_page(viewer.id()) else {
			return Ok(OpenOutcome::NoSession);
		};
		let Some(number) = self.shared.pages.number_of_id(current) else {
			warn!(viewer = %viewer.id(), page = %current, "open.dangling_session");
			return Ok(OpenOutcome::Dangling { page: current });
		};
		let Some(target) = number.checked_add(step) else {
			return Ok(OpenOutcome::NoAdjacentPage);
		};
		self.open(viewer, target)
	}

	/// Page the viewer currently has open, if it is still registered.
	pub fn page_viewed(&self, viewer: &H::Viewer) -> Option<Page<H::Container>> {
		let current = self.shared.sessions.current_page(viewer.id())?;
		self.shared.pages.get_by_id(current)
	}

	pub fn session(&self, viewer: ViewerId) -> Option<ViewerSession> {
		self.shared.sessions.get(viewer)
	}

	pub fn is_switching(&self, viewer: ViewerId) -> bool {
		self.shared.sessions.is_switching(viewer)
	}

	/// Viewer to page mapping.
	pub fn viewers(&self) -> FxHashMap<ViewerId, PageId> {
		self.shared.sessions.snapshot()
	}

	pub fn add_on_click<F>(&self, observer: F) -> ObserverId
	where
		F: Fn(&PageClick<H>) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.shared.callbacks.add_on_click(observer)
	}

	pub fn add_on_close<F>(&self, observer: F) -> ObserverId
	where
		F: Fn(&PageClose<H>) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.shared.callbacks.add_on_close(observer)
	}

	pub fn remove_observer(&self, id: ObserverId) -> bool {
		self.shared.callbacks.remove(id)
	}
}

enum PageSource<C> {
	Container(C),
	Page(Page<C>),
}

/// Fluent construction of a [`PagedInventory`].
///
/// Pages are inserted before navigation items are stamped, so every page
/// set through the builder carries every navigation item.
pub struct PagedInventoryBuilder<H: Host> {
	host: Arc<H>,
	pages: Vec<(i32, PageSource<H::Container>)>,
	navigation: Vec<(usize, NavigationItem<H::Item>)>,
	inventory: PagedInventory<H>,
}

impl<H: Host> PagedInventoryBuilder<H> {
	fn new(host: Arc<H>) -> Self {
		Self {
			inventory: PagedInventory::new(Arc::clone(&host)),
			host,
			pages: Vec::new(),
			navigation: Vec::new(),
		}
	}

	/// Wraps `container` in a new page at `number`.
	pub fn page(mut self, number: i32, container: H::Container) -> Self {
		self.pages.push((number, PageSource::Container(container)));
		self
	}

	pub fn with_page(mut self, number: i32, page: Page<H::Container>) -> Self {
		self.pages.push((number, PageSource::Page(page)));
		self
	}

	pub fn navigation_item(mut self, slot: usize, item: NavigationItem<H::Item>) -> Self {
		self.navigation.push((slot, item));
		self
	}

	pub fn on_click<F>(self, observer: F) -> Self
	where
		F: Fn(&PageClick<H>) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.inventory.add_on_click(observer);
		self
	}

	pub fn on_close<F>(self, observer: F) -> Self
	where
		F: Fn(&PageClose<H>) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.inventory.add_on_close(observer);
		self
	}

	/// Populates the inventory and registers its bridge with the host.
	pub fn build(self) -> Result<PagedInventory<H>> {
		let Self {
			host,
			pages,
			navigation,
			inventory,
		} = self;

		for (number, source) in pages {
			let page = match source {
				PageSource::Container(container) => Page::new(container),
				PageSource::Page(page) => page,
			};
			inventory.set_page(number, page);
		}
		for (slot, item) in navigation {
			inventory.set_navigation_item(slot, item)?;
		}

		host.register_listener(Arc::new(inventory.bridge()));
		debug!(inventory = %inventory.id(), pages = inventory.shared.pages.len(), "inventory.build");
		Ok(inventory)
	}
}

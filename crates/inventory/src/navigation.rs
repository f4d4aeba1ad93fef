//! Navigation controls stamped uniformly across pages.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{PagedInventoryError, Result};
use crate::host::{Container, ItemStack};
use crate::page::PageRegistry;

/// What a navigation item does when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationAction {
	PreviousPage,
	NextPage,
	Close,
}

/// A control rendered at the same slot on every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationItem<I> {
	template: I,
	action: NavigationAction,
}

impl<I> NavigationItem<I> {
	pub fn new(template: I, action: NavigationAction) -> Self {
		Self { template, action }
	}

	pub fn previous_page(template: I) -> Self {
		Self::new(template, NavigationAction::PreviousPage)
	}

	pub fn next_page(template: I) -> Self {
		Self::new(template, NavigationAction::NextPage)
	}

	pub fn close(template: I) -> Self {
		Self::new(template, NavigationAction::Close)
	}

	/// Item stack written into each page's container.
	pub fn template(&self) -> &I {
		&self.template
	}

	pub fn action(&self) -> NavigationAction {
		self.action
	}
}

/// Slot-keyed navigation items.
pub struct NavigationRegistry<I> {
	items: RwLock<BTreeMap<usize, NavigationItem<I>>>,
}

impl<I> Default for NavigationRegistry<I> {
	fn default() -> Self {
		Self {
			items: RwLock::new(BTreeMap::new()),
		}
	}
}

impl<I: ItemStack> NavigationRegistry<I> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `item` at `position` and writes its template into every current page.
	///
	/// Fails without mutating anything when `position` lies outside any
	/// current page's container. Pages added later are not stamped.
	pub fn set<C>(&self, position: usize, item: NavigationItem<I>, pages: &PageRegistry<C>) -> Result<Option<NavigationItem<I>>>
	where
		C: Container<Item = I>,
	{
		let pages = pages.snapshot();
		if let Some((number, page)) = pages.iter().find(|(_, page)| position >= page.container().size()) {
			return Err(PagedInventoryError::InvalidArgument(format!(
				"navigation slot {position} is outside page {number} ({} slots)",
				page.container().size()
			)));
		}

		let template = item.template.clone();
		let previous = self.items.write().insert(position, item);
		debug!(slot = position, pages = pages.len(), "navigation.set");
		for page in pages.values() {
			page.container().set_item(position, Some(template.clone()));
		}
		Ok(previous)
	}

	/// Unregisters the item at `position` and strips its template from every current page.
	///
	/// Returns `None` without touching any container when nothing was set.
	pub fn remove<C>(&self, position: usize, pages: &PageRegistry<C>) -> Option<NavigationItem<I>>
	where
		C: Container<Item = I>,
	{
		let Some(removed) = self.items.write().remove(&position) else {
			debug!(slot = position, "navigation.remove on unset slot");
			return None;
		};
		debug!(slot = position, "navigation.remove");
		for page in pages.snapshot().values() {
			page.container().remove_all(&removed.template);
		}
		Some(removed)
	}

	/// Writes every registered item into every current page.
	pub fn restamp<C>(&self, pages: &PageRegistry<C>)
	where
		C: Container<Item = I>,
	{
		let items = self.snapshot();
		let pages = pages.snapshot();
		debug!(items = items.len(), pages = pages.len(), "navigation.restamp");
		for page in pages.values() {
			let size = page.container().size();
			for (&position, item) in items.iter().filter(|(position, _)| **position < size) {
				page.container().set_item(position, Some(item.template.clone()));
			}
		}
	}

	pub fn get(&self, position: usize) -> Option<NavigationItem<I>> {
		self.items.read().get(&position).cloned()
	}

	/// Items whose template is similar to `clicked`, in slot order.
	pub fn matching(&self, clicked: &I) -> Vec<NavigationItem<I>> {
		self.items.read().values().filter(|item| item.template.is_similar(clicked)).cloned().collect()
	}

	pub fn snapshot(&self) -> BTreeMap<usize, NavigationItem<I>> {
		self.items.read().clone()
	}
}

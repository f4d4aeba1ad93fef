//! Pages and the number-keyed page registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{PagedInventoryError, Result};
use crate::ids::PageId;

/// One addressable container with a stable identity.
pub struct Page<C> {
	id: PageId,
	container: Arc<C>,
}

impl<C> Page<C> {
	/// Wraps `container` in a page with a fresh identifier.
	pub fn new(container: C) -> Self {
		Self::from_arc(Arc::new(container))
	}

	/// Wraps a shared container in a page with a fresh identifier.
	pub fn from_arc(container: Arc<C>) -> Self {
		Self::with_id(PageId::new(), container)
	}

	/// Builds a page with a caller-chosen identifier.
	pub fn with_id(id: PageId, container: Arc<C>) -> Self {
		Self { id, container }
	}

	pub fn id(&self) -> PageId {
		self.id
	}

	pub fn container(&self) -> &Arc<C> {
		&self.container
	}
}

impl<C> Clone for Page<C> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			container: Arc::clone(&self.container),
		}
	}
}

impl<C> PartialEq for Page<C> {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl<C> Eq for Page<C> {}

impl<C> fmt::Debug for Page<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Page").field("id", &self.id).finish_non_exhaustive()
	}
}

/// Number-keyed page collection.
///
/// Numbers are arbitrary integers; [`PageRegistry::add`] appends after the
/// highest number and never fills gaps.
pub struct PageRegistry<C> {
	pages: RwLock<BTreeMap<i32, Page<C>>>,
}

impl<C> Default for PageRegistry<C> {
	fn default() -> Self {
		Self {
			pages: RwLock::new(BTreeMap::new()),
		}
	}
}

impl<C> PageRegistry<C> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts `page` at `max(numbers) + 1`, or `1` when empty.
	pub fn add(&self, page: Page<C>) -> Result<i32> {
		let mut pages = self.pages.write();
		let number = match pages.last_key_value() {
			None => 1,
			Some((&highest, _)) => highest
				.checked_add(1)
				.ok_or_else(|| PagedInventoryError::InvalidArgument(format!("no page number after {highest}")))?,
		};
		debug!(page = number, page_id = %page.id, "page.add");
		pages.insert(number, page);
		Ok(number)
	}

	/// Associates `number` with `page`, returning the page previously there.
	pub fn set(&self, number: i32, page: Page<C>) -> Option<Page<C>> {
		debug!(page = number, page_id = %page.id, "page.set");
		self.pages.write().insert(number, page)
	}

	/// Drops the association for `number`. Sessions pointing at the page are left alone.
	pub fn remove(&self, number: i32) -> Option<Page<C>> {
		let removed = self.pages.write().remove(&number);
		if removed.is_some() {
			debug!(page = number, "page.remove");
		}
		removed
	}

	pub fn get(&self, number: i32) -> Option<Page<C>> {
		self.pages.read().get(&number).cloned()
	}

	pub fn get_by_id(&self, id: PageId) -> Option<Page<C>> {
		self.pages.read().values().find(|page| page.id == id).cloned()
	}

	/// Returns the lowest number currently associated with `page`.
	pub fn number_of(&self, page: &Page<C>) -> Option<i32> {
		self.number_of_id(page.id)
	}

	pub fn number_of_id(&self, id: PageId) -> Option<i32> {
		self.pages.read().iter().find(|(_, page)| page.id == id).map(|(&number, _)| number)
	}

	pub fn len(&self) -> usize {
		self.pages.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.pages.read().is_empty()
	}

	/// Ordered copy of the current number to page mapping.
	pub fn snapshot(&self) -> BTreeMap<i32, Page<C>> {
		self.pages.read().clone()
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	fn page() -> Page<()> {
		Page::new(())
	}

	#[test]
	fn add_to_empty_registry_starts_at_one() {
		let registry = PageRegistry::new();
		assert_eq!(registry.add(page()), Ok(1));
		assert_eq!(registry.add(page()), Ok(2));
	}

	#[test]
	fn add_never_fills_gaps() {
		let registry = PageRegistry::new();
		registry.set(1, page());
		registry.set(5, page());
		assert_eq!(registry.add(page()), Ok(6));
		assert!(registry.get(2).is_none());
	}

	#[test]
	fn add_after_highest_negative_number() {
		let registry = PageRegistry::new();
		registry.set(-4, page());
		assert_eq!(registry.add(page()), Ok(-3));
	}

	#[test]
	fn add_rejects_overflowing_number() {
		let registry = PageRegistry::new();
		registry.set(i32::MAX, page());
		assert!(matches!(registry.add(page()), Err(PagedInventoryError::InvalidArgument(_))));
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn set_replaces_association_but_keeps_old_page_identity() {
		let registry = PageRegistry::new();
		let first = page();
		let second = page();
		registry.set(3, first.clone());

		let previous = registry.set(3, second.clone()).expect("page 3 was set");
		assert_eq!(previous.id(), first.id());
		assert_eq!(registry.get(3), Some(second));
		assert_eq!(registry.number_of(&first), None);
	}

	#[test]
	fn identity_lookups() {
		let registry = PageRegistry::new();
		let a = page();
		let b = page();
		registry.set(2, a.clone());
		registry.set(7, b.clone());

		assert_eq!(registry.get_by_id(b.id()), Some(b.clone()));
		assert_eq!(registry.number_of(&a), Some(2));
		assert_eq!(registry.number_of_id(b.id()), Some(7));
		assert_eq!(registry.number_of_id(PageId::new()), None);
	}

	#[test]
	fn same_page_under_two_numbers_reports_lowest() {
		let registry = PageRegistry::new();
		let shared = page();
		registry.set(9, shared.clone());
		registry.set(4, shared.clone());
		assert_eq!(registry.number_of(&shared), Some(4));
	}

	#[test]
	fn remove_returns_page_and_frees_number() {
		let registry = PageRegistry::new();
		let p = page();
		registry.set(1, p.clone());
		assert_eq!(registry.remove(1), Some(p));
		assert_eq!(registry.remove(1), None);
		assert!(registry.is_empty());
	}

	#[test]
	fn snapshot_is_detached_from_later_writes() {
		let registry = PageRegistry::new();
		registry.set(1, page());
		let snapshot = registry.snapshot();
		registry.set(2, page());
		assert_eq!(snapshot.keys().copied().collect::<Vec<_>>(), vec![1]);
	}

	proptest! {
		#[test]
		fn add_uses_max_plus_one(numbers in proptest::collection::btree_set(-1000i32..1000, 0..16)) {
			let registry = PageRegistry::new();
			for &number in &numbers {
				registry.set(number, page());
			}
			let expected = numbers.iter().next_back().map_or(1, |max| max + 1);
			prop_assert_eq!(registry.add(page()), Ok(expected));
		}
	}
}

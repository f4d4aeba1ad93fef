use std::fmt;

use parking_lot::Mutex;
use pinv_inventory::Container;

use crate::item::ItemStack;

/// Fixed-size titled container.
pub struct Chest {
	title: String,
	slots: Mutex<Vec<Option<ItemStack>>>,
}

impl Chest {
	pub fn new(title: impl Into<String>, size: usize) -> Self {
		Self {
			title: title.into(),
			slots: Mutex::new(vec![None; size]),
		}
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn get(&self, slot: usize) -> Option<ItemStack> {
		self.slots.lock().get(slot).cloned().flatten()
	}

	/// Copy of every slot.
	pub fn contents(&self) -> Vec<Option<ItemStack>> {
		self.slots.lock().clone()
	}

	/// Slots holding an item, in slot order.
	pub fn occupied(&self) -> Vec<(usize, ItemStack)> {
		self.slots
			.lock()
			.iter()
			.enumerate()
			.filter_map(|(slot, item)| item.clone().map(|item| (slot, item)))
			.collect()
	}
}

impl fmt::Debug for Chest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Chest")
			.field("title", &self.title)
			.field("size", &self.size())
			.finish_non_exhaustive()
	}
}

impl Container for Chest {
	type Item = ItemStack;

	fn size(&self) -> usize {
		self.slots.lock().len()
	}

	fn set_item(&self, slot: usize, item: Option<ItemStack>) {
		if let Some(cell) = self.slots.lock().get_mut(slot) {
			*cell = item;
		}
	}

	fn remove_all(&self, item: &ItemStack) {
		for cell in self.slots.lock().iter_mut() {
			if cell.as_ref() == Some(item) {
				*cell = None;
			}
		}
	}
}

use std::fmt;

use pinv_inventory::ItemStack as HostItem;

/// A stack of one material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemStack {
	pub material: String,
	pub amount: u8,
	pub display_name: Option<String>,
}

impl ItemStack {
	pub fn new(material: impl Into<String>, amount: u8) -> Self {
		Self {
			material: material.into(),
			amount,
			display_name: None,
		}
	}

	/// A single named item, the usual shape of a button.
	pub fn named(material: impl Into<String>, name: impl Into<String>) -> Self {
		Self::new(material, 1).with_name(name)
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());
		self
	}

	pub fn with_amount(mut self, amount: u8) -> Self {
		self.amount = amount;
		self
	}
}

impl HostItem for ItemStack {
	/// Same material and display name; the amount is ignored.
	fn is_similar(&self, other: &Self) -> bool {
		self.material == other.material && self.display_name == other.display_name
	}
}

impl fmt::Display for ItemStack {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.display_name {
			Some(name) => write!(f, "{}x {} \"{}\"", self.amount, self.material, name),
			None => write!(f, "{}x {}", self.amount, self.material),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn similarity_ignores_amount_only() {
		let arrow = ItemStack::named("arrow", "Next");
		assert!(arrow.is_similar(&arrow.clone().with_amount(64)));
		assert!(!arrow.is_similar(&ItemStack::named("arrow", "Previous")));
		assert!(!arrow.is_similar(&ItemStack::new("arrow", 1)));
		assert!(!arrow.is_similar(&ItemStack::named("feather", "Next")));
	}

	#[test]
	fn display() {
		assert_eq!(ItemStack::new("diamond", 3).to_string(), "3x diamond");
		assert_eq!(ItemStack::named("barrier", "Close").to_string(), "1x barrier \"Close\"");
	}
}

//! Simulation layout files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use pinv_host::ItemStack;
use pinv_inventory::{NavigationAction, NavigationItem};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layout used when no `--layout` is given.
pub const DEFAULT_LAYOUT: &str = include_str!("../layouts/default.toml");

const ROW: usize = 9;
const MAX_SIZE: usize = 6 * ROW;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },
	#[error("failed to parse layout: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("invalid layout: {0}")]
	Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A paged inventory and the script to run against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
	pub title: String,
	/// Slots per page; a whole number of rows.
	pub size: usize,
	#[serde(default)]
	pub pages: Vec<PageConfig>,
	#[serde(default)]
	pub navigation: Vec<NavigationConfig>,
	#[serde(default)]
	pub script: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageConfig {
	/// Page number; defaults to one past the highest number so far.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub number: Option<i32>,
	#[serde(default)]
	pub items: Vec<SlotItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotItem {
	pub slot: usize,
	#[serde(flatten)]
	pub item: ItemConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemConfig {
	pub material: String,
	#[serde(default = "one")]
	pub amount: u8,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

fn one() -> u8 {
	1
}

impl ItemConfig {
	pub fn to_stack(&self) -> ItemStack {
		let stack = ItemStack::new(self.material.clone(), self.amount);
		match &self.name {
			Some(name) => stack.with_name(name.clone()),
			None => stack,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionConfig {
	Previous,
	Next,
	Close,
}

impl From<ActionConfig> for NavigationAction {
	fn from(action: ActionConfig) -> Self {
		match action {
			ActionConfig::Previous => Self::PreviousPage,
			ActionConfig::Next => Self::NextPage,
			ActionConfig::Close => Self::Close,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationConfig {
	pub slot: usize,
	pub action: ActionConfig,
	#[serde(flatten)]
	pub item: ItemConfig,
}

impl NavigationConfig {
	pub fn to_item(&self) -> NavigationItem<ItemStack> {
		NavigationItem::new(self.item.to_stack(), self.action.into())
	}
}

/// One scripted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
	Join { player: String },
	Open { player: String, page: i32 },
	Next { player: String },
	Previous { player: String },
	Click { player: String, slot: usize },
	ClickOutside { player: String },
	Close { player: String },
	Quit { player: String },
	/// Runs the tasks scheduled since the last tick.
	Tick,
}

impl LayoutConfig {
	pub fn parse(source: &str) -> Result<Self> {
		let layout: Self = toml::from_str(source)?;
		layout.validate()?;
		Ok(layout)
	}

	pub fn load(path: &Path) -> Result<Self> {
		let source = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(&source)
	}

	pub fn default_layout() -> Result<Self> {
		Self::parse(DEFAULT_LAYOUT)
	}

	/// Resolves page numbers, appending unnumbered pages after the highest so far.
	pub fn numbered_pages(&self) -> Result<Vec<(i32, &PageConfig)>> {
		let mut seen = BTreeSet::new();
		let mut numbered = Vec::with_capacity(self.pages.len());
		for page in &self.pages {
			let number = match page.number {
				Some(number) => number,
				None => match seen.last() {
					Some(&highest) => i32::checked_add(highest, 1)
						.ok_or_else(|| ConfigError::Invalid("page numbers exhausted".into()))?,
					None => 1,
				},
			};
			if !seen.insert(number) {
				return Err(ConfigError::Invalid(format!("page {number} is defined twice")));
			}
			numbered.push((number, page));
		}
		Ok(numbered)
	}

	fn validate(&self) -> Result<()> {
		if self.size == 0 || self.size % ROW != 0 || self.size > MAX_SIZE {
			return Err(ConfigError::Invalid(format!(
				"size {} must be a multiple of {ROW} between {ROW} and {MAX_SIZE}",
				self.size
			)));
		}
		if self.pages.is_empty() {
			return Err(ConfigError::Invalid("at least one page is required".into()));
		}
		self.numbered_pages()?;

		let mut navigation_slots = BTreeSet::new();
		for nav in &self.navigation {
			self.check_slot(nav.slot, "navigation item")?;
			if !navigation_slots.insert(nav.slot) {
				return Err(ConfigError::Invalid(format!("navigation slot {} is used twice", nav.slot)));
			}
		}
		for page in &self.pages {
			for item in &page.items {
				self.check_slot(item.slot, "page item")?;
			}
		}
		Ok(())
	}

	fn check_slot(&self, slot: usize, what: &str) -> Result<()> {
		if slot >= self.size {
			return Err(ConfigError::Invalid(format!("{what} slot {slot} is outside {} slots", self.size)));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	const MINIMAL: &str = r#"
title = "Tiny"
size = 9

[[pages]]

[[pages]]
number = 4

[[pages]]
"#;

	#[test]
	fn default_layout_is_valid() {
		let layout = LayoutConfig::default_layout().unwrap();
		assert_eq!(layout.title, "Shop");
		assert_eq!(layout.navigation.len(), 3);
		assert!(!layout.script.is_empty());
	}

	#[test]
	fn unnumbered_pages_follow_the_highest() {
		let layout = LayoutConfig::parse(MINIMAL).unwrap();
		let numbers: Vec<i32> = layout.numbered_pages().unwrap().into_iter().map(|(n, _)| n).collect();
		assert_eq!(numbers, vec![1, 4, 5]);
	}

	#[test]
	fn duplicate_page_numbers_are_rejected() {
		let source = "title = \"x\"\nsize = 9\n[[pages]]\nnumber = 1\n[[pages]]\n";
		let err = LayoutConfig::parse(&format!("{source}number = 1\n")).unwrap_err();
		assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
	}

	#[test]
	fn size_must_be_whole_rows() {
		let err = LayoutConfig::parse("title = \"x\"\nsize = 10\n[[pages]]\n").unwrap_err();
		assert!(err.to_string().contains("multiple of 9"), "{err}");
	}

	#[test]
	fn slots_must_fit() {
		let source = r#"
title = "x"
size = 9
[[pages]]
[[navigation]]
slot = 9
action = "next"
material = "arrow"
"#;
		assert!(matches!(LayoutConfig::parse(source), Err(ConfigError::Invalid(_))));
	}

	#[test]
	fn script_steps_parse() {
		let source = r#"
title = "x"
size = 9
[[pages]]
[[script]]
op = "join"
player = "steve"
[[script]]
op = "click_outside"
player = "steve"
[[script]]
op = "tick"
"#;
		let layout = LayoutConfig::parse(source).unwrap();
		assert_eq!(
			layout.script,
			vec![
				Step::Join { player: "steve".into() },
				Step::ClickOutside { player: "steve".into() },
				Step::Tick,
			]
		);
	}

	#[test]
	fn navigation_item_conversion() {
		let nav = NavigationConfig {
			slot: 8,
			action: ActionConfig::Close,
			item: ItemConfig {
				material: "barrier".into(),
				amount: 1,
				name: Some("Close".into()),
			},
		};
		let item = nav.to_item();
		assert_eq!(item.action(), NavigationAction::Close);
		assert_eq!(item.template(), &ItemStack::named("barrier", "Close"));
	}
}

//! Runs a layout script against the in-memory host.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use parking_lot::Mutex;
use pinv_host::{Chest, MemoryHost, Player};
use pinv_inventory::{ClickKind, Container, OpenOutcome, PageId, PagedInventory, Viewer};
use pinv_worker::ManualLoop;
use tracing::{debug, info};

use crate::config::{LayoutConfig, Step};

/// Upper bound on drains when settling the queue after the script.
const SETTLE_ROUNDS: usize = 16;

pub struct Simulation {
	ticks: Arc<ManualLoop>,
	host: Arc<MemoryHost>,
	inventory: PagedInventory<MemoryHost>,
	players: BTreeMap<String, Player>,
	transcript: Arc<Mutex<Vec<String>>>,
}

impl Simulation {
	pub fn new(layout: &LayoutConfig) -> anyhow::Result<Self> {
		let ticks = Arc::new(ManualLoop::new());
		let host = MemoryHost::new(ticks.clone());
		let transcript = Arc::new(Mutex::new(Vec::new()));

		let mut builder = PagedInventory::builder(Arc::clone(&host));
		for (number, page) in layout.numbered_pages()? {
			let chest = Chest::new(format!("{} ({number})", layout.title), layout.size);
			for item in &page.items {
				chest.set_item(item.slot, Some(item.item.to_stack()));
			}
			builder = builder.page(number, chest);
		}
		for nav in &layout.navigation {
			builder = builder.navigation_item(nav.slot, nav.to_item());
		}

		let clicks = Arc::clone(&transcript);
		let closes = Arc::clone(&transcript);
		let inventory = builder
			.on_click(move |click| {
				let page = page_label(click.inventory.page_number(&click.page));
				let line = match &click.clicked_item {
					Some(item) => format!("{} clicked {item} in slot {} on page {page}", click.viewer, click.slot),
					None => format!("{} clicked empty slot {} on page {page}", click.viewer, click.slot),
				};
				info!(viewer = %click.viewer, slot = click.slot, kind = ?click.kind, "sim.click");
				clicks.lock().push(line);
				Ok(())
			})
			.on_close(move |close| {
				let page = page_label(close.inventory.page_number(&close.page));
				info!(viewer = %close.viewer, page = %page, "sim.close");
				closes.lock().push(format!("{} closed page {page}", close.viewer));
				Ok(())
			})
			.build()
			.context("building paged inventory")?;

		Ok(Self {
			ticks,
			host,
			inventory,
			players: BTreeMap::new(),
			transcript,
		})
	}

	pub fn inventory(&self) -> &PagedInventory<MemoryHost> {
		&self.inventory
	}

	pub fn host(&self) -> &Arc<MemoryHost> {
		&self.host
	}

	pub fn transcript(&self) -> Vec<String> {
		self.transcript.lock().clone()
	}

	fn record(&self, line: String) {
		debug!(%line, "sim.record");
		self.transcript.lock().push(line);
	}

	fn player(&self, name: &str) -> anyhow::Result<Player> {
		self.players.get(name).cloned().ok_or_else(|| anyhow!("unknown player {name:?}"))
	}

	/// Runs every step, then drains whatever the script left scheduled.
	pub fn run(&mut self, script: &[Step]) -> anyhow::Result<()> {
		for (index, step) in script.iter().enumerate() {
			self.step(step).with_context(|| format!("step {} ({step:?})", index + 1))?;
		}
		let report = self.ticks.run_until_idle(SETTLE_ROUNDS);
		if report.completed > 0 {
			self.record(format!("settle: ran {} task(s)", report.completed));
		}
		Ok(())
	}

	pub fn step(&mut self, step: &Step) -> anyhow::Result<()> {
		match step {
			Step::Join { player } => {
				if self.players.get(player).is_some_and(|known| self.host.is_online(known)) {
					bail!("{player} is already online");
				}
				let joined = self.host.join(player);
				self.players.insert(player.clone(), joined);
				self.record(format!("{player} joined"));
			}
			Step::Open { player, page } => {
				let viewer = self.player(player)?;
				let outcome = self.inventory.open(&viewer, *page)?;
				self.record(format!("{player} open {page}: {}", self.describe(&outcome)));
			}
			Step::Next { player } => {
				let viewer = self.player(player)?;
				let outcome = self.inventory.open_next(&viewer)?;
				self.record(format!("{player} next: {}", self.describe(&outcome)));
			}
			Step::Previous { player } => {
				let viewer = self.player(player)?;
				let outcome = self.inventory.open_previous(&viewer)?;
				self.record(format!("{player} previous: {}", self.describe(&outcome)));
			}
			Step::Click { player, slot } => {
				let viewer = self.player(player)?;
				let event = self.host.click(&viewer, *slot, ClickKind::Left)?;
				if !event.is_cancelled() {
					self.record(format!("{player} click on slot {slot} was not handled"));
				}
			}
			Step::ClickOutside { player } => {
				let viewer = self.player(player)?;
				self.host.click_outside(&viewer)?;
				self.record(format!("{player} clicked outside the window"));
			}
			Step::Close { player } => {
				let viewer = self.player(player)?;
				if !self.host.close(&viewer) {
					self.record(format!("{player} had nothing open"));
				}
			}
			Step::Quit { player } => {
				let viewer = self.player(player)?;
				if self.host.quit(&viewer) {
					self.record(format!("{player} quit"));
				}
			}
			Step::Tick => {
				let report = self.ticks.run_pending();
				self.record(format!("tick: ran {} task(s)", report.completed));
			}
		}
		Ok(())
	}

	fn describe(&self, outcome: &OpenOutcome) -> String {
		match *outcome {
			OpenOutcome::Opened { page } => format!("opened page {}", self.label(page)),
			OpenOutcome::Switched { from, to } => {
				format!("switched from page {} to page {}", self.label(from), self.label(to))
			}
			OpenOutcome::PageMissing(number) => format!("page {number} does not exist"),
			OpenOutcome::NoSession => "not viewing this inventory".to_string(),
			OpenOutcome::Dangling { page } => format!("viewing removed page {page}"),
			OpenOutcome::NoAdjacentPage => "no adjacent page".to_string(),
		}
	}

	fn label(&self, page: PageId) -> String {
		page_label(self.inventory.page_number_of(page))
	}

	/// Page number each known player is viewing, by name.
	pub fn sessions(&self) -> Vec<(String, Option<i32>)> {
		self.players
			.iter()
			.map(|(name, player)| {
				let number = self.inventory.session(player.id()).and_then(|session| self.inventory.page_number_of(session.page()));
				(name.clone(), number)
			})
			.collect()
	}
}

fn page_label(number: Option<i32>) -> String {
	number.map_or_else(|| "?".to_string(), |number| number.to_string())
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn default_script_runs() {
		let layout = LayoutConfig::default_layout().unwrap();
		let mut sim = Simulation::new(&layout).unwrap();
		sim.run(&layout.script).unwrap();

		assert_eq!(sim.sessions(), vec![("alex".to_string(), None), ("steve".to_string(), None)]);
		let transcript = sim.transcript();
		assert!(transcript.contains(&"steve clicked 3x diamond in slot 0 on page 1".to_string()), "{transcript:#?}");
		assert!(transcript.contains(&"alex closed page 1".to_string()), "{transcript:#?}");
		assert!(transcript.contains(&"steve closed page 2".to_string()), "{transcript:#?}");
		assert_eq!(sim.host().online(), 1);
	}

	#[test]
	fn navigation_waits_for_tick() {
		let layout = LayoutConfig::default_layout().unwrap();
		let mut sim = Simulation::new(&layout).unwrap();
		let steve = "steve".to_string();

		sim.step(&Step::Join { player: steve.clone() }).unwrap();
		sim.step(&Step::Open { player: steve.clone(), page: 1 }).unwrap();
		sim.step(&Step::Click { player: steve.clone(), slot: 26 }).unwrap();
		assert_eq!(sim.sessions(), vec![(steve.clone(), Some(1))]);

		sim.step(&Step::Tick).unwrap();
		assert_eq!(sim.sessions(), vec![(steve, Some(2))]);
	}

	#[test]
	fn gaps_stop_next_page() {
		let layout = LayoutConfig::default_layout().unwrap();
		let mut sim = Simulation::new(&layout).unwrap();
		let steve = "steve".to_string();

		sim.step(&Step::Join { player: steve.clone() }).unwrap();
		sim.step(&Step::Open { player: steve.clone(), page: 2 }).unwrap();
		sim.step(&Step::Next { player: steve.clone() }).unwrap();

		assert_eq!(sim.sessions(), vec![(steve, Some(2))]);
		assert_eq!(sim.transcript().last().map(String::as_str), Some("steve next: page 3 does not exist"));
	}

	#[test]
	fn unknown_player_fails_with_step_context() {
		let layout = LayoutConfig::default_layout().unwrap();
		let mut sim = Simulation::new(&layout).unwrap();

		let err = sim.run(&[Step::Close { player: "nobody".into() }]).unwrap_err();
		assert!(format!("{err:#}").contains("unknown player \"nobody\""), "{err:#}");
		assert!(format!("{err:#}").starts_with("step 1"), "{err:#}");
	}

	#[test]
	fn pages_get_items_and_navigation() {
		let layout = LayoutConfig::default_layout().unwrap();
		let sim = Simulation::new(&layout).unwrap();

		let first = sim.inventory().page(1).unwrap();
		assert_eq!(first.container().get(0).map(|item| item.material), Some("diamond".to_string()));
		for (_, page) in sim.inventory().pages() {
			assert_eq!(page.container().get(26).and_then(|item| item.display_name), Some("Next page".to_string()));
		}
		assert!(sim.inventory().page(5).is_some());
	}
}

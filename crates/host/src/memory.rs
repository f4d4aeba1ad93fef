use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use pinv_inventory::{
	ClickEvent, ClickKind, CloseEvent, Container, Host, HostError, InventoryListener, Scheduler, Task, Viewer, ViewerId,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::OUTSIDE_SLOT;
use crate::chest::Chest;
use crate::item::ItemStack;
use crate::player::Player;

/// Command issued to the host, kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
	/// A chest was shown to a player.
	Show { viewer: ViewerId, title: String },
	/// A programmatic close was requested.
	Close { viewer: ViewerId },
}

type Listener = Arc<dyn InventoryListener<MemoryHost>>;

/// Windowing host that keeps everything in memory.
///
/// Locks are released before listeners run, so listeners may call back
/// into the host.
pub struct MemoryHost {
	scheduler: Arc<dyn Scheduler>,
	players: RwLock<FxHashMap<ViewerId, Player>>,
	open: Mutex<FxHashMap<ViewerId, Arc<Chest>>>,
	listeners: RwLock<Vec<Listener>>,
	history: Mutex<Vec<HostCommand>>,
}

impl MemoryHost {
	/// Creates a host that defers tasks onto `scheduler`.
	pub fn new(scheduler: Arc<dyn Scheduler>) -> Arc<Self> {
		Arc::new(Self {
			scheduler,
			players: RwLock::new(FxHashMap::default()),
			open: Mutex::new(FxHashMap::default()),
			listeners: RwLock::new(Vec::new()),
			history: Mutex::new(Vec::new()),
		})
	}

	/// Connects a new player.
	pub fn join(&self, name: &str) -> Player {
		let player = Player::new(name);
		self.players.write().insert(player.id(), player.clone());
		debug!(player = %player, id = %player.id(), "host.join");
		player
	}

	/// Looks up an online player by name.
	pub fn player(&self, name: &str) -> Option<Player> {
		self.players.read().values().find(|player| player.name() == name).cloned()
	}

	pub fn is_online(&self, player: &Player) -> bool {
		self.players.read().contains_key(&player.id())
	}

	pub fn online(&self) -> usize {
		self.players.read().len()
	}

	/// Chest the player currently has open.
	pub fn open_chest(&self, player: &Player) -> Option<Arc<Chest>> {
		self.open.lock().get(&player.id()).cloned()
	}

	pub fn history(&self) -> Vec<HostCommand> {
		self.history.lock().clone()
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.read().len()
	}

	fn listeners(&self) -> Vec<Listener> {
		self.listeners.read().clone()
	}

	fn ensure_online(&self, player: &Player) -> Result<(), HostError> {
		if self.is_online(player) {
			Ok(())
		} else {
			Err(HostError::ViewerOffline(player.id()))
		}
	}

	fn emit_close(&self, player: &Player, chest: Arc<Chest>) {
		trace!(player = %player, chest = chest.title(), "host.emit_close");
		let event = CloseEvent::new(player.clone(), chest);
		for listener in self.listeners() {
			listener.on_close(&event);
		}
	}

	/// Delivers a click on `slot` of the player's open chest.
	///
	/// Returns the event after every listener saw it, so callers can check
	/// whether it was cancelled.
	pub fn click(&self, player: &Player, slot: usize, kind: ClickKind) -> Result<ClickEvent<Self>, HostError> {
		self.ensure_online(player)?;
		let chest = self.open_chest(player);
		let clicked = match &chest {
			Some(chest) => {
				let size = chest.size();
				if slot >= size {
					return Err(HostError::SlotOutOfRange { slot, size });
				}
				chest.get(slot)
			}
			None => None,
		};
		let slot = i32::try_from(slot).map_err(|_| HostError::Other(format!("slot {slot} not addressable")))?;
		let mut event = ClickEvent::new(player.clone(), kind, slot).with_item(clicked).with_container(chest);
		self.dispatch_click(&mut event);
		Ok(event)
	}

	/// Delivers a click outside the window.
	pub fn click_outside(&self, player: &Player) -> Result<ClickEvent<Self>, HostError> {
		self.ensure_online(player)?;
		let mut event = ClickEvent::new(player.clone(), ClickKind::WindowBorderLeft, OUTSIDE_SLOT);
		self.dispatch_click(&mut event);
		Ok(event)
	}

	fn dispatch_click(&self, event: &mut ClickEvent<Self>) {
		for listener in self.listeners() {
			listener.on_click(event);
		}
	}

	/// The player closes their window. Returns false when nothing was open.
	pub fn close(&self, player: &Player) -> bool {
		let previous = self.open.lock().remove(&player.id());
		match previous {
			Some(chest) => {
				self.emit_close(player, chest);
				true
			}
			None => false,
		}
	}

	/// Disconnects the player. An open chest is closed first.
	pub fn quit(&self, player: &Player) -> bool {
		if self.players.write().remove(&player.id()).is_none() {
			return false;
		}
		self.close(player);
		for listener in self.listeners() {
			listener.on_disconnect(player);
		}
		debug!(player = %player, "host.quit");
		true
	}
}

impl Host for MemoryHost {
	type Item = ItemStack;
	type Container = Chest;
	type Viewer = Player;

	fn show_container(&self, viewer: &Player, container: &Arc<Chest>) -> Result<(), HostError> {
		self.ensure_online(viewer)?;
		self.history.lock().push(HostCommand::Show {
			viewer: viewer.id(),
			title: container.title().to_string(),
		});
		let previous = self.open.lock().remove(&viewer.id());
		if let Some(previous) = previous {
			self.emit_close(viewer, previous);
		}
		self.open.lock().insert(viewer.id(), Arc::clone(container));
		trace!(player = %viewer, chest = container.title(), "host.show");
		Ok(())
	}

	fn close_container(&self, viewer: &Player) {
		self.history.lock().push(HostCommand::Close { viewer: viewer.id() });
		self.close(viewer);
	}

	fn schedule(&self, task: Task) {
		self.scheduler.schedule(task);
	}

	fn register_listener(&self, listener: Listener) {
		self.listeners.write().push(listener);
	}
}

//! Minimal host for unit tests.
//!
//! Reproduces the one host behavior the session protocol depends on:
//! showing a container to a viewer who already has one open delivers a
//! close for the old container before `show_container` returns.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::bridge::{ClickEvent, ClickKind, CloseEvent};
use crate::error::HostError;
use crate::host::{Container, Host, InventoryListener, ItemStack, Task, Viewer};
use crate::ids::ViewerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
	pub name: &'static str,
	pub amount: u32,
}

pub fn stack(name: &'static str) -> Stack {
	Stack { name, amount: 1 }
}

impl ItemStack for Stack {
	fn is_similar(&self, other: &Self) -> bool {
		self.name == other.name
	}
}

pub struct Grid {
	slots: Mutex<Vec<Option<Stack>>>,
}

impl Grid {
	pub fn new(size: usize) -> Self {
		Self {
			slots: Mutex::new(vec![None; size]),
		}
	}

	pub fn slot(&self, slot: usize) -> Option<Stack> {
		self.slots.lock().get(slot).cloned().flatten()
	}
}

impl Container for Grid {
	type Item = Stack;

	fn size(&self) -> usize {
		self.slots.lock().len()
	}

	fn set_item(&self, slot: usize, item: Option<Stack>) {
		if let Some(cell) = self.slots.lock().get_mut(slot) {
			*cell = item;
		}
	}

	fn remove_all(&self, item: &Stack) {
		for cell in self.slots.lock().iter_mut() {
			if cell.as_ref() == Some(item) {
				*cell = None;
			}
		}
	}
}

#[derive(Debug, Clone)]
pub struct Person(pub ViewerId);

impl Person {
	pub fn new() -> Self {
		Self(ViewerId::new())
	}
}

impl Viewer for Person {
	fn id(&self) -> ViewerId {
		self.0
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	Show(ViewerId),
	Close(ViewerId),
}

#[derive(Default)]
pub struct TestHost {
	open: Mutex<FxHashMap<ViewerId, Arc<Grid>>>,
	listeners: RwLock<Vec<Arc<dyn InventoryListener<TestHost>>>>,
	queue: Mutex<VecDeque<Task>>,
	commands: Mutex<Vec<Command>>,
	fail_show: AtomicBool,
}

impl TestHost {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn fail_next_show(&self) {
		self.fail_show.store(true, Ordering::SeqCst);
	}

	pub fn open_container(&self, viewer: &Person) -> Option<Arc<Grid>> {
		self.open.lock().get(&viewer.0).cloned()
	}

	pub fn commands(&self) -> Vec<Command> {
		self.commands.lock().clone()
	}

	pub fn pending(&self) -> usize {
		self.queue.lock().len()
	}

	/// Runs queued tasks, including ones they schedule.
	pub fn run_pending(&self) -> usize {
		let mut ran = 0;
		loop {
			let Some(task) = self.queue.lock().pop_front() else {
				return ran;
			};
			task();
			ran += 1;
		}
	}

	fn listeners(&self) -> Vec<Arc<dyn InventoryListener<TestHost>>> {
		self.listeners.read().clone()
	}

	fn fire_close(&self, viewer: &Person, container: Arc<Grid>) {
		let event = CloseEvent::new(viewer.clone(), container);
		for listener in self.listeners() {
			listener.on_close(&event);
		}
	}

	/// Delivers a click on `slot` of whatever the viewer has open.
	pub fn click(&self, viewer: &Person, slot: usize) -> ClickEvent<TestHost> {
		let container = self.open_container(viewer);
		let item = container.as_ref().and_then(|c| c.slot(slot));
		let mut event = ClickEvent::new(viewer.clone(), ClickKind::Left, slot as i32)
			.with_item(item)
			.with_container(container);
		for listener in self.listeners() {
			listener.on_click(&mut event);
		}
		event
	}

	/// Player closes their window.
	pub fn close(&self, viewer: &Person) {
		let previous = self.open.lock().remove(&viewer.0);
		if let Some(container) = previous {
			self.fire_close(viewer, container);
		}
	}

	pub fn disconnect(&self, viewer: &Person) {
		self.open.lock().remove(&viewer.0);
		for listener in self.listeners() {
			listener.on_disconnect(viewer);
		}
	}
}

impl Host for TestHost {
	type Item = Stack;
	type Container = Grid;
	type Viewer = Person;

	fn show_container(&self, viewer: &Person, container: &Arc<Grid>) -> Result<(), HostError> {
		if self.fail_show.swap(false, Ordering::SeqCst) {
			return Err(HostError::Other("show refused".into()));
		}
		self.commands.lock().push(Command::Show(viewer.0));
		let previous = self.open.lock().remove(&viewer.0);
		if let Some(previous) = previous {
			self.fire_close(viewer, previous);
		}
		self.open.lock().insert(viewer.0, Arc::clone(container));
		Ok(())
	}

	fn close_container(&self, viewer: &Person) {
		self.commands.lock().push(Command::Close(viewer.0));
		self.close(viewer);
	}

	fn schedule(&self, task: Task) {
		self.queue.lock().push_back(task);
	}

	fn register_listener(&self, listener: Arc<dyn InventoryListener<Self>>) {
		self.listeners.write().push(listener);
	}
}

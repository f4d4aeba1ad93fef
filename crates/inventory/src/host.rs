//! Interface to the windowing host that owns rendered containers.
//!
//! The host renders containers, reports viewer input and decides which
//! execution context commands must run on. This crate only consumes it
//! through the traits below; `pinv-host` provides an in-memory
//! implementation.

use std::fmt;
use std::sync::Arc;

use crate::bridge::{ClickEvent, CloseEvent};
use crate::error::HostError;
use crate::ids::ViewerId;

/// Deferred unit of work handed to a [`Scheduler`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Defers tasks onto the host's required execution context.
pub trait Scheduler: Send + Sync {
	/// Queues `task` to run later on the host's execution context.
	fn schedule(&self, task: Task);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
	fn schedule(&self, task: Task) {
		(**self).schedule(task);
	}
}

/// Item stack as understood by the host.
pub trait ItemStack: Clone + fmt::Debug + Send + Sync + 'static {
	/// Returns true when `other` looks the same as `self`, ignoring stack size.
	fn is_similar(&self, other: &Self) -> bool;
}

/// Slot grid owned by the host.
pub trait Container: Send + Sync + 'static {
	type Item: ItemStack;

	/// Number of slots in the container.
	fn size(&self) -> usize;

	/// Replaces the contents of `slot`. Out-of-range slots are ignored.
	fn set_item(&self, slot: usize, item: Option<Self::Item>);

	/// Removes every stack equal to `item`.
	fn remove_all(&self, item: &Self::Item);
}

/// Someone a container can be shown to.
pub trait Viewer: Clone + fmt::Debug + Send + Sync + 'static {
	fn id(&self) -> ViewerId;
}

/// Receives inbound host events.
pub trait InventoryListener<H: Host>: Send + Sync {
	fn on_click(&self, event: &mut ClickEvent<H>);
	fn on_close(&self, event: &CloseEvent<H>);
	fn on_disconnect(&self, viewer: &H::Viewer);
}

/// The windowing host.
///
/// `show_container` MUST deliver the close notification for the viewer's
/// previously shown container to registered listeners before it returns.
/// The switch suppression in [`crate::PagedInventory`] relies on that
/// ordering.
pub trait Host: Send + Sync + 'static {
	type Item: ItemStack;
	type Container: Container<Item = Self::Item>;
	type Viewer: Viewer;

	/// Shows `container` to `viewer`, replacing whatever they had open.
	fn show_container(&self, viewer: &Self::Viewer, container: &Arc<Self::Container>) -> Result<(), HostError>;

	/// Closes whatever container `viewer` has open.
	fn close_container(&self, viewer: &Self::Viewer);

	/// Defers `task` onto the host's execution context.
	fn schedule(&self, task: Task);

	/// Subscribes `listener` to click, close and disconnect events.
	fn register_listener(&self, listener: Arc<dyn InventoryListener<Self>>)
	where
		Self: Sized;
}

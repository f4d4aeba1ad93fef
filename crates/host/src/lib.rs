//! In-memory windowing host.
//!
//! [`MemoryHost`] implements [`pinv_inventory::Host`] without a game server:
//! players join and quit, chests hold item stacks, and clicks and closes are
//! injected by the caller. Showing a chest to a player who already has one
//! open emits the close for the old chest first, the same ordering a real
//! server produces.

mod chest;
mod item;
mod memory;
mod player;

pub use chest::Chest;
pub use item::ItemStack;
pub use memory::{HostCommand, MemoryHost};
pub use player::Player;

/// Slot index reported for clicks outside the window.
pub const OUTSIDE_SLOT: i32 = -999;

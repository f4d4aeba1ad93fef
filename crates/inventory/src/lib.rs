//! Paged inventories: multi-page containers shown to many viewers at once.
//!
//! # Purpose
//!
//! - Own the page registry, navigation items, viewer sessions and observer sets of one paged inventory.
//! - Keep viewer sessions consistent while click, close and disconnect events arrive concurrently.
//! - Exclude rendering, slot storage and item comparison; those belong to the [`Host`].
//!
//! # Mental model
//!
//! - A [`PagedInventory`] maps page numbers to [`Page`]s. Each page wraps one host container.
//! - Every viewer has at most one [`ViewerSession`], pointing at the page they have open.
//! - Navigation items are stamped into the same slot on every page and move viewers between adjacent page numbers.
//! - The host reports input through an [`EventBridge`] and executes deferred commands through its scheduler.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints |
//! |---|---|---|
//! | [`PagedInventory`] | Aggregate root, cheap-clone handle | MUST be the only writer of its registries |
//! | [`PageRegistry`] | Number to page map | `add` MUST use `max + 1` (or 1) and never fill gaps |
//! | [`NavigationRegistry`] | Slot to navigation item map | `set` MUST stamp every page existing at call time |
//! | [`SessionTable`] | Viewer to [`ViewerSession`] map | MUST hold at most one session per viewer |
//! | [`SwitchTicket`] | Scope of one open | MUST end the switch on drop, including on failure |
//! | [`CallbackBus`] | Click and close observers | MUST isolate observer failures |
//! | [`EventBridge`] | Host listener | MUST schedule navigation actions, never run them inline |
//!
//! # Invariants
//!
//! 1. A close notification generated by a programmatic switch MUST NOT reach close observers or end the session.
//!    - Enforced in: `SessionTable::begin_open`, `EventBridge::handle_close`
//!    - Tested by: `inventory::tests::switch_does_not_notify_close_observers`
//!    - Failure symptom: switching pages logs the viewer out of the inventory and fires close callbacks.
//!
//! 2. The switching state MUST be cleared when the show command returns, whether it succeeded or not.
//!    - Enforced in: `SwitchTicket::drop`
//!    - Tested by: `session::tests::panic_during_show_still_ends_switch`, `inventory::tests::failed_show_restores_previous_session`
//!    - Failure symptom: every later close for the viewer is swallowed.
//!
//! 3. Disconnect MUST remove the session even while switching.
//!    - Enforced in: `EventBridge::handle_disconnect`
//!    - Tested by: `bridge::tests::disconnect_during_switch_removes_session`
//!    - Failure symptom: departed viewers linger in `viewers()`.
//!
//! 4. Close and click events MUST only count when their container is a page the viewer's session points at.
//!    - Enforced in: `EventBridge::handle_close`, `EventBridge::handle_click`
//!    - Tested by: `bridge::tests::opening_over_another_inventory_keeps_the_new_session`,
//!      `bridge::tests::close_of_foreign_container_is_ignored`
//!    - Failure symptom: opening this inventory over another window drops the new session and leaves its items takeable.
//!
//! 5. No registry lock is held across host calls or observer callbacks.
//!    - Enforced in: `PagedInventory::open_page`, `ObserverSet::notify`
//!    - Tested by: `bridge::tests::close_observer_may_reopen`
//!    - Failure symptom: deadlock when the host delivers a close from inside `show_container`.
//!
//! # Concurrency and ordering
//!
//! - Registries use `parking_lot` locks internally; snapshots are copies and may be stale.
//! - For one viewer, "begin switch, show container, host close, end switch" is ordered by the
//!   host contract: the close for the old container arrives before `show_container` returns.

mod bridge;
mod callbacks;
mod error;
mod host;
mod ids;
mod inventory;
mod navigation;
mod page;
mod session;

#[cfg(test)]
mod test_host;

pub use bridge::{ClickEvent, ClickKind, ClickOutcome, CloseEvent, CloseOutcome, EventBridge, PageClick, PageClose};
pub use callbacks::{CallbackBus, DispatchReport, ObserverFailure, ObserverFault, ObserverId, ObserverSet, panic_message};
pub use error::{HostError, PagedInventoryError, Result};
pub use host::{Container, Host, InventoryListener, ItemStack, Scheduler, Task, Viewer};
pub use ids::{InventoryId, PageId, ViewerId};
pub use inventory::{OpenOutcome, PagedInventory, PagedInventoryBuilder};
pub use navigation::{NavigationAction, NavigationItem, NavigationRegistry};
pub use page::{Page, PageRegistry};
pub use session::{CloseDecision, SessionTable, SwitchTicket, ViewerSession};


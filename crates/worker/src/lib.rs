//! Executors for deferred inventory work.
//!
//! Navigation actions never run inline on the event path; they are handed to
//! a [`pinv_inventory::Scheduler`]. This crate provides the two schedulers
//! the rest of the workspace uses:
//!
//! - [`ManualLoop`]: a queue drained explicitly by the caller, one tick at a time.
//! - [`MainThread`]: a dedicated named OS thread that owns the host's main context.
//!
//! Both isolate task panics: a panicking task is logged, counted in the
//! [`DrainReport`] and the executor keeps running.

mod budget;
mod main_thread;
mod manual;
mod spawn;

pub use budget::{DrainBudget, DrainReport};
pub use main_thread::MainThread;
pub use manual::ManualLoop;
pub use spawn::spawn_named_thread;

use std::panic::{AssertUnwindSafe, catch_unwind};

use pinv_inventory::{Task, panic_message};

/// Runs one task, returning the panic message if it panicked.
pub(crate) fn run_task(task: Task) -> Option<String> {
	match catch_unwind(AssertUnwindSafe(task)) {
		Ok(()) => None,
		Err(payload) => Some(panic_message(payload.as_ref())),
	}
}

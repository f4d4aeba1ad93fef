use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use pinv_inventory::{Scheduler, Task};
use tracing::{trace, warn};

use crate::budget::{DrainBudget, DrainReport};
use crate::run_task;

/// Task queue drained explicitly by its owner.
///
/// Each drain only runs tasks that were queued when it started; tasks
/// scheduled by a running task wait for the next drain. This mirrors a game
/// loop where work scheduled during a tick runs on the following tick.
#[derive(Default)]
pub struct ManualLoop {
	queue: Mutex<VecDeque<Task>>,
}

impl fmt::Debug for ManualLoop {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ManualLoop").field("pending", &self.pending()).finish()
	}
}

impl ManualLoop {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn pending(&self) -> usize {
		self.queue.lock().len()
	}

	pub fn is_idle(&self) -> bool {
		self.queue.lock().is_empty()
	}

	/// Runs every task queued before this call.
	pub fn run_pending(&self) -> DrainReport {
		self.drain(DrainBudget::UNLIMITED)
	}

	/// Runs tasks queued before this call, up to `budget`.
	pub fn drain(&self, budget: DrainBudget) -> DrainReport {
		let queued = self.pending();
		let limit = queued.min(budget.max_tasks);
		let mut report = DrainReport::default();

		for _ in 0..limit {
			// The lock is released before the task runs so it can schedule more work.
			let Some(task) = self.queue.lock().pop_front() else {
				break;
			};
			report.completed += 1;
			if let Some(msg) = run_task(task) {
				report.panicked += 1;
				warn!(panic = %msg, "manual_loop.task_panicked");
			}
		}

		report.pending = self.pending();
		report.budget_exhausted = limit < queued;
		trace!(?report, "manual_loop.drain");
		report
	}

	/// Drains repeatedly until the queue is empty or `max_rounds` drains ran.
	pub fn run_until_idle(&self, max_rounds: usize) -> DrainReport {
		let mut total = DrainReport::default();
		for _ in 0..max_rounds {
			if self.is_idle() {
				break;
			}
			total.merge(self.run_pending());
		}
		total.pending = self.pending();
		total.budget_exhausted = total.pending > 0;
		total
	}
}

impl Scheduler for ManualLoop {
	fn schedule(&self, task: Task) {
		self.queue.lock().push_back(task);
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	fn counting_task(counter: &Arc<AtomicUsize>) -> Task {
		let counter = Arc::clone(counter);
		Box::new(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		})
	}

	#[test]
	fn run_pending_runs_queued_tasks_in_order() {
		let lp = ManualLoop::new();
		let order = Arc::new(Mutex::new(Vec::new()));
		for i in 0..3 {
			let order = Arc::clone(&order);
			lp.schedule(Box::new(move || order.lock().push(i)));
		}

		let report = lp.run_pending();
		assert_eq!(report.completed, 3);
		assert_eq!(report.pending, 0);
		assert!(!report.budget_exhausted);
		assert_eq!(*order.lock(), vec![0, 1, 2]);
	}

	#[test]
	fn tasks_scheduled_during_drain_wait_for_next_tick() {
		let lp = Arc::new(ManualLoop::new());
		let counter = Arc::new(AtomicUsize::new(0));
		let inner = Arc::clone(&lp);
		let follow_up = counting_task(&counter);
		lp.schedule(Box::new(move || inner.schedule(follow_up)));

		let first = lp.run_pending();
		assert_eq!(first.completed, 1);
		assert_eq!(first.pending, 1);
		assert_eq!(counter.load(Ordering::SeqCst), 0);

		lp.run_pending();
		assert_eq!(counter.load(Ordering::SeqCst), 1);
		assert!(lp.is_idle());
	}

	#[test]
	fn budget_limits_drain() {
		let lp = ManualLoop::new();
		let counter = Arc::new(AtomicUsize::new(0));
		for _ in 0..5 {
			lp.schedule(counting_task(&counter));
		}

		let report = lp.drain(DrainBudget::tasks(3));
		assert_eq!(report.completed, 3);
		assert_eq!(report.pending, 2);
		assert!(report.budget_exhausted);
		assert_eq!(counter.load(Ordering::SeqCst), 3);
	}

	#[test]
	fn panicking_task_does_not_stop_the_loop() {
		let lp = ManualLoop::new();
		let counter = Arc::new(AtomicUsize::new(0));
		lp.schedule(Box::new(|| panic!("task exploded")));
		lp.schedule(counting_task(&counter));

		let report = lp.run_pending();
		assert_eq!(report.completed, 2);
		assert_eq!(report.panicked, 1);
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn run_until_idle_follows_chains() {
		let lp = Arc::new(ManualLoop::new());
		let counter = Arc::new(AtomicUsize::new(0));
		let inner = Arc::clone(&lp);
		let last = counting_task(&counter);
		lp.schedule(Box::new(move || {
			let again = Arc::clone(&inner);
			inner.schedule(Box::new(move || again.schedule(last)));
		}));

		let report = lp.run_until_idle(10);
		assert_eq!(report.completed, 3);
		assert_eq!(report.pending, 0);
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn run_until_idle_stops_after_max_rounds() {
		fn reschedule(lp: Arc<ManualLoop>) {
			let again = Arc::clone(&lp);
			lp.schedule(Box::new(move || reschedule(again)));
		}
		let lp = Arc::new(ManualLoop::new());
		reschedule(Arc::clone(&lp));

		let report = lp.run_until_idle(4);
		assert_eq!(report.completed, 4);
		assert_eq!(report.pending, 1);
		assert!(report.budget_exhausted);
	}
}

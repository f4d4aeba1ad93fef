/// Limits on one drain of a [`crate::ManualLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainBudget {
	/// Maximum tasks to run.
	pub max_tasks: usize,
}

impl DrainBudget {
	pub const UNLIMITED: Self = Self { max_tasks: usize::MAX };

	pub const fn tasks(max_tasks: usize) -> Self {
		Self { max_tasks }
	}
}

impl Default for DrainBudget {
	fn default() -> Self {
		Self::UNLIMITED
	}
}

/// Outcome of draining queued tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
	/// Tasks that ran, including ones that panicked.
	pub completed: usize,
	/// Tasks that panicked.
	pub panicked: usize,
	/// Tasks still queued when the drain stopped.
	pub pending: usize,
	/// True when the drain stopped because the budget ran out.
	pub budget_exhausted: bool,
}

impl DrainReport {
	/// Folds `other` into `self`, keeping `other`'s pending count.
	pub fn merge(&mut self, other: DrainReport) {
		self.completed += other.completed;
		self.panicked += other.panicked;
		self.pending = other.pending;
		self.budget_exhausted = other.budget_exhausted;
	}
}

//! Click and close observers.
//!
//! Observers run synchronously on the dispatching thread with no registry
//! lock held. Every invocation is isolated: an observer that returns an
//! error or panics is recorded in the [`DispatchReport`] and delivery
//! continues with the remaining observers.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::bridge::{PageClick, PageClose};
use crate::host::Host;

/// Handle returned when registering an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "observer#{}", self.0)
	}
}

type Observer<E> = Arc<dyn Fn(&E) -> anyhow::Result<()> + Send + Sync>;

/// Why one observer invocation failed.
#[derive(Debug)]
pub enum ObserverFault {
	Failed(anyhow::Error),
	Panicked(String),
}

impl fmt::Display for ObserverFault {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Failed(err) => write!(f, "failed: {err:#}"),
			Self::Panicked(msg) => write!(f, "panicked: {msg}"),
		}
	}
}

#[derive(Debug)]
pub struct ObserverFailure {
	pub observer: ObserverId,
	pub fault: ObserverFault,
}

/// Outcome of delivering one event to every observer.
#[derive(Debug, Default)]
pub struct DispatchReport {
	/// Observers that returned `Ok`.
	pub delivered: usize,
	pub failures: Vec<ObserverFailure>,
}

impl DispatchReport {
	pub fn is_clean(&self) -> bool {
		self.failures.is_empty()
	}

	/// Total observers invoked.
	pub fn invoked(&self) -> usize {
		self.delivered + self.failures.len()
	}
}

/// Unordered set of observers for one event type.
pub struct ObserverSet<E> {
	observers: RwLock<FxHashMap<ObserverId, Observer<E>>>,
}

impl<E> Default for ObserverSet<E> {
	fn default() -> Self {
		Self {
			observers: RwLock::new(FxHashMap::default()),
		}
	}
}

impl<E> ObserverSet<E> {
	fn insert(&self, id: ObserverId, observer: Observer<E>) {
		self.observers.write().insert(id, observer);
	}

	fn remove(&self, id: ObserverId) -> bool {
		self.observers.write().remove(&id).is_some()
	}

	pub fn len(&self) -> usize {
		self.observers.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.observers.read().is_empty()
	}

	/// Invokes every observer with `event`.
	pub fn notify(&self, event: &E, kind: &'static str) -> DispatchReport {
		let observers: Vec<(ObserverId, Observer<E>)> =
			self.observers.read().iter().map(|(&id, observer)| (id, Arc::clone(observer))).collect();

		let mut report = DispatchReport::default();
		for (id, observer) in observers {
			let fault = match catch_unwind(AssertUnwindSafe(|| observer(event))) {
				Ok(Ok(())) => {
					report.delivered += 1;
					continue;
				}
				Ok(Err(err)) => ObserverFault::Failed(err),
				Err(payload) => ObserverFault::Panicked(panic_message(payload.as_ref())),
			};
			warn!(observer = %id, event = kind, %fault, "observer failed");
			report.failures.push(ObserverFailure { observer: id, fault });
		}
		report
	}
}

/// Readable message for a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		(*msg).to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"non-string panic payload".to_string()
	}
}

/// Click and close observer registries of one paged inventory.
pub struct CallbackBus<H: Host> {
	next_id: AtomicU64,
	click: ObserverSet<PageClick<H>>,
	close: ObserverSet<PageClose<H>>,
}

impl<H: Host> Default for CallbackBus<H> {
	fn default() -> Self {
		Self {
			next_id: AtomicU64::new(0),
			click: ObserverSet::default(),
			close: ObserverSet::default(),
		}
	}
}

impl<H: Host> CallbackBus<H> {
	pub fn new() -> Self {
		Self::default()
	}

	fn next_id(&self) -> ObserverId {
		ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed))
	}

	pub fn add_on_click<F>(&self, observer: F) -> ObserverId
	where
		F: Fn(&PageClick<H>) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		let id = self.next_id();
		self.click.insert(id, Arc::new(observer));
		id
	}

	pub fn add_on_close<F>(&self, observer: F) -> ObserverId
	where
		F: Fn(&PageClose<H>) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		let id = self.next_id();
		self.close.insert(id, Arc::new(observer));
		id
	}

	/// Unregisters an observer from whichever set holds it.
	pub fn remove(&self, id: ObserverId) -> bool {
		self.click.remove(id) || self.close.remove(id)
	}

	pub fn notify_click(&self, click: &PageClick<H>) -> DispatchReport {
		self.click.notify(click, "click")
	}

	pub fn notify_close(&self, close: &PageClose<H>) -> DispatchReport {
		self.close.notify(close, "close")
	}

	pub fn click_observers(&self) -> usize {
		self.click.len()
	}

	pub fn close_observers(&self) -> usize {
		self.close.len()
	}
}

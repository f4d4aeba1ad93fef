use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;
use pinv_inventory::{Scheduler, Task};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::budget::DrainReport;
use crate::run_task;
use crate::spawn::spawn_named_thread;

enum Message {
	Run(Task),
	Shutdown,
}

#[derive(Default)]
struct Counters {
	completed: AtomicUsize,
	panicked: AtomicUsize,
}

/// A dedicated OS thread acting as the host's main execution context.
///
/// Tasks run one at a time in scheduling order. [`MainThread::shutdown`]
/// runs every task queued before it and then joins the thread.
pub struct MainThread {
	name: String,
	tx: mpsc::UnboundedSender<Message>,
	thread_id: ThreadId,
	handle: Mutex<Option<JoinHandle<()>>>,
	counters: Arc<Counters>,
}

impl fmt::Debug for MainThread {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MainThread")
			.field("name", &self.name)
			.field("thread_id", &self.thread_id)
			.field("running", &!self.tx.is_closed())
			.finish()
	}
}

impl MainThread {
	/// Starts the thread.
	pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
		let name = name.into();
		let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
		let counters = Arc::new(Counters::default());
		let thread_counters = Arc::clone(&counters);
		let thread_name = name.clone();

		let handle = spawn_named_thread(name.clone(), move || {
			while let Some(message) = rx.blocking_recv() {
				let task = match message {
					Message::Run(task) => task,
					Message::Shutdown => break,
				};
				thread_counters.completed.fetch_add(1, Ordering::Relaxed);
				if let Some(msg) = run_task(task) {
					thread_counters.panicked.fetch_add(1, Ordering::Relaxed);
					warn!(thread = %thread_name, panic = %msg, "main_thread.task_panicked");
				}
			}
			debug!(thread = %thread_name, "main_thread.stopped");
		})?;

		Ok(Self {
			name,
			tx,
			thread_id: handle.thread().id(),
			handle: Mutex::new(Some(handle)),
			counters,
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// True when called from the main thread itself.
	pub fn is_current(&self) -> bool {
		thread::current().id() == self.thread_id
	}

	/// Blocks until every task scheduled before this call has run.
	///
	/// Returns false without waiting when called from the main thread, or
	/// when the thread has stopped.
	pub fn flush(&self) -> bool {
		if self.is_current() {
			debug!(thread = %self.name, "main_thread.flush_from_self");
			return false;
		}
		let (done_tx, done_rx) = oneshot::channel();
		let marker: Task = Box::new(move || {
			let _ = done_tx.send(());
		});
		if self.tx.send(Message::Run(marker)).is_err() {
			return false;
		}
		done_rx.blocking_recv().is_ok()
	}

	/// Counters for tasks run so far.
	pub fn report(&self) -> DrainReport {
		DrainReport {
			completed: self.counters.completed.load(Ordering::Relaxed),
			panicked: self.counters.panicked.load(Ordering::Relaxed),
			pending: 0,
			budget_exhausted: false,
		}
	}

	/// Runs the tasks already queued, then stops and joins the thread.
	///
	/// Tasks scheduled after the call are dropped. Calling this from the
	/// main thread stops it without joining.
	pub fn shutdown(&self) -> DrainReport {
		let _ = self.tx.send(Message::Shutdown);
		let handle = self.handle.lock().take();
		match handle {
			Some(handle) if !self.is_current() => {
				if handle.join().is_err() {
					warn!(thread = %self.name, "main_thread.join_failed");
				}
			}
			_ => {}
		}
		self.report()
	}
}

impl Scheduler for MainThread {
	fn schedule(&self, task: Task) {
		if self.tx.send(Message::Run(task)).is_err() {
			warn!(thread = %self.name, "main_thread.closed; task dropped");
		}
	}
}

impl Drop for MainThread {
	fn drop(&mut self) {
		if self.handle.get_mut().is_some() {
			self.shutdown();
		}
	}
}

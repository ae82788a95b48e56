//! Bounded task queue shared by every codec of a run

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Results of every task submitted to a [`TaskQueue`]
#[derive(Debug)]
pub struct Drained<T> {
	/// Outputs of tasks that ran to completion, in completion order
	pub completed: Vec<T>,
	/// Tasks that panicked or were aborted
	pub panicked: usize,
}

/// Runs submitted futures with at most `concurrency` in flight
///
/// A permit is taken in [`TaskQueue::submit`] before the future is spawned,
/// so tasks start in submission order and the submitter waits while every
/// slot is busy. A failing or panicking task never affects its siblings.
///
/// # Examples
///
/// ```rust
/// use reinhardt_precompress::scheduler::TaskQueue;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut queue = TaskQueue::new(2);
/// for n in 0..4u32 {
///     queue.submit(async move { n * 2 }).await;
/// }
/// let drained = queue.await_idle().await;
/// assert_eq!(drained.completed.len(), 4);
/// # }
/// ```
pub struct TaskQueue<T> {
	semaphore: Arc<Semaphore>,
	tasks: JoinSet<T>,
	submitted: usize,
}

impl<T: Send + 'static> TaskQueue<T> {
	/// Creates a queue running at most `concurrency` tasks at once.
	/// A limit of zero is treated as one.
	pub fn new(concurrency: usize) -> Self {
		Self {
			semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
			tasks: JoinSet::new(),
			submitted: 0,
		}
	}

	/// Number of tasks submitted so far
	pub fn submitted(&self) -> usize {
		self.submitted
	}

	/// Enqueues `task`, waiting for a free slot first
	pub async fn submit<F>(&mut self, task: F)
	where
		F: Future<Output = T> + Send + 'static,
	{
		// The semaphore is owned here and never closed
		let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok();
		self.submitted += 1;
		self.tasks.spawn(async move {
			let _permit = permit;
			task.await
		});
	}

	/// Waits until every submitted task has settled
	pub async fn await_idle(&mut self) -> Drained<T> {
		let mut completed = Vec::with_capacity(self.tasks.len());
		let mut panicked = 0;

		while let Some(joined) = self.tasks.join_next().await {
			match joined {
				Ok(output) => completed.push(output),
				Err(e) => {
					tracing::warn!("Compression task did not complete: {}", e);
					panicked += 1;
				}
			}
		}

		Drained {
			completed,
			panicked,
		}
	}
}

//! Background search workers for anytime (asynchronous) decisions.
//!
//! A worker takes ownership of a search engine, runs it on its own thread and
//! hands it back when stopped. The engine publishes its best-known answer
//! after every completed batch of work and polls a [`CancellationToken`]
//! between batches, so cancellation latency is bounded by one batch.

use gail_core::{ActionScore, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::warn;

/// Cooperative cancellation signal shared between a caller and a worker.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the worker to stop at its next batch boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Single slot holding the latest result a worker published.
///
/// Each publish replaces the whole `ActionScore` under a lock, so readers
/// only ever observe complete results.
#[derive(Debug)]
pub struct Publisher<A> {
    slot: Arc<Mutex<Option<ActionScore<A>>>>,
}

impl<A: Copy> Publisher<A> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn publish(&self, result: ActionScore<A>) {
        *self.slot.lock() = Some(result);
    }

    pub fn latest(&self) -> Option<ActionScore<A>> {
        *self.slot.lock()
    }
}

impl<A: Copy> Default for Publisher<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for Publisher<A> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// A search engine of type `T` running on a background thread.
///
/// Dropping a worker without stopping it cancels it and detaches the thread.
pub(crate) struct Worker<T, A> {
    cancel: CancellationToken,
    published: Publisher<A>,
    handle: Option<JoinHandle<(T, Result<()>)>>,
}

impl<T, A> Worker<T, A>
where
    T: Send + 'static,
    A: Copy + Send + 'static,
{
    /// Move `engine` onto a new thread and run `job` with it.
    ///
    /// `job` must check the cancellation token between batches and publish
    /// through the publisher whenever it has a complete answer.
    pub fn spawn<F>(mut engine: T, job: F) -> Self
    where
        F: FnOnce(&mut T, &CancellationToken, &Publisher<A>) -> Result<()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let published = Publisher::new();

        let handle = {
            let cancel = cancel.clone();
            let published = published.clone();
            thread::spawn(move || {
                let result = job(&mut engine, &cancel, &published);
                (engine, result)
            })
        };

        Self {
            cancel,
            published,
            handle: Some(handle),
        }
    }

    /// Latest published result, without stopping the worker.
    pub fn latest(&self) -> Option<ActionScore<A>> {
        self.published.latest()
    }

    /// Cancel the worker, wait for it to finish its current batch and return
    /// the engine together with the last published result.
    ///
    /// A worker that failed is logged; whatever it published before failing
    /// is still returned.
    pub fn stop(mut self) -> Option<(T, Option<ActionScore<A>>)> {
        self.cancel.cancel();
        let handle = self.handle.take()?;

        let (engine, result) = match handle.join() {
            Ok(output) => output,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        if let Err(err) = result {
            warn!(%err, "asynchronous search stopped with an error");
        }

        Some((engine, self.published.latest()))
    }
}

impl<T, A> Drop for Worker<T, A> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

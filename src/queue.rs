//! Bounded job queue with drain-to-completion shutdown
//!
//! This module provides the fixed-capacity queue that carries discovered
//! file paths from the traversal driver to the worker pool. It is a circular
//! buffer guarded by one mutex and two condition variables:
//!
//! - *job-available*, signaled once per successful push, wakes one consumer
//! - *space-or-drained*, signaled once per successful pop, wakes either a
//!   producer waiting for a free slot or a shutdown call waiting for the
//!   buffer to empty
//!
//! Pushing into a full queue blocks (backpressure), popping from an empty
//! open queue blocks, and [`JobProducer::shutdown`] blocks until consumers
//! have drained every buffered job. After shutdown, pushes fail with
//! [`PushError`] and pops return [`Exhausted`] once the buffer is empty.
//! Jobs already buffered at shutdown are still delivered; closing stops
//! admission, not delivery.
//!
//! The queue holds no domain state and never inspects the jobs it carries.
//! Ownership transfers into the queue on a successful push and out of it on
//! a successful pop; a rejected push hands the job back inside the error.

use crate::error::QueueError;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;

/// Mutable queue state, all guarded by one mutex.
struct QueueState<T> {
    /// Slot array of length `capacity`; `None` marks a vacant slot.
    slots: Box<[Option<T>]>,

    /// Index of the oldest live job.
    head: usize,

    /// Index of the next free slot.
    tail: usize,

    /// Number of occupied slots, always in `0..=capacity`.
    count: usize,

    /// Set once by shutdown (or producer drop); never cleared.
    closed: bool,
}

/// Fixed-capacity FIFO queue shared between one producer and any number of
/// consumers
///
/// Constructed via [`JobQueue::bounded`], which returns the producer and
/// consumer handles. The queue itself is reference-counted behind them and
/// is freed when the last handle drops; the slot storage is released earlier,
/// as soon as a shutdown observes the buffer fully drained.
pub struct JobQueue<T> {
    /// Capacity fixed at construction.
    capacity: usize,

    /// All mutable state.
    state: Mutex<QueueState<T>>,

    /// Signaled when `count` increases.
    job_available: Condvar,

    /// Signaled when `count` decreases, and broadcast on close so blocked
    /// producers re-check the closed flag.
    space_or_drained: Condvar,
}

impl<T> JobQueue<T> {
    /// Create a bounded queue and split it into its producer and consumer
    /// handles.
    ///
    /// Fails with [`QueueError::InvalidCapacity`] when `capacity` is zero and
    /// with [`QueueError::OutOfMemory`] when the slot array cannot be
    /// allocated.
    pub fn bounded(capacity: usize) -> Result<(JobProducer<T>, JobConsumer<T>), QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity);
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| QueueError::OutOfMemory { capacity })?;
        slots.resize_with(capacity, || None);

        let queue = Arc::new(JobQueue {
            capacity,
            state: Mutex::new(QueueState {
                slots: slots.into_boxed_slice(),
                head: 0,
                tail: 0,
                count: 0,
                closed: false,
            }),
            job_available: Condvar::new(),
            space_or_drained: Condvar::new(),
        });

        Ok((
            JobProducer {
                queue: Arc::clone(&queue),
            },
            JobConsumer { queue },
        ))
    }

    fn push(&self, job: T) -> Result<(), PushError<T>> {
        let mut state = self.state.lock();

        // A closed queue rejects new jobs unconditionally, even with free
        // slots remaining.
        if state.closed {
            return Err(PushError(job));
        }

        while state.count == self.capacity && !state.closed {
            self.space_or_drained.wait(&mut state);
        }

        // The close may have happened while we were blocked on space.
        if state.closed {
            return Err(PushError(job));
        }

        let tail = state.tail;
        state.slots[tail] = Some(job);
        state.tail = (tail + 1) % self.capacity;
        state.count += 1;

        self.job_available.notify_one();
        Ok(())
    }

    fn pop(&self) -> Result<T, Exhausted> {
        let mut state = self.state.lock();

        while state.count == 0 && !state.closed {
            self.job_available.wait(&mut state);
        }

        if state.count == 0 && state.closed {
            return Err(Exhausted);
        }

        let head = state.head;
        let job = state.slots[head].take().expect("occupied slot at ring head");
        state.head = (head + 1) % self.capacity;
        state.count -= 1;

        self.space_or_drained.notify_one();
        Ok(job)
    }

    fn shutdown(&self) {
        let mut state = self.state.lock();

        if !state.closed {
            state.closed = true;
            // Any producer blocked on space must wake now and observe the
            // close, so it cannot swallow a drain signal below.
            self.space_or_drained.notify_all();
        }

        while state.count > 0 {
            self.space_or_drained.wait(&mut state);
        }

        // Drained. Wake every blocked consumer so it observes exhaustion,
        // and any remaining waiter on space so it observes the close.
        self.job_available.notify_all();
        self.space_or_drained.notify_all();

        // All slots are vacant; release the backing storage while the
        // handles stay alive.
        state.slots = Box::default();
    }

    /// Close admission without waiting for the drain. Used when the producer
    /// is dropped without an explicit shutdown, so consumers still terminate.
    fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            self.job_available.notify_all();
            self.space_or_drained.notify_all();
        }
    }

    fn len(&self) -> usize {
        self.state.lock().count
    }
}

/// Producing handle for a [`JobQueue`]
///
/// There is exactly one producer per queue; the handle is not cloneable, so
/// the single-producer contract is carried by the type. Dropping the handle
/// without calling [`shutdown`](JobProducer::shutdown) closes the queue
/// without waiting for the drain, which still guarantees that consumers
/// terminate once the buffered jobs are gone.
pub struct JobProducer<T> {
    queue: Arc<JobQueue<T>>,
}

impl<T> JobProducer<T> {
    /// Push a job, blocking while the queue is full.
    ///
    /// On success, ownership of the job transfers to the queue. If the queue
    /// has been shut down, the job is handed back inside [`PushError`] and
    /// nothing is inserted.
    pub fn push(&self, job: T) -> Result<(), PushError<T>> {
        self.queue.push(job)
    }

    /// Stop admission, wait for consumers to drain every buffered job, then
    /// release the slot storage.
    ///
    /// Call this exactly once, after the last `push`. Every blocked consumer
    /// is woken once the drain completes and observes [`Exhausted`].
    ///
    /// If the queue is non-empty and no consumer is running, this call
    /// blocks forever; keep the worker pool alive until shutdown returns.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }

    /// Number of jobs currently buffered.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when no jobs are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity fixed at construction.
    pub fn capacity(&self) -> usize {
        self.queue.capacity
    }
}

impl<T> Drop for JobProducer<T> {
    fn drop(&mut self) {
        self.queue.close();
    }
}

/// Consuming handle for a [`JobQueue`], one clone per worker
pub struct JobConsumer<T> {
    queue: Arc<JobQueue<T>>,
}

impl<T> JobConsumer<T> {
    /// Pop the oldest job, blocking while the queue is empty and open.
    ///
    /// Returns [`Exhausted`] once the queue is both shut down and drained;
    /// that is the terminal signal, and every later call returns it too.
    /// Jobs buffered before the shutdown are still delivered in order.
    pub fn pop(&self) -> Result<T, Exhausted> {
        self.queue.pop()
    }

    /// Number of jobs currently buffered.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when no jobs are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity fixed at construction.
    pub fn capacity(&self) -> usize {
        self.queue.capacity
    }
}

impl<T> Clone for JobConsumer<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

/// Error returned by [`JobProducer::push`] after shutdown, carrying the
/// rejected job back to the caller
pub struct PushError<T>(pub T);

impl<T> PushError<T> {
    /// Recover the rejected job.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PushError(..)")
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("pushing into a job queue that has been shut down")
    }
}

impl<T> std::error::Error for PushError<T> {}

/// Terminal signal returned by [`JobConsumer::pop`] once the queue is shut
/// down and fully drained
///
/// This is ordinary control flow for a worker, not a failure to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted;

impl fmt::Display for Exhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("job queue is shut down and drained")
    }
}

impl std::error::Error for Exhausted {}

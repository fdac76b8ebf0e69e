use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::shared::sync::lock;

/// Single-consumer FIFO of pending work
///
/// Producers `push` from anywhere; exactly one `QueueWorker` drains the
/// items in order. Closing drops the sender so the worker sees the end of
/// the queue once it has caught up.
pub struct TaskQueue<T> {
    sender: Mutex<Option<mpsc::UnboundedSender<T>>>,
    pending: Arc<AtomicUsize>,
}

/// The draining end of a `TaskQueue`
pub struct QueueWorker<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    pending: Arc<AtomicUsize>,
}

impl<T> TaskQueue<T> {
    /// Creates a closed queue; `open` it before pushing
    pub fn new() -> Self {
        Self {
            sender: Mutex::new(None),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Starts a new generation of the queue, returning its only worker
    pub fn open(&self) -> QueueWorker<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *lock(&self.sender) = Some(sender);
        self.pending.store(0, Ordering::SeqCst);

        QueueWorker {
            receiver,
            pending: Arc::clone(&self.pending),
        }
    }

    /// Appends an item. Returns false if the queue is closed.
    pub fn push(&self, item: T) -> bool {
        let sender = lock(&self.sender);
        let Some(sender) = sender.as_ref() else {
            return false;
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(item).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    pub fn close(&self) {
        lock(&self.sender).take();
    }

    pub fn is_open(&self) -> bool {
        lock(&self.sender).is_some()
    }

    /// Items pushed but not yet taken by the worker
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueueWorker<T> {
    /// Next item in push order, or None once the queue is closed and drained
    pub async fn next(&mut self) -> Option<T> {
        let item = self.receiver.recv().await?;
        self.pending.fetch_sub(1, Ordering::SeqCst);
        Some(item)
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

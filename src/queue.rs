//! # Bounded MPSC queue (spec.md §4.6, §5)
//!
//! A thin wrapper over `crossbeam_channel::bounded` that additionally
//! tracks how many producers remain, so a consumer can tell "empty because
//! a producer is slow" from "empty because every producer finalized" —
//! the distinction spec.md §4.6 calls out explicitly ("consumers block on
//! pop until an item is available or all producers have finalized").
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

/// A bounded queue with a known number of producers. Cloning a
/// [`BoundedQueue`] clones the channel handles; `finalize` must be called
/// exactly once per producer clone when that producer is done.
pub struct BoundedQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    remaining_producers: Arc<AtomicUsize>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        BoundedQueue {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            remaining_producers: Arc::clone(&self.remaining_producers),
        }
    }
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize, num_producers: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        BoundedQueue {
            sender,
            receiver,
            remaining_producers: Arc::new(AtomicUsize::new(num_producers)),
        }
    }

    /// Blocks if the queue is full. Only ever fails if every receiver has
    /// been dropped, which should not happen while the pipeline is alive.
    pub fn push(&self, item: T) {
        let _ = self.sender.send(item);
    }

    /// Blocks until an item is available, or returns `None` once all
    /// producers have finalized and the queue has drained.
    ///
    /// A pipeline stage that both pushes onward and pops (a processor
    /// forwarding to a write queue while draining a read queue) holds a
    /// live `Sender` clone for as long as it runs, so the channel itself
    /// never disconnects on its own; `remaining_producers` is what this
    /// polls against instead of relying purely on `Sender` drop.
    pub fn pop(&self) -> Option<T> {
        loop {
            match self.receiver.recv_timeout(std::time::Duration::from_millis(20)) {
                Ok(item) => return Some(item),
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => return None,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    if self.remaining_producers() == 0 && self.receiver.is_empty() {
                        return None;
                    }
                }
            }
        }
    }

    /// Mark one producer done. `pop` treats the count reaching zero (with
    /// the queue drained) as equivalent to the channel closing.
    pub fn finalize_producer(&self) {
        self.remaining_producers.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn remaining_producers(&self) -> usize {
        self.remaining_producers.load(Ordering::Acquire)
    }
}

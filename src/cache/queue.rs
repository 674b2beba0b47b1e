//! Write Queue Module
//!
//! Multi-producer, single-consumer FIFO of pending writes between the
//! facade and the drain worker.

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

use crate::error::{CacheError, Result};

// == Queue Mode ==
/// Capacity policy of the write queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueMode {
    /// Sends never wait; memory grows with the backlog
    #[default]
    Unbounded,
    /// Sends wait for room once `capacity` items are pending
    Bounded(usize),
}

// == Queue Item ==
/// A single pending write, moved from producer to worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> QueueItem<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

enum Sender<K, V> {
    Unbounded(mpsc::UnboundedSender<QueueItem<K, V>>),
    Bounded(mpsc::Sender<QueueItem<K, V>>),
}

enum Receiver<K, V> {
    Unbounded(mpsc::UnboundedReceiver<QueueItem<K, V>>),
    Bounded(mpsc::Receiver<QueueItem<K, V>>),
}

// == Write Queue ==
/// Producer side of the queue.
///
/// The sender lives behind a lock: `send` holds it shared for the duration of
/// the enqueue and `close` takes it exclusively, so every send either lands
/// before the close or fails with [`CacheError::QueueClosed`].
pub struct WriteQueue<K, V> {
    sender: RwLock<Option<Sender<K, V>>>,
}

/// Consumer side of the queue, owned by the drain worker.
pub struct QueueReceiver<K, V> {
    inner: Receiver<K, V>,
}

/// Creates a connected queue pair.
pub fn write_queue<K, V>(mode: QueueMode) -> (WriteQueue<K, V>, QueueReceiver<K, V>) {
    let (sender, receiver) = match mode {
        QueueMode::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (Sender::Unbounded(tx), Receiver::Unbounded(rx))
        }
        QueueMode::Bounded(capacity) => {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            (Sender::Bounded(tx), Receiver::Bounded(rx))
        }
    };

    (
        WriteQueue {
            sender: RwLock::new(Some(sender)),
        },
        QueueReceiver { inner: receiver },
    )
}

impl<K, V> WriteQueue<K, V> {
    // == Send ==
    /// Enqueues `item` behind every item already sent.
    ///
    /// Unbounded queues return immediately; bounded queues wait for room.
    pub async fn send(&self, item: QueueItem<K, V>) -> Result<()> {
        let guard = self.sender.read().await;
        match guard.as_ref() {
            Some(Sender::Unbounded(tx)) => tx.send(item).map_err(|_| CacheError::QueueClosed),
            Some(Sender::Bounded(tx)) => tx.send(item).await.map_err(|_| CacheError::QueueClosed),
            None => Err(CacheError::QueueClosed),
        }
    }

    // == Try Send ==
    /// Enqueues `item` only if that needs no waiting.
    ///
    /// Fails with [`CacheError::QueueFull`] when a bounded queue has no room,
    /// and with [`CacheError::QueueClosed`] once closed or while a close is
    /// taking the sender.
    pub fn try_send(&self, item: QueueItem<K, V>) -> Result<()> {
        let guard = self
            .sender
            .try_read()
            .map_err(|_| CacheError::QueueClosed)?;
        match guard.as_ref() {
            Some(Sender::Unbounded(tx)) => tx.send(item).map_err(|_| CacheError::QueueClosed),
            Some(Sender::Bounded(tx)) => tx.try_send(item).map_err(|err| match err {
                TrySendError::Full(_) => CacheError::QueueFull,
                TrySendError::Closed(_) => CacheError::QueueClosed,
            }),
            None => Err(CacheError::QueueClosed),
        }
    }

    // == Close ==
    /// Stops accepting sends. Items already queued stay consumable.
    ///
    /// Returns `false` if the queue was already closed.
    pub async fn close(&self) -> bool {
        self.sender.write().await.take().is_some()
    }

    /// Returns true once `close` has run.
    pub async fn is_closed(&self) -> bool {
        self.sender.read().await.is_none()
    }
}

impl<K, V> QueueReceiver<K, V> {
    // == Receive ==
    /// Waits for the next item.
    ///
    /// Returns `None` once the queue is closed and fully drained.
    pub async fn recv(&mut self) -> Option<QueueItem<K, V>> {
        match &mut self.inner {
            Receiver::Unbounded(rx) => rx.recv().await,
            Receiver::Bounded(rx) => rx.recv().await,
        }
    }
}

//! Background event publisher.
//!
//! Messages are handed to a bounded queue and published to the bus by a
//! dedicated worker thread, so the caller never waits on the event channel.
//! Publishing is fire-and-forget:
//!
//! - a full or closed queue drops the message (`dropped`)
//! - a bus error is logged and counted (`failed`), never retried inline
//! - neither ever reverses the state change that produced the message
//!
//! On shutdown the worker publishes whatever is still queued, then exits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use rentpoint_events::EventBus;

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    published: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Publisher runtime statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublisherStats {
    pub enqueued: u64,
    pub published: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl Counters {
    fn snapshot(&self) -> PublisherStats {
        PublisherStats {
            enqueued: self.enqueued.load(Ordering::SeqCst),
            published: self.published.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            dropped: self.dropped.load(Ordering::SeqCst),
        }
    }
}

/// Cloneable enqueue side of the publisher.
#[derive(Debug)]
pub struct EventPublisher<M> {
    name: &'static str,
    queue: SyncSender<M>,
    counters: Arc<Counters>,
}

impl<M> Clone for EventPublisher<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            queue: self.queue.clone(),
            counters: self.counters.clone(),
        }
    }
}

/// Handle to observe and stop the publisher worker.
#[derive(Debug)]
pub struct PublisherHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl PublisherHandle {
    pub fn stats(&self) -> PublisherStats {
        self.counters.snapshot()
    }

    /// Request shutdown, wait for the queue to drain and the worker to stop.
    pub fn shutdown(mut self) -> PublisherStats {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
        self.counters.snapshot()
    }
}

impl<M: Send + 'static> EventPublisher<M> {
    /// Spawn the worker thread publishing to `bus` from a queue of `capacity`.
    pub fn spawn<B>(name: &'static str, bus: B, capacity: usize) -> std::io::Result<(Self, PublisherHandle)>
    where
        B: EventBus<M> + 'static,
    {
        let (queue_tx, queue_rx) = mpsc::sync_channel::<M>(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let counters = Arc::new(Counters::default());

        let worker_counters = counters.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || publisher_loop(name, bus, queue_rx, shutdown_rx, &worker_counters))?;

        info!(publisher = name, capacity, "event publisher started");

        let publisher = Self {
            name,
            queue: queue_tx,
            counters: counters.clone(),
        };
        let handle = PublisherHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            counters,
        };
        Ok((publisher, handle))
    }

    /// Queue `message` for publication. Never blocks.
    ///
    /// Returns `false` when the message was dropped.
    pub fn enqueue(&self, message: M) -> bool {
        match self.queue.try_send(message) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::SeqCst);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::SeqCst);
                warn!(publisher = self.name, "event queue full; message dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::SeqCst);
                warn!(publisher = self.name, "event publisher stopped; message dropped");
                false
            }
        }
    }

    pub fn stats(&self) -> PublisherStats {
        self.counters.snapshot()
    }
}

fn publisher_loop<M, B>(
    name: &'static str,
    bus: B,
    queue: mpsc::Receiver<M>,
    shutdown_rx: mpsc::Receiver<()>,
    counters: &Counters,
) where
    B: EventBus<M>,
{
    let tick = Duration::from_millis(100);

    loop {
        // A dropped handle counts as a shutdown request.
        if !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty)) {
            let mut drained = 0usize;
            while let Ok(message) = queue.try_recv() {
                publish_one(name, &bus, message, counters);
                drained += 1;
            }
            debug!(publisher = name, drained, "event publisher drained queue");
            break;
        }

        match queue.recv_timeout(tick) {
            Ok(message) => publish_one(name, &bus, message, counters),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(publisher = name, "event publisher stopped");
}

fn publish_one<M, B: EventBus<M>>(name: &'static str, bus: &B, message: M, counters: &Counters) {
    match bus.publish(message) {
        Ok(()) => {
            counters.published.fetch_add(1, Ordering::SeqCst);
        }
        Err(err) => {
            counters.failed.fetch_add(1, Ordering::SeqCst);
            warn!(publisher = name, error = ?err, "event publish failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use rentpoint_events::{InMemoryEventBus, Subscription};

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    /// Bus whose every publish fails.
    struct BrokenBus;

    impl EventBus<u32> for BrokenBus {
        type Error = String;

        fn publish(&self, _message: u32) -> Result<(), Self::Error> {
            Err("broker unreachable".to_string())
        }

        fn subscribe(&self) -> Subscription<u32> {
            let (_tx, rx) = mpsc::channel();
            Subscription::new(rx)
        }
    }

    #[test]
    fn publishes_in_background() {
        let bus = Arc::new(InMemoryEventBus::<u32>::new());
        let sub = bus.subscribe();
        let (publisher, handle) = EventPublisher::spawn("test-publisher", bus.clone(), 8).unwrap();

        assert!(publisher.enqueue(1));
        assert!(publisher.enqueue(2));

        assert_eq!(sub.recv_timeout(Duration::from_secs(2)).unwrap(), 1);
        assert_eq!(sub.recv_timeout(Duration::from_secs(2)).unwrap(), 2);
        assert!(wait_until(|| handle.stats().published == 2));

        let stats = handle.shutdown();
        assert_eq!(stats.enqueued, 2);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn bus_failures_are_counted_not_raised() {
        let (publisher, handle) = EventPublisher::spawn("broken-publisher", BrokenBus, 8).unwrap();

        assert!(publisher.enqueue(7));
        assert!(wait_until(|| handle.stats().failed == 1));
        assert_eq!(handle.stats().published, 0);
        handle.shutdown();
    }

    #[test]
    fn enqueue_after_shutdown_is_dropped() {
        let bus = Arc::new(InMemoryEventBus::<u32>::new());
        let (publisher, handle) = EventPublisher::spawn("stopped-publisher", bus, 8).unwrap();
        handle.shutdown();

        assert!(!publisher.enqueue(1));
        assert_eq!(publisher.stats().dropped, 1);
    }

    #[test]
    fn shutdown_drains_queue() {
        let bus = Arc::new(InMemoryEventBus::<u32>::new());
        let sub = bus.subscribe();
        let (publisher, handle) = EventPublisher::spawn("drain-publisher", bus.clone(), 64).unwrap();

        for n in 0..20 {
            assert!(publisher.enqueue(n));
        }
        let stats = handle.shutdown();

        assert_eq!(stats.published, 20);
        assert_eq!(sub.drain().len(), 20);
    }
}

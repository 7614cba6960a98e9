//! # Status queue
//!
//! Status messages produced by the running program are pushed into an unbounded channel by the
//! worker thread and drained in order by whoever serves `long:status`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc, Mutex,
    },
    time::Duration,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Consuming end of the status messages.
///
/// Clones share the same queue, each message is received by exactly one of them.
#[derive(Clone)]
pub struct StatusQueue {
    receiver: Arc<Mutex<Receiver<String>>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StatusQueue {
    /// Create a new queue, returning the sender used to push messages onto it.
    pub fn new() -> (Sender<String>, Self) {
        let (sender, receiver) = mpsc::channel();

        (
            sender,
            Self {
                receiver: Arc::new(Mutex::new(receiver)),
            },
        )
    }

    /// Wait for the next message.
    ///
    /// Returns `None` if every sender has been dropped and the queue is empty.
    pub fn recv(&self) -> Option<String> {
        let receiver = self.receiver.lock().unwrap_or_else(|e| e.into_inner());
        receiver.recv().ok()
    }

    /// Wait up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<String> {
        let receiver = self.receiver.lock().unwrap_or_else(|e| e.into_inner());
        match receiver.recv_timeout(timeout) {
            Ok(m) => Some(m),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take the next message if there is one, without waiting.
    pub fn try_recv(&self) -> Option<String> {
        let receiver = self.receiver.lock().unwrap_or_else(|e| e.into_inner());
        receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let (sender, queue) = StatusQueue::new();
        sender.send("a".into()).unwrap();
        sender.send("b".into()).unwrap();

        assert_eq!(queue.recv().as_deref(), Some("a"));
        assert_eq!(queue.clone().recv().as_deref(), Some("b"));
        assert_eq!(queue.try_recv(), None);
    }

    #[test]
    fn test_recv_waits_for_producer() {
        let (sender, queue) = StatusQueue::new();

        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            sender.send("late".into()).unwrap();
        });

        assert_eq!(queue.recv().as_deref(), Some("late"));
        producer.join().unwrap();

        // Producer gone and queue empty
        assert_eq!(queue.recv(), None);
        assert_eq!(queue.recv_timeout(Duration::from_millis(5)), None);
    }
}

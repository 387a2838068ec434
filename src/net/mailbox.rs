//! Single-slot, latest-wins hand-off between the receiver thread and the
//! simulation tick
//!
//! Built on a capacity-1 crossbeam channel. Posting into a full slot evicts
//! the unread value; taking is non-blocking and leaves the slot empty.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Overwrite-on-write, read-and-clear cell
pub struct Mailbox<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(1);
        Self { sender, receiver }
    }

    /// Store `value`, discarding any unread one
    ///
    /// Returns true if an unread value was evicted. Intended for a single
    /// writer; concurrent takers only ever make room.
    pub fn post(&self, value: T) -> bool {
        let mut pending = value;
        let mut evicted = false;
        loop {
            match self.sender.try_send(pending) {
                Ok(()) => return evicted,
                Err(TrySendError::Full(back)) => {
                    evicted |= self.receiver.try_recv().is_ok();
                    pending = back;
                }
                // Both ends live in self, so this cannot happen
                Err(TrySendError::Disconnected(_)) => return evicted,
            }
        }
    }

    /// Take the latest value, if any (never blocks)
    #[inline]
    pub fn take(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_take_empty() {
        let mailbox: Mailbox<u32> = Mailbox::new();
        assert!(mailbox.is_empty());
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_post_then_take_clears() {
        let mailbox = Mailbox::new();
        assert!(!mailbox.post(1));
        assert_eq!(mailbox.take(), Some(1));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_latest_wins() {
        let mailbox = Mailbox::new();
        mailbox.post(1);
        assert!(mailbox.post(2));
        assert!(mailbox.post(3));
        assert_eq!(mailbox.take(), Some(3));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_cross_thread_writer() {
        let mailbox = Arc::new(Mailbox::new());
        let writer = {
            let mailbox = mailbox.clone();
            thread::spawn(move || {
                for i in 0..1000u32 {
                    mailbox.post(i);
                }
            })
        };
        writer.join().unwrap();
        assert_eq!(mailbox.take(), Some(999));
    }
}

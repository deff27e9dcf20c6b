//! Bounded per-agent inbox.
//!
//! A fixed-capacity ring buffer. Storage is allocated once at construction
//! and never grows; a push into a full inbox fails and hands the message
//! back so the caller can record the drop.

use crate::protocol::Message;

/// Default inbox capacity.
pub const DEFAULT_INBOX_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct Inbox {
    slots: Box<[Option<Message>]>,
    head: usize,
    len: usize,
}

impl Inbox {
    /// Create an empty inbox with room for `capacity` messages.
    ///
    /// A zero capacity is bumped to one; configuration rejects it earlier.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Append at the tail. Returns the message untouched when full.
    pub(crate) fn push(&mut self, message: Message) -> Result<(), Message> {
        if self.is_full() {
            return Err(message);
        }
        let tail = (self.head + self.len) % self.capacity();
        self.slots[tail] = Some(message);
        self.len += 1;
        Ok(())
    }

    /// Remove from the head.
    pub(crate) fn pop(&mut self) -> Option<Message> {
        if self.is_empty() {
            return None;
        }
        let message = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        message
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_INBOX_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityMinter;
    use crate::protocol::{Draft, MessageIds, Target};

    fn messages(n: usize) -> Vec<Message> {
        let cap = CapabilityMinter::new().mint().unwrap();
        let mut ids = MessageIds::new();
        (0..n)
            .map(|i| Draft::new(cap, Target::agent("A"), format!("m{}", i)).stamp(ids.next_id(), "A"))
            .collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut inbox = Inbox::with_capacity(4);
        for m in messages(3) {
            inbox.push(m).unwrap();
        }

        assert_eq!(inbox.pop().unwrap().payload(), "m0");
        assert_eq!(inbox.pop().unwrap().payload(), "m1");
        assert_eq!(inbox.pop().unwrap().payload(), "m2");
        assert!(inbox.pop().is_none());
    }

    #[test]
    fn test_full_push_fails_without_mutation() {
        let mut inbox = Inbox::with_capacity(2);
        let mut batch = messages(3).into_iter();
        inbox.push(batch.next().unwrap()).unwrap();
        inbox.push(batch.next().unwrap()).unwrap();

        let third = batch.next().unwrap();
        let rejected = inbox.push(third.clone()).unwrap_err();

        assert_eq!(rejected, third);
        assert!(inbox.is_full());
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox.pop().unwrap().payload(), "m0");
        assert_eq!(inbox.pop().unwrap().payload(), "m1");
    }

    #[test]
    fn test_wraparound_keeps_count() {
        let mut inbox = Inbox::with_capacity(3);
        let mut batch = messages(7).into_iter();

        inbox.push(batch.next().unwrap()).unwrap();
        inbox.push(batch.next().unwrap()).unwrap();
        inbox.pop().unwrap();
        inbox.pop().unwrap();

        // head is now at slot 2; these three wrap past the end
        for m in batch.by_ref().take(3) {
            inbox.push(m).unwrap();
        }
        assert_eq!(inbox.len(), 3);
        assert!(inbox.push(batch.next().unwrap()).is_err());

        assert_eq!(inbox.pop().unwrap().payload(), "m2");
        assert_eq!(inbox.pop().unwrap().payload(), "m3");
        assert_eq!(inbox.len(), 1);
    }

    #[test]
    fn test_pop_empty() {
        let mut inbox = Inbox::default();
        assert_eq!(inbox.capacity(), DEFAULT_INBOX_CAPACITY);
        assert!(inbox.pop().is_none());
        assert!(inbox.is_empty());
    }
}

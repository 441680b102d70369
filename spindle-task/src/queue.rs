//! EventQueue: FIFO of inbound items with one-shot pulled callbacks.

use std::collections::VecDeque;
use std::fmt;

/// Fired once, against the queue owner's context, when its item is pulled.
/// Returns whether it claimed the item.
pub type OnPull<C> = Box<dyn FnOnce(&mut C) -> bool + Send>;

/// An item handed out by [`EventQueue::pull`].
#[derive(Debug, Clone, PartialEq)]
pub struct Pulled<T> {
    /// The item.
    pub item: T,
    /// Whether the item's callback consumed it. A claimed item has
    /// already been delivered and must not be delivered again.
    pub claimed: bool,
}

/// First in, first out. A callback attached at push time fires exactly
/// when its item is pulled, not when it is pushed.
pub struct EventQueue<T, C> {
    items: VecDeque<(T, Option<OnPull<C>>)>,
}

impl<T, C> EventQueue<T, C> {
    /// An empty queue.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append an item.
    pub fn push(&mut self, item: T) {
        self.items.push_back((item, None));
    }

    /// Append an item with a pulled callback.
    pub fn push_with(&mut self, item: T, on_pull: OnPull<C>) {
        self.items.push_back((item, Some(on_pull)));
    }

    /// Take the oldest item, firing its callback against `context`.
    pub fn pull(&mut self, context: &mut C) -> Option<Pulled<T>> {
        let (item, on_pull) = self.items.pop_front()?;
        let claimed = match on_pull {
            Some(on_pull) => on_pull(context),
            None => false,
        };
        Some(Pulled { item, claimed })
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every queued item without firing callbacks.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T, C> Default for EventQueue<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, C> fmt::Debug for EventQueue<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.items.iter().map(|(item, _)| item))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulls_in_order_and_fires_callback_on_pull() {
        let mut queue: EventQueue<&str, Vec<&str>> = EventQueue::new();
        let mut seen = Vec::new();

        queue.push("a");
        queue.push_with(
            "b",
            Box::new(|seen: &mut Vec<&str>| {
                seen.push("b pulled");
                true
            }),
        );
        assert!(seen.is_empty());

        let a = queue.pull(&mut seen).unwrap();
        assert_eq!(a, Pulled { item: "a", claimed: false });
        assert!(seen.is_empty());

        let b = queue.pull(&mut seen).unwrap();
        assert!(b.claimed);
        assert_eq!(seen, vec!["b pulled"]);

        assert!(queue.pull(&mut seen).is_none());
    }

    #[test]
    fn clear_drops_callbacks_unfired() {
        let mut queue: EventQueue<u8, u32> = EventQueue::new();
        let mut fired = 0u32;
        queue.push_with(
            1,
            Box::new(|n: &mut u32| {
                *n += 1;
                true
            }),
        );
        queue.clear();
        assert!(queue.pull(&mut fired).is_none());
        assert_eq!(fired, 0);
    }
}

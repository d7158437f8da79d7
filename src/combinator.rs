//! Lockable Cartesian product
//!
//! [`Combinator`] enumerates every combination of one item per key, lazily and
//! in odometer order: the key registered last changes fastest, the key
//! registered first changes slowest.
//!
//! ```rust
//! use seedpath::Combinator;
//!
//! let combinator = Combinator::new(vec![
//!     ("a", vec![1, 2]),
//!     ("b", vec![10, 20]),
//! ]);
//! let all: Vec<_> = combinator.collect();
//! assert_eq!(all, vec![
//!     vec![("a", 1), ("b", 10)],
//!     vec![("a", 1), ("b", 20)],
//!     vec![("a", 2), ("b", 10)],
//!     vec![("a", 2), ("b", 20)],
//! ]);
//! ```
//!
//! ## Locking
//!
//! Between two pulls a key can be locked with [`Combinator::lock`]. A locked
//! key keeps the item it currently points at for the rest of the enumeration
//! and the odometer keeps turning over the remaining keys only. Unlocked keys
//! keep their cursor when a neighbour gets locked, so nothing already produced
//! is produced again.
//!
//! The matching driver locks a file as soon as one of its candidates is
//! verified, which prunes every combination that would only vary settled
//! files.
//!
//! ```rust
//! use seedpath::Combinator;
//!
//! let mut combinator = Combinator::new(vec![
//!     ("a", vec![1, 2]),
//!     ("b", vec![10, 20, 30]),
//! ]);
//! assert_eq!(combinator.next(), Some(vec![("a", 1), ("b", 10)]));
//! combinator.lock(&["b"]).unwrap();
//! assert_eq!(combinator.next(), Some(vec![("a", 2), ("b", 10)]));
//! assert_eq!(combinator.next(), None);
//! ```

use crate::error::{Result, SeedpathError};
use std::fmt::Display;

/// Per-key enumeration state
#[derive(Debug, Clone)]
struct Slot<K, V> {
    key: K,
    items: Vec<V>,
    cursor: usize,
    locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing yielded yet
    Fresh,
    /// The assignment at the current cursors has been yielded
    Running,
    /// No further assignments
    Exhausted,
}

/// Lazy Cartesian product over named item lists with lockable keys
///
/// See the [module documentation](self) for the enumeration order and the
/// locking rules.
#[derive(Debug, Clone)]
pub struct Combinator<K, V> {
    slots: Vec<Slot<K, V>>,
    state: State,
}

impl<K, V> Combinator<K, V>
where
    K: Clone + PartialEq + Display,
    V: Clone,
{
    /// Create a combinator from `(key, items)` pairs
    ///
    /// Keys keep the order in which they are given. If any key has no items
    /// the product is empty and the combinator yields nothing. Without any
    /// keys it yields a single empty assignment.
    pub fn new(entries: impl IntoIterator<Item = (K, Vec<V>)>) -> Self {
        let slots: Vec<Slot<K, V>> = entries
            .into_iter()
            .map(|(key, items)| Slot {
                key,
                items,
                cursor: 0,
                locked: false,
            })
            .collect();

        let state = if slots.iter().any(|slot| slot.items.is_empty()) {
            State::Exhausted
        } else {
            State::Fresh
        };

        Self { slots, state }
    }

    /// Freeze `keys` at their current items
    ///
    /// May be called before iteration starts or between any two pulls.
    /// Locking an already locked key does nothing.
    ///
    /// # Errors
    ///
    /// [`SeedpathError::UnknownKey`] if any of `keys` was never registered.
    /// In that case no key is locked.
    pub fn lock<'a, I>(&mut self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let mut indexes = Vec::new();
        for key in keys {
            let index = self
                .slots
                .iter()
                .position(|slot| slot.key == *key)
                .ok_or_else(|| SeedpathError::UnknownKey(key.to_string()))?;
            indexes.push(index);
        }

        for index in indexes {
            self.slots[index].locked = true;
        }
        Ok(())
    }

    /// Whether `key` is locked
    ///
    /// Unknown keys are reported as unlocked.
    pub fn is_locked(&self, key: &K) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.locked && slot.key == *key)
    }

    /// Number of locked keys
    pub fn locked_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.locked).count()
    }

    /// Number of registered keys
    pub fn key_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether the enumeration has ended
    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    fn current(&self) -> Vec<(K, V)> {
        self.slots
            .iter()
            .map(|slot| (slot.key.clone(), slot.items[slot.cursor].clone()))
            .collect()
    }

    /// Turn the odometer by one step over the unlocked keys
    ///
    /// Returns `false` when the slowest unlocked key overflows or when every
    /// key is locked.
    fn advance(&mut self) -> bool {
        for slot in self.slots.iter_mut().rev().filter(|slot| !slot.locked) {
            if slot.cursor + 1 < slot.items.len() {
                slot.cursor += 1;
                return true;
            }
            slot.cursor = 0;
        }
        false
    }
}

impl<K, V> Iterator for Combinator<K, V>
where
    K: Clone + PartialEq + Display,
    V: Clone,
{
    type Item = Vec<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Exhausted => None,
            State::Fresh => {
                self.state = State::Running;
                Some(self.current())
            }
            State::Running => {
                if self.advance() {
                    Some(self.current())
                } else {
                    self.state = State::Exhausted;
                    None
                }
            }
        }
    }
}

impl<K, V> std::iter::FusedIterator for Combinator<K, V>
where
    K: Clone + PartialEq + Display,
    V: Clone,
{
}

//! Fixed-capacity circular FIFO of slot indexes.
//!
//! Backs the descriptor free list, the command queue and the completion
//! outbox. Capacity is a const generic so nothing allocates.

/// Circular FIFO of `u16` slot indexes with wraparound.
pub(crate) struct IndexRing<const N: usize> {
    /// Backing storage
    slots: [u16; N],
    /// Index of the oldest entry
    head: usize,
    /// Number of live entries
    len: usize,
}

#[allow(dead_code)]
impl<const N: usize> IndexRing<N> {
    /// Create an empty ring
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [0; N],
            head: 0,
            len: 0,
        }
    }

    /// Capacity of the ring
    #[inline(always)]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of queued entries
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is queued
    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether another push would fail
    #[inline(always)]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Append at the tail. Returns `false` when full.
    pub fn push_back(&mut self, value: u16) -> bool {
        if self.is_full() {
            return false;
        }
        let tail = (self.head + self.len) % N;
        self.slots[tail] = value;
        self.len += 1;
        true
    }

    /// Remove and return the oldest entry
    pub fn pop_front(&mut self) -> Option<u16> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Some(value)
    }

    /// Peek at the oldest entry
    #[must_use]
    pub fn front(&self) -> Option<u16> {
        if self.is_empty() {
            None
        } else {
            Some(self.slots[self.head])
        }
    }

    /// Get the entry at an offset from the head
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<u16> {
        if offset < self.len {
            Some(self.slots[(self.head + offset) % N])
        } else {
            None
        }
    }

    /// Remove the first occurrence of `value`, keeping order.
    ///
    /// Returns `true` if the value was present.
    pub fn remove(&mut self, value: u16) -> bool {
        let Some(pos) = self.iter().position(|v| v == value) else {
            return false;
        };
        for i in pos..self.len - 1 {
            let dst = (self.head + i) % N;
            let src = (self.head + i + 1) % N;
            self.slots[dst] = self.slots[src];
        }
        self.len -= 1;
        true
    }

    /// Whether `value` is queued
    #[must_use]
    pub fn contains(&self, value: u16) -> bool {
        self.iter().any(|v| v == value)
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.len).map(move |i| self.slots[(self.head + i) % N])
    }
}

impl<const N: usize> Default for IndexRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

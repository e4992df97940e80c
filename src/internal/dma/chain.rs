//! Per-ring descriptor chain.
//!
//! A chain is `head -> ... -> tail -> halt`, linked through the hardware
//! `next` pointers with `from` back-links kept in the pool. The chain only
//! tracks head, tail and length; the links themselves live in the pool so
//! the chip can follow them.

use super::pool::DescriptorPool;

/// Software view of one ring's queued descriptors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Chain {
    head: Option<u16>,
    tail: Option<u16>,
    len: u16,
}

#[allow(dead_code)]
impl Chain {
    /// Create an empty chain
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Oldest descriptor
    #[inline(always)]
    pub fn head(&self) -> Option<usize> {
        self.head.map(usize::from)
    }

    /// Newest descriptor
    #[inline(always)]
    pub fn tail(&self) -> Option<usize> {
        self.tail.map(usize::from)
    }

    /// Number of descriptors in the chain
    #[inline(always)]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    /// Whether the chain is empty
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Link a prepared descriptor after the tail.
    ///
    /// The new descriptor is terminated on `halt` before the old tail is
    /// pointed at it, so the chip never sees a dangling link.
    pub fn append<const N: usize>(&mut self, pool: &mut DescriptorPool<N>, idx: usize, halt: u32) {
        pool.desc(idx).set_next(halt);
        match self.tail {
            Some(t) => {
                let t = usize::from(t);
                pool.set_from(idx, Some(t as u16));
                pool.desc(t).set_next(pool.addr(idx));
            }
            None => {
                pool.set_from(idx, None);
                self.head = Some(idx as u16);
            }
        }
        self.tail = Some(idx as u16);
        self.len += 1;
    }

    /// Successor of `idx` inside this chain (none once the halt is reached)
    pub fn next_of<const N: usize>(pool: &DescriptorPool<N>, idx: usize) -> Option<usize> {
        let next = pool.index_of(pool.desc(idx).next())?;
        if next == idx || DescriptorPool::<N>::is_halt(next) {
            None
        } else {
            Some(next)
        }
    }

    /// Detach the head from the bookkeeping and return it.
    ///
    /// The caller frees it through the pool afterwards.
    pub fn pop_head<const N: usize>(&mut self, pool: &DescriptorPool<N>) -> Option<usize> {
        let head = self.head()?;
        self.len -= 1;
        if self.len == 0 {
            self.head = None;
            self.tail = None;
        } else {
            self.head = Self::next_of(pool, head).map(|i| i as u16);
        }
        Some(head)
    }

    /// Detach an arbitrary member from the bookkeeping.
    ///
    /// Returns `false` if `idx` is not in the chain. The pool relinks the
    /// hardware pointers when the caller frees the descriptor.
    pub fn unlink<const N: usize>(&mut self, pool: &DescriptorPool<N>, idx: usize) -> bool {
        if !self.contains(pool, idx) {
            return false;
        }
        if self.head() == Some(idx) {
            self.pop_head(pool);
            return true;
        }
        if self.tail() == Some(idx) {
            self.tail = pool.from(idx);
        }
        self.len -= 1;
        true
    }

    /// Forget every member (after the caller freed them).
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Walk the chain from head, bounded by the pool size.
    pub fn iter<'a, const N: usize>(
        &self,
        pool: &'a DescriptorPool<N>,
    ) -> impl Iterator<Item = usize> + use<'a, N> {
        let mut cursor = self.head();
        let mut remaining = self.len();
        core::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let idx = cursor?;
            remaining -= 1;
            cursor = Self::next_of(pool, idx);
            Some(idx)
        })
        .take(N)
    }

    /// Whether `idx` is a member
    pub fn contains<const N: usize>(&self, pool: &DescriptorPool<N>, idx: usize) -> bool {
        self.iter(pool).any(|i| i == idx)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;
    use crate::hal::pcm::Direction;

    const BASE: u32 = 0x1000_0000;

    fn setup() -> (DescriptorPool<72>, Chain, u32) {
        let mut pool = DescriptorPool::new();
        pool.init(BASE);
        let halt = pool.halt_addr(Direction::Tx, 2);
        (pool, Chain::new(), halt)
    }

    fn push(pool: &mut DescriptorPool<72>, chain: &mut Chain, halt: u32) -> usize {
        let idx = pool.allocate(0).unwrap().index as usize;
        chain.append(pool, idx, halt);
        idx
    }

    #[test]
    fn append_links_through_to_halt() {
        let (mut pool, mut chain, halt) = setup();
        let a = push(&mut pool, &mut chain, halt);
        let b = push(&mut pool, &mut chain, halt);
        let c = push(&mut pool, &mut chain, halt);

        assert_eq!(chain.iter(&pool).collect::<Vec<_>>(), [a, b, c]);
        assert_eq!(pool.desc(c).next(), halt);
        assert_eq!(pool.from(b), Some(a as u16));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn pop_head_then_free_keeps_walk_valid() {
        let (mut pool, mut chain, halt) = setup();
        let a = push(&mut pool, &mut chain, halt);
        let b = push(&mut pool, &mut chain, halt);

        assert_eq!(chain.pop_head(&pool), Some(a));
        pool.free(pool.handle(a)).unwrap();

        assert_eq!(chain.head(), Some(b));
        assert_eq!(pool.from(b), None);
        // The freed head still points at the new head.
        assert_eq!(pool.desc(a).next(), pool.addr(b));
    }

    #[test]
    fn unlink_middle_and_tail() {
        let (mut pool, mut chain, halt) = setup();
        let a = push(&mut pool, &mut chain, halt);
        let b = push(&mut pool, &mut chain, halt);
        let c = push(&mut pool, &mut chain, halt);

        assert!(chain.unlink(&pool, b));
        pool.free(pool.handle(b)).unwrap();
        assert_eq!(chain.iter(&pool).collect::<Vec<_>>(), [a, c]);

        assert!(chain.unlink(&pool, c));
        pool.free(pool.handle(c)).unwrap();
        assert_eq!(chain.tail(), Some(a));
        assert_eq!(pool.desc(a).next(), halt);

        // Appending after an unlinked tail links from the new tail.
        let d = push(&mut pool, &mut chain, halt);
        assert_eq!(chain.iter(&pool).collect::<Vec<_>>(), [a, d]);
    }

    #[test]
    fn unlink_unknown_is_noop() {
        let (mut pool, mut chain, halt) = setup();
        push(&mut pool, &mut chain, halt);
        assert!(!chain.unlink(&pool, 70));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn last_pop_empties() {
        let (mut pool, mut chain, halt) = setup();
        let a = push(&mut pool, &mut chain, halt);
        assert_eq!(chain.pop_head(&pool), Some(a));
        assert!(chain.is_empty());
        assert_eq!(chain.tail(), None);
        assert_eq!(chain.pop_head(&pool), None);
    }
}

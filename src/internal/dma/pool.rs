//! Descriptor arena with a FIFO free list.
//!
//! Descriptors are addressed by index. The chip sees them at
//! `bus_base + index * 16`. The first [`HALT_DESCRIPTORS`] slots are the
//! permanent halt anchors, one per ring, and are never handed out.
//!
//! Freeing a descriptor leaves its `next` pointer intact: a chain walk (by
//! software or by the chip) that is standing on it still reaches the
//! successor. The predecessor that referenced it through `from` is relinked
//! past it instead. Reuse is FIFO, so a freed slot is the last to come back,
//! and the generation counter rejects any handle that outlived it.

use super::descriptor::Descriptor;
use crate::driver::error::{DmaError, DmaResult};
use crate::hal::pcm::Direction;
use crate::internal::constants::{DESCRIPTOR_SIZE, HALT_DESCRIPTORS, NUM_CHANNELS};
use crate::internal::ring::IndexRing;

/// Generation-checked reference to an allocated descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DescHandle {
    pub index: u16,
    pub generation: u16,
}

/// Bookkeeping kept beside each hardware descriptor
#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u16,
    allocated: bool,
    /// Index of the descriptor whose `next` points here
    from: Option<u16>,
    /// Request slot that owns this descriptor
    owner: Option<u16>,
}

impl Slot {
    const EMPTY: Self = Self {
        generation: 0,
        allocated: false,
        from: None,
        owner: None,
    };
}

/// Index of the halt descriptor anchoring a ring
#[inline(always)]
pub(crate) const fn halt_index(dir: Direction, channel: u8) -> usize {
    dir.index() * NUM_CHANNELS + channel as usize
}

/// Bus address of a ring's halt descriptor for a pool at `bus_base`
#[inline(always)]
pub(crate) const fn halt_address(bus_base: u32, dir: Direction, channel: u8) -> u32 {
    bus_base + halt_index(dir, channel) as u32 * DESCRIPTOR_SIZE
}

/// Fixed pool of `N` descriptors, halt anchors included
pub(crate) struct DescriptorPool<const N: usize> {
    descs: [Descriptor; N],
    slots: [Slot; N],
    free: IndexRing<N>,
    bus_base: u32,
}

#[allow(dead_code)]
impl<const N: usize> DescriptorPool<N> {
    /// Create an uninitialized pool
    #[must_use]
    pub const fn new() -> Self {
        Self {
            descs: [const { Descriptor::new() }; N],
            slots: [Slot::EMPTY; N],
            free: IndexRing::new(),
            bus_base: 0,
        }
    }

    /// Anchor every ring on its halt descriptor and fill the free list.
    ///
    /// Generations keep counting across re-initialization so handles from a
    /// previous run stay stale.
    pub fn init(&mut self, bus_base: u32) {
        debug_assert!(N > HALT_DESCRIPTORS, "descriptor pool smaller than halt set");
        self.bus_base = bus_base;
        self.free.clear();
        for idx in 0..N {
            let slot = &mut self.slots[idx];
            slot.generation = slot.generation.wrapping_add(1);
            slot.from = None;
            slot.owner = None;
            if idx < HALT_DESCRIPTORS {
                slot.allocated = true;
                self.descs[idx].setup_halt(bus_base + idx as u32 * DESCRIPTOR_SIZE);
            } else {
                slot.allocated = false;
                self.descs[idx].reset();
                self.free.push_back(idx as u16);
            }
        }
    }

    /// Bus address of a descriptor
    #[inline(always)]
    #[must_use]
    pub fn addr(&self, idx: usize) -> u32 {
        self.bus_base + idx as u32 * DESCRIPTOR_SIZE
    }

    /// Descriptor index for a bus address inside the pool
    #[must_use]
    pub fn index_of(&self, addr: u32) -> Option<usize> {
        let offset = addr.checked_sub(self.bus_base)?;
        if offset % DESCRIPTOR_SIZE != 0 {
            return None;
        }
        let idx = (offset / DESCRIPTOR_SIZE) as usize;
        (idx < N).then_some(idx)
    }

    /// Halt descriptor address of a ring
    #[inline(always)]
    #[must_use]
    pub fn halt_addr(&self, dir: Direction, channel: u8) -> u32 {
        halt_address(self.bus_base, dir, channel)
    }

    /// Whether an index is a permanent halt anchor
    #[inline(always)]
    #[must_use]
    pub const fn is_halt(idx: usize) -> bool {
        idx < HALT_DESCRIPTORS
    }

    /// Hardware descriptor at an index
    #[inline(always)]
    #[must_use]
    pub fn desc(&self, idx: usize) -> &Descriptor {
        &self.descs[idx]
    }

    /// Take a descriptor from the free list for request slot `owner`.
    pub fn allocate(&mut self, owner: u16) -> DmaResult<DescHandle> {
        let idx = self.free.pop_front().ok_or(DmaError::NoDescriptorsAvailable)? as usize;
        let slot = &mut self.slots[idx];
        slot.allocated = true;
        slot.owner = Some(owner);
        slot.from = None;
        Ok(DescHandle {
            index: idx as u16,
            generation: slot.generation,
        })
    }

    /// Check a handle and return its index.
    pub fn resolve(&self, handle: DescHandle) -> DmaResult<usize> {
        let idx = handle.index as usize;
        if idx >= N || Self::is_halt(idx) {
            return Err(DmaError::StaleHandle);
        }
        let slot = &self.slots[idx];
        if !slot.allocated || slot.generation != handle.generation {
            return Err(DmaError::StaleHandle);
        }
        Ok(idx)
    }

    /// Return a descriptor to the free list.
    ///
    /// The predecessor recorded in `from` is relinked past this descriptor if
    /// it still points here, and the successor inherits `from`. This
    /// descriptor's own `next` is left untouched.
    pub fn free(&mut self, handle: DescHandle) -> DmaResult<()> {
        let idx = self.resolve(handle)?;
        let here = self.addr(idx);
        let next = self.descs[idx].next();
        let from = self.slots[idx].from;

        if let Some(p) = from {
            let p = p as usize;
            if self.descs[p].next() == here {
                self.descs[p].set_next(next);
            }
        }
        if let Some(s) = self.index_of(next) {
            if s != idx && self.slots[s].from == Some(idx as u16) {
                self.slots[s].from = from;
            }
        }

        let slot = &mut self.slots[idx];
        slot.allocated = false;
        slot.owner = None;
        slot.from = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push_back(idx as u16);
        Ok(())
    }

    /// Record which descriptor links to `idx`
    pub fn set_from(&mut self, idx: usize, from: Option<u16>) {
        self.slots[idx].from = from;
    }

    /// Descriptor that links to `idx`
    #[must_use]
    pub fn from(&self, idx: usize) -> Option<u16> {
        self.slots[idx].from
    }

    /// Request slot owning `idx`
    #[must_use]
    pub fn owner(&self, idx: usize) -> Option<u16> {
        self.slots[idx].owner
    }

    /// Whether `idx` is currently allocated
    #[must_use]
    pub fn is_allocated(&self, idx: usize) -> bool {
        self.slots[idx].allocated
    }

    /// Handle for an allocated index
    #[must_use]
    pub fn handle(&self, idx: usize) -> DescHandle {
        DescHandle {
            index: idx as u16,
            generation: self.slots[idx].generation,
        }
    }

    /// Descriptors left on the free list
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Descriptors that can ever be handed out
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N - HALT_DESCRIPTORS
    }

    /// Bus base address
    #[must_use]
    pub fn bus_base(&self) -> u32 {
        self.bus_base
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = 0x1000_0000;

    fn pool() -> DescriptorPool<72> {
        let mut pool = DescriptorPool::new();
        pool.init(BASE);
        pool
    }

    #[test]
    fn halt_descriptors_anchor_every_ring() {
        let pool = pool();
        for dir in Direction::ALL {
            for ch in 0..NUM_CHANNELS as u8 {
                let idx = halt_index(dir, ch);
                let addr = pool.halt_addr(dir, ch);
                assert_eq!(pool.index_of(addr), Some(idx));
                assert!(pool.desc(idx).is_hold());
                assert_eq!(pool.desc(idx).next(), addr);
            }
        }
        assert_eq!(pool.available(), 72 - HALT_DESCRIPTORS);
        assert_eq!(pool.capacity(), 8);
    }

    #[test]
    fn index_of_rejects_foreign_addresses() {
        let pool = pool();
        assert_eq!(pool.index_of(BASE - 16), None);
        assert_eq!(pool.index_of(BASE + 4), None);
        assert_eq!(pool.index_of(BASE + 72 * 16), None);
        assert_eq!(pool.index_of(BASE + 71 * 16), Some(71));
    }

    #[test]
    fn allocate_until_exhausted() {
        let mut pool = pool();
        for _ in 0..8 {
            let h = pool.allocate(0).unwrap();
            assert!(!DescriptorPool::<72>::is_halt(h.index as usize));
        }
        assert_eq!(pool.allocate(0), Err(DmaError::NoDescriptorsAvailable));
    }

    #[test]
    fn free_list_is_fifo() {
        let mut pool = pool();
        let a = pool.allocate(0).unwrap();
        let b = pool.allocate(0).unwrap();
        pool.free(a).unwrap();
        let c = pool.allocate(0).unwrap();
        assert_ne!(c.index, a.index);
        assert_ne!(c.index, b.index);
    }

    #[test]
    fn stale_handle_rejected_after_free() {
        let mut pool = pool();
        let h = pool.allocate(3).unwrap();
        assert_eq!(pool.owner(h.index as usize), Some(3));
        pool.free(h).unwrap();
        assert_eq!(pool.free(h), Err(DmaError::StaleHandle));
        assert_eq!(pool.resolve(h), Err(DmaError::StaleHandle));
    }

    #[test]
    fn halt_cannot_be_freed() {
        let mut pool = pool();
        let h = pool.handle(0);
        assert_eq!(pool.free(h), Err(DmaError::StaleHandle));
    }

    #[test]
    fn free_keeps_next_and_relinks_predecessor() {
        let mut pool = pool();
        let halt = pool.halt_addr(Direction::Rx, 0);
        let a = pool.allocate(0).unwrap().index as usize;
        let b = pool.allocate(0).unwrap();
        let bi = b.index as usize;
        let c = pool.allocate(0).unwrap().index as usize;

        // a -> b -> c -> halt
        pool.desc(a).set_next(pool.addr(bi));
        pool.desc(bi).set_next(pool.addr(c));
        pool.desc(c).set_next(halt);
        pool.set_from(bi, Some(a as u16));
        pool.set_from(c, Some(bi as u16));

        pool.free(b).unwrap();

        assert_eq!(pool.desc(a).next(), pool.addr(c));
        assert_eq!(pool.from(c), Some(a as u16));
        // A walker standing on the freed descriptor still reaches c.
        assert_eq!(pool.desc(bi).next(), pool.addr(c));
    }

    #[test]
    fn reinit_invalidates_old_handles() {
        let mut pool = pool();
        let h = pool.allocate(0).unwrap();
        pool.init(BASE);
        assert_eq!(pool.resolve(h), Err(DmaError::StaleHandle));
    }
}

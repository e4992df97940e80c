//! Ring reconciliation.
//!
//! Compares a ring's software chain against the chip's current-descriptor
//! register and decides whether the chip needs a correction. Divergence is
//! the normal case right after a submit or a completion, not an error.

use super::chain::Chain;
use super::pool::DescriptorPool;

/// Corrective action for a diverged ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fix {
    /// Chip is parked; point it at this descriptor address
    Jump(u32),
    /// Chip is somewhere the chain cannot reach; park it first
    FastAbort,
}

/// Reconciliation verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reconcile {
    /// Nothing queued
    Idle,
    /// Chip will reach the head on its own
    InSync,
    /// Chip needs a correction
    Correct(Fix),
}

/// Classify a ring given the chip's current descriptor address.
///
/// - at the head, one hop before it, or anywhere inside the chain: in sync
/// - parked on the ring's halt (or finishing a reaped descriptor that leads
///   there): jump to the head
/// - anything else: fast-abort
pub(crate) fn classify<const N: usize>(
    pool: &DescriptorPool<N>,
    chain: &Chain,
    halt_idx: usize,
    current: u32,
) -> Reconcile {
    let Some(head) = chain.head() else {
        return Reconcile::Idle;
    };
    let head_addr = pool.addr(head);
    if current == head_addr {
        return Reconcile::InSync;
    }

    let Some(cur) = pool.index_of(current) else {
        return Reconcile::Correct(Fix::FastAbort);
    };
    if cur == halt_idx {
        return Reconcile::Correct(Fix::Jump(head_addr));
    }

    let cur_desc = pool.desc(cur);
    if cur_desc.next() == head_addr || chain.contains(pool, cur) {
        return Reconcile::InSync;
    }

    if !DescriptorPool::<N>::is_halt(cur)
        && cur_desc.is_complete()
        && cur_desc.next() == pool.addr(halt_idx)
    {
        return Reconcile::Correct(Fix::Jump(head_addr));
    }

    Reconcile::Correct(Fix::FastAbort)
}

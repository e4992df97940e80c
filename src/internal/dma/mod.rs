//! DMA descriptor management
//!
//! All memory is statically allocated using const generics.
//!
//! # Architecture
//!
//! - [`descriptor`]: the 16-byte hardware descriptor and its bit fields
//! - [`pool`]: index-addressed arena with halt anchors and a FIFO free list
//! - [`chain`]: per-ring `head -> ... -> tail -> halt` bookkeeping
//! - [`fire`]: reconciliation of a chain against the chip's position

pub(crate) mod chain;
pub(crate) mod descriptor;
pub(crate) mod fire;
pub(crate) mod pool;

pub(crate) use chain::Chain;
pub(crate) use fire::{Fix, Reconcile, classify};
pub(crate) use pool::{DescHandle, DescriptorPool, halt_index};

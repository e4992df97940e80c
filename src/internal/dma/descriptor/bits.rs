//! Descriptor bit field constants.
//!
//! Layout of the 16-byte PCM controller descriptor: a control word written by
//! software, a next-descriptor bus address, a buffer bus address and a status
//! word written back by the chip on completion.

#![allow(dead_code)]

// =============================================================================
// Control word (software -> chip)
// =============================================================================

/// Descriptor control word bit field constants
pub mod control {
    /// Buffer length mask (13 bits)
    pub const LEN_MASK: u32 = 0x1FFF;
    /// Raise a vector in the channel's interrupt queue on completion
    pub const HI: u32 = 1 << 29;
    /// Hold - the chip parks on this descriptor instead of following `next`
    pub const HOLD: u32 = 1 << 30;
    /// Frame end - on tx, close the HDLC frame after this buffer
    pub const FE: u32 = 1 << 31;
}

// =============================================================================
// Status word (chip -> software)
// =============================================================================

/// Descriptor status word bit field constants
pub mod status {
    /// Transferred byte count mask (13 bits)
    pub const COUNT_MASK: u32 = 0x1FFF;
    /// Received frame failed its CRC
    pub const CRC: u32 = 1 << 16;
    /// Frame aborted (seven or more ones on the line)
    pub const ABORT: u32 = 1 << 17;
    /// Receive overrun or transmit underrun, depending on direction
    pub const OVERRUN_UNDERRUN: u32 = 1 << 18;
    /// Frame shorter than the minimum
    pub const SHORT: u32 = 1 << 19;
    /// Frame longer than the buffer
    pub const LONG: u32 = 1 << 20;
    /// Non-octet-aligned frame
    pub const UNFIT: u32 = 1 << 21;
    /// Frame continues in the next descriptor
    pub const SPLIT: u32 = 1 << 22;
    /// DMA fetch or store failed
    pub const BUS_ERROR: u32 = 1 << 23;
    /// Descriptor closed a frame
    pub const FRAME_END: u32 = 1 << 29;
    /// Descriptor has been consumed by the chip
    pub const COMPLETE: u32 = 1 << 30;

    /// All error bits the chip can report in a completed descriptor
    pub const ALL_ERRORS: u32 =
        CRC | ABORT | OVERRUN_UNDERRUN | SHORT | LONG | UNFIT | SPLIT | BUS_ERROR;
}

//! Controller, channel and interface configuration.

use bitflags::bitflags;

use crate::driver::error::{ConfigError, ConfigResult};
use crate::hal::framer::IdleCodes;
use crate::hal::poll::PollTimeout;
use crate::internal::constants::{
    ACTION_TIMEOUT_FRAMES, AIS_PERSIST_POLLS, CAS_ALARM_CODE, CAS_IDLE_CODE, DATA_ALARM_CODE,
    DATA_IDLE_CODE, DEFAULT_PAUSE_FRAMES, NUM_INTERFACES,
};

// =============================================================================
// Channel configuration
// =============================================================================

/// Channel framing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelMode {
    /// HDLC frames with flag delimiting and CRC
    #[default]
    Hdlc,
    /// Raw bit stream, buffers map directly onto timeslot octets
    Transparent,
}

/// Per-channel configuration loaded with the channel specification word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Framing mode
    pub mode: ChannelMode,
    /// Use CRC-32 instead of CRC-16 (HDLC only)
    pub crc32: bool,
    /// Invert the data bits on the line
    pub invert: bool,
    /// Fill mask used when a timeslot assignment does not give one
    pub fill_mask: u8,
}

impl ChannelConfig {
    const SPEC_TRANSPARENT: u32 = 1 << 0;
    const SPEC_CRC32: u32 = 1 << 1;
    const SPEC_INVERT: u32 = 1 << 2;

    /// HDLC with CRC-16, full 8-bit timeslots
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: ChannelMode::Hdlc,
            crc32: false,
            invert: false,
            fill_mask: 0xFF,
        }
    }

    /// Set the framing mode
    #[must_use]
    pub const fn with_mode(mut self, mode: ChannelMode) -> Self {
        self.mode = mode;
        self
    }

    /// Select CRC-32
    #[must_use]
    pub const fn with_crc32(mut self, enabled: bool) -> Self {
        self.crc32 = enabled;
        self
    }

    /// Invert line data
    #[must_use]
    pub const fn with_invert(mut self, enabled: bool) -> Self {
        self.invert = enabled;
        self
    }

    /// Set the default fill mask (0 is rejected by `validate`)
    #[must_use]
    pub const fn with_fill_mask(mut self, mask: u8) -> Self {
        self.fill_mask = mask;
        self
    }

    /// Check internal consistency.
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.fill_mask == 0 {
            return Err(ConfigError::InvalidCommand);
        }
        if self.crc32 && matches!(self.mode, ChannelMode::Transparent) {
            return Err(ConfigError::InvalidCommand);
        }
        Ok(())
    }

    /// Channel specification word as loaded by a config action.
    #[must_use]
    pub const fn spec_word(&self) -> u32 {
        let mut word = 0;
        if matches!(self.mode, ChannelMode::Transparent) {
            word |= Self::SPEC_TRANSPARENT;
        }
        if self.crc32 {
            word |= Self::SPEC_CRC32;
        }
        if self.invert {
            word |= Self::SPEC_INVERT;
        }
        word
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Interface configuration
// =============================================================================

bitflags! {
    /// E1 interface configuration bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InterfaceConfig: u32 {
        /// Interface is in service
        const ENABLED = 1 << 0;
        /// No framing: all 32 timeslots carry data
        const UNFRAMED = 1 << 1;
        /// CRC-4 multiframe
        const CRC4 = 1 << 2;
        /// Channel-associated signalling in timeslot 16
        const CAS = 1 << 3;
        /// Transmit AIS automatically while receive loss persists
        const AUTO_AIS = 1 << 4;
        /// Force AIS on transmit
        const TX_AIS = 1 << 5;
        /// Drive remote alarms from `TX_RA`/`TX_RMA` instead of receive state
        const MANUAL_RA = 1 << 6;
        /// Manual remote alarm
        const TX_RA = 1 << 7;
        /// Manual remote multiframe alarm
        const TX_RMA = 1 << 8;
        /// Local loopback
        const LOOPBACK = 1 << 9;
        /// High receiver gain (long haul)
        const HIGH_GAIN = 1 << 10;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InterfaceConfig {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "InterfaceConfig({=u32:#x})", self.bits());
    }
}

impl InterfaceConfig {
    /// Reject contradictory bit combinations.
    pub fn validate(self) -> ConfigResult<()> {
        if self.contains(Self::UNFRAMED) && self.intersects(Self::CRC4 | Self::CAS) {
            return Err(ConfigError::InvalidInterfaceConfig);
        }
        if self.intersects(Self::TX_RA | Self::TX_RMA) && !self.contains(Self::MANUAL_RA) {
            return Err(ConfigError::InvalidInterfaceConfig);
        }
        if self.contains(Self::TX_RMA) && !self.contains(Self::CAS) {
            return Err(ConfigError::InvalidInterfaceConfig);
        }
        Ok(())
    }

    /// Framing mode these bits select
    #[must_use]
    pub fn framing(self) -> Framing {
        if self.contains(Self::UNFRAMED) {
            Framing::Unframed
        } else if self.contains(Self::CAS) {
            Framing::FramedCas
        } else {
            Framing::Framed
        }
    }
}

/// Interface framing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Framing {
    /// Unframed 2048 kbit/s
    Unframed,
    /// G.704 framing, timeslot 0 reserved
    Framed,
    /// G.704 framing with CAS in timeslot 16
    FramedCas,
}

// =============================================================================
// Controller configuration
// =============================================================================

/// Controller configuration
///
/// # Example
///
/// ```ignore
/// let config = ControllerConfig::new()
///     .with_descriptor_base(0x4000_0000)
///     .with_pause_frames(4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Bus address of the descriptor pool as seen by the chip
    pub descriptor_base: u32,
    /// Hardware timeout armed for every action, in frames
    pub action_timeout_frames: u32,
    /// Pause inserted after aborts, in frames
    pub pause_frames: u16,
    /// Substitution codes
    pub idle_codes: IdleCodes,
    /// Consecutive loss polls before auto-AIS engages
    pub ais_persist_polls: u8,
    /// Suggested status poll period for the caller's timer, in milliseconds
    pub status_poll_interval_ms: u32,
    /// Chip reset polling budget
    pub reset_timeout: PollTimeout,
}

impl ControllerConfig {
    /// Create a configuration with default values
    #[must_use]
    pub const fn new() -> Self {
        Self {
            descriptor_base: 0,
            action_timeout_frames: ACTION_TIMEOUT_FRAMES,
            pause_frames: DEFAULT_PAUSE_FRAMES,
            idle_codes: IdleCodes {
                data_idle: DATA_IDLE_CODE,
                data_alarm: DATA_ALARM_CODE,
                cas_idle: CAS_IDLE_CODE,
                cas_alarm: CAS_ALARM_CODE,
            },
            ais_persist_polls: AIS_PERSIST_POLLS,
            status_poll_interval_ms: 100,
            reset_timeout: PollTimeout::reset(),
        }
    }

    /// Set the descriptor pool bus address (must be 16-byte aligned)
    #[must_use]
    pub const fn with_descriptor_base(mut self, base: u32) -> Self {
        self.descriptor_base = base;
        self
    }

    /// Set the action timeout in frames
    #[must_use]
    pub const fn with_action_timeout_frames(mut self, frames: u32) -> Self {
        self.action_timeout_frames = frames;
        self
    }

    /// Set the post-abort pause in frames
    #[must_use]
    pub const fn with_pause_frames(mut self, frames: u16) -> Self {
        self.pause_frames = frames;
        self
    }

    /// Set the substitution codes
    #[must_use]
    pub const fn with_idle_codes(mut self, codes: IdleCodes) -> Self {
        self.idle_codes = codes;
        self
    }

    /// Set how many consecutive loss polls engage auto-AIS
    #[must_use]
    pub const fn with_ais_persist_polls(mut self, polls: u8) -> Self {
        self.ais_persist_polls = polls;
        self
    }

    /// Set the suggested status poll period
    #[must_use]
    pub const fn with_status_poll_interval_ms(mut self, ms: u32) -> Self {
        self.status_poll_interval_ms = ms;
        self
    }

    /// Set the chip reset polling budget
    #[must_use]
    pub const fn with_reset_timeout(mut self, timeout: PollTimeout) -> Self {
        self.reset_timeout = timeout;
        self
    }

    /// Check the configuration before use.
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.descriptor_base % 16 != 0 {
            return Err(ConfigError::MisalignedDescriptorBase);
        }
        if self.action_timeout_frames == 0 || self.pause_frames == 0 || self.ais_persist_polls == 0
        {
            return Err(ConfigError::InvalidTiming);
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Constructed, chip not yet reset
    #[default]
    Uninitialized,
    /// Chip reset, rings anchored, accepting requests
    Running,
    /// Stopped; every request was force-completed
    Stopped,
}

/// Check an interface number.
pub(crate) const fn check_interface(interface: u8) -> ConfigResult<usize> {
    if (interface as usize) < NUM_INTERFACES {
        Ok(interface as usize)
    } else {
        Err(ConfigError::InvalidInterface)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

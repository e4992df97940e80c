//! Caller-visible requests.
//!
//! A [`UserRequest`] names a command bit set, a channel and a payload. The
//! controller copies it into an internal slot on submit and hands it back,
//! with `error` and `transferred` filled in, exactly once on completion.

use bitflags::bitflags;

use crate::driver::config::ChannelConfig;
use crate::driver::error::{ConfigError, ConfigResult, DmaError, Error, ErrorBits};
use crate::hal::pcm::Direction;
use crate::internal::constants::{MAX_BUFFER_LEN, NUM_CHANNELS};

bitflags! {
    /// Request command bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Command: u16 {
        /// Start the receive side
        const START_RX = 1 << 0;
        /// Start the transmit side
        const START_TX = 1 << 1;
        /// Stop the receive side
        const STOP_RX = 1 << 2;
        /// Stop the transmit side
        const STOP_TX = 1 << 3;
        /// Queue a receive buffer
        const RX_DATA = 1 << 4;
        /// Queue a transmit buffer
        const TX_DATA = 1 << 5;
        /// Replace the channel configuration
        const CONFIGURE = 1 << 6;
        /// Assign the channel's timeslots
        const TIMESLOTS = 1 << 7;

        /// Start or stop bits
        const RUN_CONTROL = Self::START_RX.bits()
            | Self::START_TX.bits()
            | Self::STOP_RX.bits()
            | Self::STOP_TX.bits();
        /// Data transfer bits
        const DATA = Self::RX_DATA.bits() | Self::TX_DATA.bits();
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "Command({=u16:#x})", self.bits());
    }
}

/// Per-command payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Payload {
    /// No payload (start/stop)
    #[default]
    None,
    /// DMA buffer for `RX_DATA`/`TX_DATA`
    Buffer {
        /// Bus address of the buffer
        addr: u32,
        /// Length in bytes
        len: u16,
    },
    /// Channel configuration for `CONFIGURE`
    Config(ChannelConfig),
    /// Timeslot claim for `TIMESLOTS`
    Timeslots {
        /// Timeslots owned by the channel after this request
        mask: u32,
        /// Receive fill mask (0 uses the channel default)
        rx_fill: u8,
        /// Transmit fill mask (0 uses the channel default)
        tx_fill: u8,
    },
}

/// Caller-visible command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UserRequest {
    /// Command bits
    pub command: Command,
    /// Target channel
    pub channel: u8,
    /// Payload
    pub payload: Payload,
    /// Outcome; empty means success
    pub error: ErrorBits,
    /// Bytes moved by a data request
    pub transferred: u16,
    /// Opaque caller cookie
    pub tag: u32,
}

impl UserRequest {
    /// Create a request with no payload
    #[must_use]
    pub const fn new(command: Command, channel: u8) -> Self {
        Self {
            command,
            channel,
            payload: Payload::None,
            error: ErrorBits::empty(),
            transferred: 0,
            tag: 0,
        }
    }

    /// Queue a receive buffer
    #[must_use]
    pub const fn rx(channel: u8, addr: u32, len: u16) -> Self {
        Self::new(Command::RX_DATA, channel).with_payload(Payload::Buffer { addr, len })
    }

    /// Queue a transmit buffer
    #[must_use]
    pub const fn tx(channel: u8, addr: u32, len: u16) -> Self {
        Self::new(Command::TX_DATA, channel).with_payload(Payload::Buffer { addr, len })
    }

    /// Assign timeslots with the channel's default fill
    #[must_use]
    pub const fn timeslots(channel: u8, mask: u32) -> Self {
        Self::new(Command::TIMESLOTS, channel).with_payload(Payload::Timeslots {
            mask,
            rx_fill: 0,
            tx_fill: 0,
        })
    }

    /// Set the payload
    #[must_use]
    pub const fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Set the caller cookie
    #[must_use]
    pub const fn with_tag(mut self, tag: u32) -> Self {
        self.tag = tag;
        self
    }

    /// Whether the request completed without error
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_empty()
    }

    /// Direction of a data request
    pub(crate) fn data_direction(&self) -> Option<Direction> {
        if self.command.contains(Command::RX_DATA) {
            Some(Direction::Rx)
        } else if self.command.contains(Command::TX_DATA) {
            Some(Direction::Tx)
        } else {
            None
        }
    }

    /// Reject malformed requests.
    ///
    /// Data requests stand alone; every other bit may be combined, except
    /// starting and stopping the same side.
    pub(crate) fn validate(&self) -> core::result::Result<(), Error> {
        if (self.channel as usize) >= NUM_CHANNELS {
            return Err(ConfigError::InvalidChannel.into());
        }
        let cmd = self.command;
        if cmd.is_empty() || !Command::all().contains(cmd) {
            return Err(ConfigError::InvalidCommand.into());
        }
        if cmd.intersects(Command::DATA) {
            if cmd != Command::RX_DATA && cmd != Command::TX_DATA {
                return Err(ConfigError::InvalidCommand.into());
            }
            return match self.payload {
                Payload::Buffer { addr: 0, .. } => Err(DmaError::NullBuffer.into()),
                Payload::Buffer { len, .. } if len == 0 || len > MAX_BUFFER_LEN => {
                    Err(DmaError::InvalidLength.into())
                }
                Payload::Buffer { .. } => Ok(()),
                _ => Err(ConfigError::InvalidCommand.into()),
            };
        }
        if cmd.contains(Command::START_RX | Command::STOP_RX)
            || cmd.contains(Command::START_TX | Command::STOP_TX)
        {
            return Err(ConfigError::InvalidCommand.into());
        }
        if cmd.contains(Command::CONFIGURE) && cmd.contains(Command::TIMESLOTS) {
            return Err(ConfigError::InvalidCommand.into());
        }
        match self.payload {
            Payload::Config(config) if cmd.contains(Command::CONFIGURE) => {
                config.validate().map_err(Error::from)
            }
            Payload::Timeslots { .. } if cmd.contains(Command::TIMESLOTS) => Ok(()),
            Payload::None if !cmd.intersects(Command::CONFIGURE | Command::TIMESLOTS) => Ok(()),
            _ => Err(ConfigError::InvalidCommand.into()),
        }
    }

    /// Configuration carried by a `CONFIGURE` request
    pub(crate) fn config(&self) -> Option<ChannelConfig> {
        match self.payload {
            Payload::Config(c) => Some(c),
            _ => None,
        }
    }
}

/// Handle to a submitted request
///
/// Valid until the completion for that request is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestId {
    pub(crate) index: u16,
    pub(crate) generation: u16,
}

impl RequestId {
    /// Slot index (stable while the request is alive)
    #[must_use]
    pub const fn index(&self) -> u16 {
        self.index
    }
}

/// Submit failure: the request is handed back untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rejected {
    /// The request as submitted
    pub request: UserRequest,
    /// Why it was rejected
    pub error: Error,
}

/// Outcome of [`Controller::cancel`](crate::Controller::cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CancelOutcome {
    /// Removed; its completion (with `CANCELLED`) is queued
    Cancelled,
    /// The chip holds it; it completes on its own interrupt
    Deferred,
    /// Unknown or already completed
    NotFound,
}

/// Validate a timeslot fill mask pair against a channel default.
pub(crate) const fn resolve_fill(fill: u8, default: u8) -> u8 {
    if fill == 0 { default } else { fill }
}

/// Check a channel number.
pub(crate) const fn check_channel(channel: u8) -> ConfigResult<usize> {
    if (channel as usize) < NUM_CHANNELS {
        Ok(channel as usize)
    } else {
        Err(ConfigError::InvalidChannel)
    }
}

//! Error types for the E1/HDLC controller core
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Malformed requests and invalid configuration
//! - [`DmaError`]: Descriptor/request pool exhaustion and DMA bus faults
//! - [`IoError`]: Runtime state and timing failures
//! - [`ActionError`]: A primitive chip action failed or timed out
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most controller methods. Per-request outcomes are reported through
//! [`ErrorBits`] on the completed [`UserRequest`](crate::UserRequest).

use bitflags::bitflags;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and request validation errors
///
/// These are the only reasons a submitted request is rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Controller already started
    AlreadyStarted,
    /// Channel number out of range (must be 0-31)
    InvalidChannel,
    /// Interface number out of range
    InvalidInterface,
    /// Command bits are empty, contradictory, or mismatch the payload
    InvalidCommand,
    /// Interface configuration bits are inconsistent
    InvalidInterfaceConfig,
    /// Timeslot mask conflicts with another claim
    InvalidTimeslots,
    /// Cross-matrix entry references a source that does not exist
    InvalidCrossConnect,
    /// Descriptor bus base is not 16-byte aligned
    MisalignedDescriptorBase,
    /// A timing parameter (timeout, pause or persistence count) is zero
    InvalidTiming,
    /// Chip reset did not complete in time
    ResetFailed,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::AlreadyStarted => "controller already started",
            ConfigError::InvalidChannel => "invalid channel",
            ConfigError::InvalidInterface => "invalid interface",
            ConfigError::InvalidCommand => "invalid command",
            ConfigError::InvalidInterfaceConfig => "invalid interface configuration",
            ConfigError::InvalidTimeslots => "invalid timeslot mask",
            ConfigError::InvalidCrossConnect => "invalid cross-connect entry",
            ConfigError::MisalignedDescriptorBase => "misaligned descriptor base",
            ConfigError::InvalidTiming => "invalid timing parameter",
            ConfigError::ResetFailed => "chip reset failed",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// DMA descriptor and request pool errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Descriptor pool exhausted
    NoDescriptorsAvailable,
    /// Request pool exhausted
    NoRequestsAvailable,
    /// Buffer length is zero or exceeds a descriptor
    InvalidLength,
    /// Buffer address is null
    NullBuffer,
    /// Handle refers to a slot that has since been reused
    StaleHandle,
    /// Chip could not fetch or store through DMA
    BusError,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::NoDescriptorsAvailable => "no descriptors available",
            DmaError::NoRequestsAvailable => "no requests available",
            DmaError::InvalidLength => "invalid buffer length",
            DmaError::NullBuffer => "null buffer address",
            DmaError::StaleHandle => "stale handle",
            DmaError::BusError => "DMA bus error",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime state errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Operation timed out
    Timeout,
    /// Invalid state for operation (e.g., controller not started)
    InvalidState,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Timeout => "operation timed out",
            IoError::InvalidState => "invalid state for operation",
        }
    }
}

// =============================================================================
// Action Errors
// =============================================================================

/// Outcome of a primitive action that did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActionError {
    /// Chip reported the action as failed
    Failed,
    /// No action acknowledgement before the hardware timer expired
    Timeout,
}

impl core::fmt::Display for ActionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ActionError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActionError::Failed => "action failed",
            ActionError::Timeout => "action timed out",
        }
    }

    /// Request status bit carried by a request aborted with this error
    #[must_use]
    pub const fn status_bit(self) -> ErrorBits {
        match self {
            ActionError::Failed => ErrorBits::ACTION_FAIL,
            ActionError::Timeout => ErrorBits::ACTION_TIMEOUT,
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Config(ConfigError::InvalidChannel)) => { /* ... */ }
///     Err(Error::Dma(DmaError::NoRequestsAvailable)) => { /* retry later */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// DMA error
    Dma(DmaError),
    /// I/O error
    Io(IoError),
    /// Action error
    Action(ActionError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
            Error::Action(e) => write!(f, "action: {}", e.as_str()),
        }
    }
}

impl Error {
    /// Whether the caller may simply retry later
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Dma(DmaError::NoDescriptorsAvailable | DmaError::NoRequestsAvailable)
                | Error::Action(_)
        )
    }
}

// From impls for automatic conversion
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

impl From<ActionError> for Error {
    fn from(e: ActionError) -> Self {
        Error::Action(e)
    }
}

/// Result type alias for controller operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Per-request and notification error bits
// =============================================================================

bitflags! {
    /// Error bits reported on a completed request and through `on_error`.
    ///
    /// An empty set on a completed request means success.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ErrorBits: u32 {
        /// No descriptor or request could be allocated
        const ALLOC = 1 << 0;
        /// DMA fetch/store failed
        const BUS = 1 << 1;
        /// Received frame failed its CRC
        const CRC = 1 << 2;
        /// Frame aborted on the line
        const ABORT = 1 << 3;
        /// Receive overrun
        const OVERRUN = 1 << 4;
        /// Transmit underrun
        const UNDERRUN = 1 << 5;
        /// Frame shorter than the minimum
        const SHORT = 1 << 6;
        /// Frame longer than the buffer or maximum
        const LONG = 1 << 7;
        /// Frame continued into the next buffer
        const SPLIT = 1 << 8;
        /// Frame is not a whole number of octets
        const UNFIT = 1 << 9;
        /// Action reported failure
        const ACTION_FAIL = 1 << 10;
        /// Action timed out
        const ACTION_TIMEOUT = 1 << 11;
        /// Request was cancelled
        const CANCELLED = 1 << 12;
        /// Hardware interrupt queue wrapped before it was drained
        const IQ_OVERFLOW = 1 << 13;
        /// Signalling FIFO dropped bytes
        const FIFO_OVERFLOW = 1 << 14;

        /// Errors that originate on the line rather than in the driver
        const PROTOCOL = Self::CRC.bits()
            | Self::ABORT.bits()
            | Self::OVERRUN.bits()
            | Self::UNDERRUN.bits()
            | Self::SHORT.bits()
            | Self::LONG.bits()
            | Self::SPLIT.bits()
            | Self::UNFIT.bits();
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ErrorBits {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "ErrorBits({=u32:#x})", self.bits());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

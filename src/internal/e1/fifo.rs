//! Signalling byte FIFO with an edge-triggered fill level.

use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::{DEFAULT_FIFO_TRIGGER, FIFO_SIZE};

/// Circular byte buffer for CAS/FAS signalling
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fifo {
    buf: [u8; FIFO_SIZE],
    head: usize,
    len: usize,
    trigger: usize,
    armed: bool,
    dropped: u32,
}

/// Result of feeding bytes into a FIFO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Fill {
    /// Fill level crossed the trigger on this push
    pub triggered: bool,
    /// Bytes that did not fit
    pub dropped: usize,
}

#[allow(dead_code)]
impl Fifo {
    pub const fn new() -> Self {
        Self {
            buf: [0; FIFO_SIZE],
            head: 0,
            len: 0,
            trigger: DEFAULT_FIFO_TRIGGER,
            armed: true,
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn trigger(&self) -> usize {
        self.trigger
    }

    /// Total bytes dropped since the last clear
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Set the trigger level (1 to capacity).
    pub fn set_trigger(&mut self, level: usize) -> ConfigResult<()> {
        if level == 0 || level > FIFO_SIZE {
            return Err(ConfigError::InvalidCommand);
        }
        self.trigger = level;
        self.armed = self.len < level;
        Ok(())
    }

    /// Append bytes; the newest bytes are dropped when full.
    pub fn push(&mut self, bytes: &[u8]) -> Fill {
        let mut fill = Fill::default();
        for &b in bytes {
            if self.len == FIFO_SIZE {
                fill.dropped += 1;
                continue;
            }
            let tail = (self.head + self.len) % FIFO_SIZE;
            self.buf[tail] = b;
            self.len += 1;
        }
        self.dropped += fill.dropped as u32;
        if self.armed && self.len >= self.trigger {
            self.armed = false;
            fill.triggered = true;
        }
        fill
    }

    /// Move queued bytes into `out`, oldest first.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.len);
        for slot in out.iter_mut().take(n) {
            *slot = self.buf[self.head];
            self.head = (self.head + 1) % FIFO_SIZE;
        }
        self.len -= n;
        if self.len < self.trigger {
            self.armed = true;
        }
        n
    }

    /// Drop contents and re-arm, keeping the trigger level.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.armed = true;
        self.dropped = 0;
    }
}

impl Default for Fifo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_read_round_trip() {
        let mut fifo = Fifo::new();
        fifo.push(&[1, 2, 3]);
        let mut out = [0u8; 8];
        assert_eq!(fifo.read(&mut out), 3);
        assert_eq!(&out[..3], &[1, 2, 3]);
        assert!(fifo.is_empty());
    }

    #[test]
    fn trigger_fires_once_per_crossing() {
        let mut fifo = Fifo::new();
        fifo.set_trigger(4).unwrap();
        assert!(!fifo.push(&[0; 3]).triggered);
        assert!(fifo.push(&[0; 1]).triggered);
        assert!(!fifo.push(&[0; 2]).triggered);

        let mut out = [0u8; 6];
        fifo.read(&mut out);
        assert!(fifo.push(&[0; 4]).triggered);
    }

    #[test]
    fn overflow_drops_newest() {
        let mut fifo = Fifo::new();
        let data = [7u8; FIFO_SIZE + 5];
        let fill = fifo.push(&data);
        assert_eq!(fill.dropped, 5);
        assert_eq!(fifo.len(), FIFO_SIZE);
        assert_eq!(fifo.dropped(), 5);
    }

    #[test]
    fn wraps_across_end() {
        let mut fifo = Fifo::new();
        let mut out = [0u8; FIFO_SIZE];
        fifo.push(&[0; FIFO_SIZE - 2]);
        fifo.read(&mut out[..FIFO_SIZE - 2]);
        fifo.push(&[1, 2, 3, 4]);
        assert_eq!(fifo.read(&mut out), 4);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn clear_resets_contents_not_trigger() {
        let mut fifo = Fifo::new();
        fifo.set_trigger(2).unwrap();
        fifo.push(&[1, 2, 3]);
        fifo.clear();
        assert!(fifo.is_empty());
        assert_eq!(fifo.trigger(), 2);
        assert!(fifo.push(&[1, 2]).triggered);
    }

    #[test]
    fn trigger_level_bounds() {
        let mut fifo = Fifo::new();
        assert!(fifo.set_trigger(0).is_err());
        assert!(fifo.set_trigger(FIFO_SIZE + 1).is_err());
        assert!(fifo.set_trigger(FIFO_SIZE).is_ok());
    }
}

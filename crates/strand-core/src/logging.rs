//! Logging facilities for Strand.
//!
//! Strand uses the `tracing` crate for instrumentation. To see logs, install
//! a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Payload bytes are logged at `trace` level through [`HexDump`], which
//! formats lazily so nothing is rendered unless the level is enabled.

use std::fmt;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem, e.g.
/// `RUST_LOG=strand_net::tcp::event_loop=trace`.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "strand_core::signal";
    /// TCP client facade target.
    pub const TCP_CLIENT: &str = "strand_net::tcp::client";
    /// TCP event loop target.
    pub const EVENT_LOOP: &str = "strand_net::tcp::event_loop";
}

/// Formats a byte slice as space-separated upper-case hex pairs.
///
/// ```
/// use strand_core::HexDump;
///
/// assert_eq!(HexDump(b"\x01\xab ").to_string(), "01 AB 20");
/// ```
#[derive(Clone, Copy)]
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0.iter();
        if let Some(first) = bytes.next() {
            write!(f, "{first:02X}")?;
            for byte in bytes {
                write!(f, " {byte:02X}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump_empty() {
        assert_eq!(HexDump(&[]).to_string(), "");
    }

    #[test]
    fn test_hex_dump_pads_single_digits() {
        assert_eq!(HexDump(&[0x00, 0x0f, 0xff]).to_string(), "00 0F FF");
    }

    #[test]
    fn test_hex_dump_debug_matches_display() {
        let data = b"ping";
        assert_eq!(format!("{:?}", HexDump(data)), "70 69 6E 67");
    }
}

//! Process-wide constants for the camera control server.
//!
//! # Usage
//!
//! ```
//! use camsync_core::constants::*;
//!
//! assert!(PORT_RANGE.contains(&DEFAULT_PORT));
//!
//! use std::time::Duration;
//! let poll = Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS);
//! assert_eq!(poll.as_secs(), 1);
//! ```

use std::ops::RangeInclusive;

// ============================================================================
// Transport
// ============================================================================

/// Default TCP port of the control endpoint.
pub const DEFAULT_PORT: u16 = 5555;

/// Ports the control endpoint may bind to. Anything else is rejected at startup.
pub const PORT_RANGE: RangeInclusive<u16> = 5000..=65535;

/// Default address the control endpoint binds to.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Upper bound on a single wait for the next request, in milliseconds.
///
/// Cancellation is observed once per wait, so this is also the worst-case
/// shutdown latency.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 1000;

/// Default maximum encoded size of one multipart message (64 KB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

// ============================================================================
// Reply fields
// ============================================================================

/// Result field of a reply that carries no value.
pub const REPLY_NONE: &str = "None";

/// Formatted boolean values.
pub const TRUE_TEXT: &str = "True";
pub const FALSE_TEXT: &str = "False";

// ============================================================================
// Devices
// ============================================================================

/// Frame buffers requested when a camera is opened.
pub const DEFAULT_FRAME_BUFFERS: u32 = 5;

/// Mode applied to every trigger line after a camera is opened.
pub const TRIGGER_LINE_OUTPUT_MODE: &str = "Output";

// ============================================================================
// Signal output
// ============================================================================

/// Digital-output port carrying the synchronization bits.
pub const SIGNAL_PORT: u8 = 0;

/// Number of addressable bits on [`SIGNAL_PORT`].
pub const SIGNAL_PORT_BITS: u8 = 8;

/// Wire value of an unbound signal bit.
pub const UNBOUND_SIGNAL_BIT: i32 = -1;

/// Default digital-I/O unit (device minor number).
pub const DEFAULT_DIO_UNIT: u32 = 0;

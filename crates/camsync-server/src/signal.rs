//! Frame-synchronized digital output.
//!
//! Every session owns a [`SyncLine`]. The camera driver calls
//! [`SyncLine::on_frame`] from its acquisition thread; the control path binds
//! and resets the line from the handler loop. The two sides share only two
//! atomics:
//!
//! | field | callback | control path |
//! |-------|----------|--------------|
//! | bound bit | reads | writes |
//! | toggle level | flips | resets after capture stops |

use camsync_core::constants::{SIGNAL_PORT, UNBOUND_SIGNAL_BIT};
use camsync_hardware::mock::MockDigitalOutput;
use camsync_hardware::{AnyDigitalOutput, DigitalOutput};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use tracing::{error, info, warn};

/// Output bit driven by one camera's frames.
#[derive(Debug)]
pub struct SyncLine {
    signal: Option<Arc<AnyDigitalOutput>>,
    bound_bit: AtomicI32,
    level: AtomicBool,
}

impl SyncLine {
    /// Create an unbound line. With no `signal` the toggle is still tracked
    /// but nothing is written.
    pub fn new(signal: Option<Arc<AnyDigitalOutput>>) -> Self {
        Self {
            signal,
            bound_bit: AtomicI32::new(UNBOUND_SIGNAL_BIT),
            level: AtomicBool::new(false),
        }
    }

    /// Bind to a bit of the signal port, or unbind with `None`.
    pub fn bind(&self, bit: Option<u8>) {
        let raw = bit.map_or(UNBOUND_SIGNAL_BIT, i32::from);
        self.bound_bit.store(raw, Ordering::Release);
    }

    pub fn bound_bit(&self) -> Option<u8> {
        u8::try_from(self.bound_bit.load(Ordering::Acquire)).ok()
    }

    /// Bound bit in its wire form, `-1` when unbound.
    pub fn raw_bound_bit(&self) -> i32 {
        self.bound_bit.load(Ordering::Acquire)
    }

    /// Last level written by the frame callback.
    pub fn level(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }

    pub fn has_signal(&self) -> bool {
        self.signal.is_some()
    }

    /// Frame callback body.
    ///
    /// Runs on the driver's acquisition thread: atomics only, and a failed
    /// write is dropped.
    pub fn on_frame(&self) {
        let Some(bit) = self.bound_bit() else {
            return;
        };
        let high = !self.level.fetch_xor(true, Ordering::AcqRel);
        if let Some(signal) = &self.signal {
            let _ = signal.write_bit(SIGNAL_PORT, bit, high);
        }
    }

    /// Drive the bound bit low after capture stops.
    ///
    /// # Errors
    /// Returns the signal driver's error if the write fails; the level is
    /// reset either way.
    pub fn reset(&self) -> camsync_hardware::Result<()> {
        self.level.store(false, Ordering::Release);
        match (&self.signal, self.bound_bit()) {
            (Some(signal), Some(bit)) => signal.write_bit(SIGNAL_PORT, bit, false),
            _ => Ok(()),
        }
    }
}

/// Configure the signal port of an opened unit as outputs, all low.
///
/// Failures are logged; the unit is used regardless.
pub fn prepare_signal_output(dio: AnyDigitalOutput) -> Arc<AnyDigitalOutput> {
    if let Err(e) = dio.configure_port_output(SIGNAL_PORT) {
        warn!(unit = dio.name(), error = %e, "Failed to configure signal port as output");
    }
    if let Err(e) = dio.write_port(SIGNAL_PORT, 0) {
        warn!(unit = dio.name(), error = %e, "Failed to drive signal port low");
    }
    info!(unit = dio.name(), port = SIGNAL_PORT, "Signal output ready");
    Arc::new(dio)
}

/// Open the digital-I/O unit used for frame synchronization.
///
/// Returns `None`, after logging, when the unit cannot be opened; the server
/// then runs without signal synchronization.
pub fn open_signal_output(unit: u32) -> Option<Arc<AnyDigitalOutput>> {
    match MockDigitalOutput::open(unit) {
        Ok((dio, _)) => Some(prepare_signal_output(AnyDigitalOutput::Mock(dio))),
        Err(e) => {
            error!(unit, error = %e, "Failed to open digital I/O, signal synchronization disabled");
            None
        }
    }
}

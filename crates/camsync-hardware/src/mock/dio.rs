//! Simulated digital-I/O unit.
//!
//! Port values live in atomics so bit writes from a frame callback never
//! contend with the control path. A [`MockDigitalOutputHandle`] reads back
//! what was written.

use crate::error::{HardwareError, Result};
use crate::traits::DigitalOutput;
use camsync_core::Status;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use tracing::info;

/// Number of 8-bit ports on the simulated unit.
pub const MOCK_DIO_PORTS: u8 = 2;

/// Units `0..MOCK_DIO_UNITS` can be opened.
pub const MOCK_DIO_UNITS: u32 = 4;

const PORT_BITS: u8 = 8;

#[derive(Debug, Default)]
struct DioState {
    values: [AtomicU8; MOCK_DIO_PORTS as usize],
    outputs: [AtomicBool; MOCK_DIO_PORTS as usize],
    writes: AtomicU64,
    fail_writes: AtomicBool,
    closed: AtomicBool,
}

/// Simulated digital-I/O unit.
///
/// # Examples
///
/// ```
/// use camsync_hardware::mock::MockDigitalOutput;
/// use camsync_hardware::traits::DigitalOutput;
///
/// let (dio, handle) = MockDigitalOutput::open(0).unwrap();
/// dio.configure_port_output(0).unwrap();
/// dio.write_bit(0, 3, true).unwrap();
///
/// assert!(handle.bit(0, 3));
/// assert_eq!(handle.port_value(0), 0b0000_1000);
/// ```
#[derive(Debug)]
pub struct MockDigitalOutput {
    name: String,
    state: Arc<DioState>,
}

impl MockDigitalOutput {
    /// Open the unit with the given minor number.
    ///
    /// # Errors
    /// Returns `NotFound` for units at or beyond [`MOCK_DIO_UNITS`].
    pub fn open(unit: u32) -> Result<(Self, MockDigitalOutputHandle)> {
        if unit >= MOCK_DIO_UNITS {
            return Err(HardwareError::not_found(format!("dio unit {unit}")));
        }

        let state = Arc::new(DioState::default());
        let dio = Self {
            name: format!("Mock DIO unit {unit}"),
            state: Arc::clone(&state),
        };
        info!(unit, "Opened mock digital I/O");
        Ok((dio, MockDigitalOutputHandle { state }))
    }

    fn port_index(&self, port: u8) -> Result<usize> {
        if self.state.closed.load(Ordering::Acquire) {
            return Err(HardwareError::device_not_open(&self.name));
        }
        if port >= MOCK_DIO_PORTS {
            return Err(HardwareError::invalid_value("port", port));
        }
        Ok(usize::from(port))
    }

    fn check_writable(&self, index: usize) -> Result<()> {
        if self.state.fail_writes.load(Ordering::Relaxed) {
            return Err(HardwareError::driver(Status::IO.code(), "simulated write failure"));
        }
        if !self.state.outputs[index].load(Ordering::Acquire) {
            return Err(HardwareError::invalid_access(format!("port {index} is not an output")));
        }
        Ok(())
    }
}

impl DigitalOutput for MockDigitalOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure_port_output(&self, port: u8) -> Result<()> {
        let index = self.port_index(port)?;
        self.state.outputs[index].store(true, Ordering::Release);
        Ok(())
    }

    fn write_port(&self, port: u8, value: u8) -> Result<()> {
        let index = self.port_index(port)?;
        self.check_writable(index)?;
        self.state.values[index].store(value, Ordering::Release);
        self.state.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn write_bit(&self, port: u8, bit: u8, high: bool) -> Result<()> {
        let index = self.port_index(port)?;
        if bit >= PORT_BITS {
            return Err(HardwareError::invalid_value("bit", bit));
        }
        self.check_writable(index)?;

        let mask = 1u8 << bit;
        if high {
            self.state.values[index].fetch_or(mask, Ordering::AcqRel);
        } else {
            self.state.values[index].fetch_and(!mask, Ordering::AcqRel);
        }
        self.state.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if !self.state.closed.swap(true, Ordering::AcqRel) {
            info!(name = %self.name, "Closed mock digital I/O");
        }
        Ok(())
    }
}

/// Read-back handle for a [`MockDigitalOutput`].
#[derive(Debug, Clone)]
pub struct MockDigitalOutputHandle {
    state: Arc<DioState>,
}

impl MockDigitalOutputHandle {
    /// Current value of a port. Out-of-range ports read as zero.
    pub fn port_value(&self, port: u8) -> u8 {
        self.state
            .values
            .get(usize::from(port))
            .map_or(0, |value| value.load(Ordering::Acquire))
    }

    /// Current level of one bit.
    pub fn bit(&self, port: u8, bit: u8) -> bool {
        bit < PORT_BITS && self.port_value(port) & (1 << bit) != 0
    }

    pub fn is_output(&self, port: u8) -> bool {
        self.state
            .outputs
            .get(usize::from(port))
            .is_some_and(|output| output.load(Ordering::Acquire))
    }

    /// Number of successful writes.
    pub fn writes(&self) -> u64 {
        self.state.writes.load(Ordering::Relaxed)
    }

    /// Make every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }
}

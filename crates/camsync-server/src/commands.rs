//! Table-driven `get`/`set` dispatch.
//!
//! Each [`CommandCode`] maps to a [`CommandDescriptor`] holding typed accessor
//! functions on the camera. The table is built once by
//! [`CommandRegistry::standard`] and never modified.
//!
//! Value formatting on `get`:
//!
//! | kind | example |
//! |------|---------|
//! | string | `Mono8` |
//! | int | `450000000` |
//! | float | `5000.000000` |
//! | bool | `True` |
//! | pair | `1936 x 1216` |
//! | range | `[4000000, 450000000]` |

use crate::session::DeviceSession;
use camsync_core::Status;
use camsync_core::constants::{FALSE_TEXT, SIGNAL_PORT_BITS, TRUE_TEXT};
use camsync_hardware::{AnyCamera, CameraDevice, Dimensions, HardwareError, IntRange};
use camsync_protocol::CommandCode;
use std::collections::HashMap;
use thiserror::Error;

type Getter<T> = fn(&AnyCamera) -> camsync_hardware::Result<T>;
type Setter<T> = fn(&mut AnyCamera, T) -> camsync_hardware::Result<()>;
type StrSetter = fn(&mut AnyCamera, &str) -> camsync_hardware::Result<()>;

/// Value kind of a command, as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Int,
    Float,
    Bool,
    /// Two-field values and the session signal bit.
    Special,
}

/// Camera accessors for one command. A `None` setter makes the command
/// read-only.
#[derive(Debug, Clone, Copy)]
pub enum Accessor {
    Str {
        get: Getter<String>,
        set: Option<StrSetter>,
    },
    Int {
        get: Getter<i64>,
        set: Option<Setter<i64>>,
    },
    Float {
        get: Getter<f64>,
        set: Option<Setter<f64>>,
    },
    Bool {
        get: Getter<bool>,
        set: Option<Setter<bool>>,
    },
    Pair {
        get: Getter<Dimensions>,
        set: Option<Setter<Dimensions>>,
    },
    Range {
        get: Getter<IntRange>,
    },
    /// Handled on the session's sync line, not the camera.
    SignalBit,
}

/// One row of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub code: CommandCode,
    pub accessor: Accessor,
}

impl CommandDescriptor {
    pub fn kind(&self) -> ValueKind {
        match self.accessor {
            Accessor::Str { .. } => ValueKind::String,
            Accessor::Int { .. } => ValueKind::Int,
            Accessor::Float { .. } => ValueKind::Float,
            Accessor::Bool { .. } => ValueKind::Bool,
            Accessor::Pair { .. } | Accessor::Range { .. } | Accessor::SignalBit => {
                ValueKind::Special
            }
        }
    }

    pub fn is_settable(&self) -> bool {
        match self.accessor {
            Accessor::Str { set, .. } => set.is_some(),
            Accessor::Int { set, .. } => set.is_some(),
            Accessor::Float { set, .. } => set.is_some(),
            Accessor::Bool { set, .. } => set.is_some(),
            Accessor::Pair { set, .. } => set.is_some(),
            Accessor::Range { .. } => false,
            Accessor::SignalBit => true,
        }
    }
}

/// Errors produced by command dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Code is not numeric or not in the table.
    #[error("Unknown command code: {0}")]
    UnknownCommand(String),

    #[error("Command {0} cannot be set")]
    ReadOnly(CommandCode),

    #[error("Missing argument for command {0}")]
    MissingArgument(CommandCode),

    /// Argument does not parse as the command's value kind.
    #[error("Invalid argument for command {command}: {value:?}")]
    InvalidArgument { command: CommandCode, value: String },

    /// Signal bit beyond the width of the signal port.
    #[error("Signal bit {0} out of range")]
    SignalBitOutOfRange(i64),

    #[error(transparent)]
    Hardware(#[from] HardwareError),
}

impl DispatchError {
    /// Reply status for this error.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::UnknownCommand(_)
            | Self::ReadOnly(_)
            | Self::MissingArgument(_)
            | Self::InvalidArgument { .. } => Status::WRONG_TYPE,
            Self::SignalBitOutOfRange(_) => Status::BAD_PARAMETER,
            Self::Hardware(e) => e.status(),
        }
    }
}

type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Fixed table of device commands.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    descriptors: HashMap<CommandCode, CommandDescriptor>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command, replacing any previous entry for `code`.
    #[must_use]
    pub fn with(mut self, code: CommandCode, accessor: Accessor) -> Self {
        self.descriptors
            .insert(code, CommandDescriptor { code, accessor });
        self
    }

    /// The full camera command table.
    pub fn standard() -> Self {
        Self::new()
            .with(CommandCode::SignalBit, Accessor::SignalBit)
            .with(
                CommandCode::ImageFormat,
                Accessor::Str {
                    get: AnyCamera::image_format,
                    set: Some(AnyCamera::set_image_format),
                },
            )
            .with(
                CommandCode::SensorBitDepth,
                Accessor::Str {
                    get: AnyCamera::sensor_bit_depth,
                    set: Some(AnyCamera::set_sensor_bit_depth),
                },
            )
            .with(
                CommandCode::TriggerLine,
                Accessor::Str {
                    get: AnyCamera::trigger_line,
                    set: Some(AnyCamera::set_trigger_line),
                },
            )
            .with(
                CommandCode::TriggerLineSource,
                Accessor::Str {
                    get: AnyCamera::trigger_line_source,
                    set: Some(AnyCamera::set_trigger_line_source),
                },
            )
            .with(
                CommandCode::ExposureTime,
                Accessor::Float {
                    get: AnyCamera::exposure_time_us,
                    set: Some(AnyCamera::set_exposure_time_us),
                },
            )
            .with(
                CommandCode::AcquisitionFrameRate,
                Accessor::Float {
                    get: AnyCamera::frame_rate,
                    set: Some(AnyCamera::set_frame_rate),
                },
            )
            .with(
                CommandCode::AcquisitionFrameRateAuto,
                Accessor::Bool {
                    get: AnyCamera::frame_rate_auto,
                    set: Some(AnyCamera::set_frame_rate_auto),
                },
            )
            .with(
                CommandCode::ImageSize,
                Accessor::Pair {
                    get: AnyCamera::image_size,
                    set: Some(AnyCamera::set_image_size),
                },
            )
            .with(
                CommandCode::ImageOffset,
                Accessor::Pair {
                    get: AnyCamera::image_offset,
                    set: Some(AnyCamera::set_image_offset),
                },
            )
            .with(
                CommandCode::SensorSize,
                Accessor::Pair {
                    get: AnyCamera::sensor_size,
                    set: None,
                },
            )
            .with(
                CommandCode::ThroughputLimit,
                Accessor::Int {
                    get: AnyCamera::throughput_limit,
                    set: Some(AnyCamera::set_throughput_limit),
                },
            )
            .with(
                CommandCode::ThroughputLimitRange,
                Accessor::Range {
                    get: AnyCamera::throughput_limit_range,
                },
            )
    }

    pub fn descriptor(&self, code: CommandCode) -> Option<&CommandDescriptor> {
        self.descriptors.get(&code)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Look up the descriptor for a command code in its wire text.
    fn resolve(&self, command: &str) -> DispatchResult<&CommandDescriptor> {
        command
            .parse::<CommandCode>()
            .ok()
            .and_then(|code| self.descriptor(code))
            .ok_or_else(|| DispatchError::UnknownCommand(command.to_string()))
    }

    /// Read a value and format it for the reply.
    ///
    /// # Errors
    /// Returns `UnknownCommand` for codes outside the table and `Hardware`
    /// when the camera rejects the read.
    pub fn dispatch_get(&self, session: &DeviceSession, command: &str) -> DispatchResult<String> {
        let descriptor = self.resolve(command)?;
        let camera = session.camera();
        let text = match descriptor.accessor {
            Accessor::Str { get, .. } => get(camera)?,
            Accessor::Int { get, .. } => get(camera)?.to_string(),
            Accessor::Float { get, .. } => format_float(get(camera)?),
            Accessor::Bool { get, .. } => format_bool(get(camera)?).to_string(),
            Accessor::Pair { get, .. } => format_pair(get(camera)?),
            Accessor::Range { get } => format_range(get(camera)?),
            Accessor::SignalBit => session.sync().raw_bound_bit().to_string(),
        };
        Ok(text)
    }

    /// Parse `args` into the command's value kind and write it.
    ///
    /// # Errors
    /// Returns `UnknownCommand`, `ReadOnly`, `MissingArgument` or
    /// `InvalidArgument` for requests the table rejects,
    /// `SignalBitOutOfRange` for a bit the signal port does not have, and
    /// `Hardware` when the camera rejects the write.
    pub fn dispatch_set(
        &self,
        session: &mut DeviceSession,
        command: &str,
        args: &[String],
    ) -> DispatchResult<()> {
        let descriptor = self.resolve(command)?;
        let code = descriptor.code;
        let arg = |index: usize| {
            args.get(index)
                .map(String::as_str)
                .ok_or(DispatchError::MissingArgument(code))
        };

        match descriptor.accessor {
            Accessor::Str { set, .. } => {
                let set = set.ok_or(DispatchError::ReadOnly(code))?;
                set(session.camera_mut(), arg(0)?)?;
            }
            Accessor::Int { set, .. } => {
                let set = set.ok_or(DispatchError::ReadOnly(code))?;
                set(session.camera_mut(), parse_int(code, arg(0)?)?)?;
            }
            Accessor::Float { set, .. } => {
                let set = set.ok_or(DispatchError::ReadOnly(code))?;
                set(session.camera_mut(), parse_float(code, arg(0)?)?)?;
            }
            Accessor::Bool { set, .. } => {
                let set = set.ok_or(DispatchError::ReadOnly(code))?;
                set(session.camera_mut(), parse_bool(arg(0)?))?;
            }
            Accessor::Pair { set, .. } => {
                let set = set.ok_or(DispatchError::ReadOnly(code))?;
                let pair = Dimensions::new(parse_int(code, arg(0)?)?, parse_int(code, arg(1)?)?);
                set(session.camera_mut(), pair)?;
            }
            Accessor::Range { .. } => return Err(DispatchError::ReadOnly(code)),
            Accessor::SignalBit => {
                let bit = parse_int(code, arg(0)?)?;
                let bound = if bit < 0 {
                    None
                } else {
                    Some(
                        u8::try_from(bit)
                            .ok()
                            .filter(|&b| b < SIGNAL_PORT_BITS)
                            .ok_or(DispatchError::SignalBitOutOfRange(bit))?,
                    )
                };
                session.sync().bind(bound);
            }
        }
        Ok(())
    }
}

fn parse_int(command: CommandCode, text: &str) -> DispatchResult<i64> {
    text.trim()
        .parse()
        .map_err(|_| DispatchError::InvalidArgument {
            command,
            value: text.to_string(),
        })
}

fn parse_float(command: CommandCode, text: &str) -> DispatchResult<f64> {
    text.trim()
        .parse()
        .map_err(|_| DispatchError::InvalidArgument {
            command,
            value: text.to_string(),
        })
}

/// Only `true`, in any case, is truthy.
fn parse_bool(text: &str) -> bool {
    text.eq_ignore_ascii_case("true")
}

fn format_float(value: f64) -> String {
    format!("{value:.6}")
}

fn format_bool(value: bool) -> &'static str {
    if value { TRUE_TEXT } else { FALSE_TEXT }
}

fn format_pair(value: Dimensions) -> String {
    format!("{} x {}", value.width, value.height)
}

fn format_range(value: IntRange) -> String {
    format!("[{}, {}]", value.min, value.max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camsync_core::DeviceIdentity;
    use camsync_hardware::AnyCameraModule;
    use camsync_hardware::mock::MockCameraModule;
    use rstest::rstest;

    fn session() -> DeviceSession {
        let module =
            AnyCameraModule::Mock(MockCameraModule::new().with_camera(DeviceIdentity::new("camA")));
        DeviceSession::open(&module, DeviceIdentity::new("camA"), None, 5).unwrap()
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_standard_table_covers_every_code() {
        let registry = CommandRegistry::standard();
        assert_eq!(registry.len(), CommandCode::ALL.len());
        for code in CommandCode::ALL {
            assert_eq!(registry.descriptor(code).unwrap().code, code);
        }
    }

    #[rstest]
    #[case(CommandCode::ImageFormat, ValueKind::String, true)]
    #[case(CommandCode::ExposureTime, ValueKind::Float, true)]
    #[case(CommandCode::AcquisitionFrameRateAuto, ValueKind::Bool, true)]
    #[case(CommandCode::ThroughputLimit, ValueKind::Int, true)]
    #[case(CommandCode::SensorSize, ValueKind::Special, false)]
    #[case(CommandCode::ThroughputLimitRange, ValueKind::Special, false)]
    #[case(CommandCode::SignalBit, ValueKind::Special, true)]
    fn test_descriptor_kinds(
        #[case] code: CommandCode,
        #[case] kind: ValueKind,
        #[case] settable: bool,
    ) {
        let registry = CommandRegistry::standard();
        let descriptor = registry.descriptor(code).unwrap();
        assert_eq!(descriptor.kind(), kind);
        assert_eq!(descriptor.is_settable(), settable);
    }

    #[rstest]
    #[case("100", "Mono8")]
    #[case("101", "Bpp8")]
    #[case("102", "Line0")]
    #[case("103", "Off")]
    #[case("104", "10000.000000")]
    #[case("105", "30.000000")]
    #[case("106", "False")]
    #[case("200", "1936 x 1216")]
    #[case("201", "0 x 0")]
    #[case("202", "1936 x 1216")]
    #[case("300", "450000000")]
    #[case("301", "[4000000, 450000000]")]
    #[case("10", "-1")]
    fn test_get_formats_defaults(#[case] code: &str, #[case] expected: &str) {
        let registry = CommandRegistry::standard();
        assert_eq!(registry.dispatch_get(&session(), code).unwrap(), expected);
    }

    #[rstest]
    #[case("100", &["Mono12"], "Mono12")]
    #[case("101", &["Bpp12"], "Bpp12")]
    #[case("102", &["Line2"], "Line2")]
    #[case("104", &["5000.0"], "5000.000000")]
    #[case("104", &[" 250 "], "250.000000")]
    #[case("105", &["60"], "60.000000")]
    #[case("106", &["TRUE"], "True")]
    #[case("106", &["yes"], "False")]
    #[case("200", &["640", "480"], "640 x 480")]
    #[case("201", &["8", "16"], "8 x 16")]
    #[case("300", &["100000000"], "100000000")]
    #[case("10", &["3"], "3")]
    #[case("10", &["-5"], "-1")]
    fn test_set_then_get(#[case] code: &str, #[case] values: &[&str], #[case] expected: &str) {
        let registry = CommandRegistry::standard();
        let mut session = session();
        registry
            .dispatch_set(&mut session, code, &args(values))
            .unwrap();
        assert_eq!(registry.dispatch_get(&session, code).unwrap(), expected);
    }

    #[test]
    fn test_set_trigger_source_on_output_line() {
        let registry = CommandRegistry::standard();
        let mut session = session();
        registry
            .dispatch_set(&mut session, "103", &args(&["ExposureActive"]))
            .unwrap();
        assert_eq!(
            registry.dispatch_get(&session, "103").unwrap(),
            "ExposureActive"
        );
    }

    #[rstest]
    #[case("999", &["1"])]
    #[case("abc", &["1"])]
    #[case("", &["1"])]
    #[case("104", &["fast"])]
    #[case("300", &["1.5"])]
    #[case("200", &["640"])]
    #[case("202", &["1", "1"])]
    #[case("301", &["1"])]
    #[case("10", &["x"])]
    fn test_set_wrong_command(#[case] code: &str, #[case] values: &[&str]) {
        let registry = CommandRegistry::standard();
        let err = registry
            .dispatch_set(&mut session(), code, &args(values))
            .unwrap_err();
        assert_eq!(err.status(), Status::WRONG_TYPE);
    }

    #[rstest]
    #[case("999")]
    #[case("-1")]
    #[case("camA")]
    fn test_get_unknown_code(#[case] code: &str) {
        let registry = CommandRegistry::standard();
        let err = registry.dispatch_get(&session(), code).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownCommand(_)));
        assert_eq!(err.status(), Status::WRONG_TYPE);
    }

    #[rstest]
    #[case("8")]
    #[case("300")]
    fn test_signal_bit_out_of_range(#[case] bit: &str) {
        let registry = CommandRegistry::standard();
        let mut session = session();
        let err = registry
            .dispatch_set(&mut session, "10", &args(&[bit]))
            .unwrap_err();
        assert_eq!(err.status(), Status::BAD_PARAMETER);
        assert_eq!(session.sync().bound_bit(), None);
    }

    #[rstest]
    #[case("104", &["0.5"], Status::INVALID_VALUE)]
    #[case("100", &["RGB8"], Status::INVALID_VALUE)]
    #[case("300", &["1"], Status::INVALID_VALUE)]
    #[case("200", &["4000", "10"], Status::INVALID_VALUE)]
    fn test_driver_status_propagates(
        #[case] code: &str,
        #[case] values: &[&str],
        #[case] status: Status,
    ) {
        let registry = CommandRegistry::standard();
        let err = registry
            .dispatch_set(&mut session(), code, &args(values))
            .unwrap_err();
        assert_eq!(err.status(), status);
    }

    #[test]
    fn test_frame_rate_locked_while_auto() {
        let registry = CommandRegistry::standard();
        let mut session = session();
        registry
            .dispatch_set(&mut session, "106", &args(&["true"]))
            .unwrap();
        let err = registry
            .dispatch_set(&mut session, "105", &args(&["60"]))
            .unwrap_err();
        assert_eq!(err.status(), Status::INVALID_ACCESS);
    }

    #[test]
    fn test_closed_session_reports_not_open() {
        let registry = CommandRegistry::standard();
        let mut session = session();
        session.close().unwrap();
        let err = registry.dispatch_get(&session, "104").unwrap_err();
        assert_eq!(err.status(), Status::DEVICE_NOT_OPEN);
    }
}

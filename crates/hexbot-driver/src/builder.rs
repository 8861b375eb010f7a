//! Builder 模式实现
//!
//! 提供链式构造 [`Controller`] 的便捷方式。

use crate::controller::Controller;
use crate::error::DriverError;
use crate::ssc32::{SessionConfig, Ssc32};
use crate::state::RobotModel;
use hexbot_protocol::{BAUD_GREEN_RED_115200, GaitSequence};
use hexbot_serial::SerialAdapter;

/// Controller Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use hexbot_driver::{ControllerBuilder, SessionConfig};
///
/// // 默认波特率 115200
/// let ctl = ControllerBuilder::new()
///     .port("/dev/ttyUSB0")
///     .build()
///     .unwrap();
///
/// // 自定义波特率、初始速度和会话配置
/// let ctl = ControllerBuilder::new()
///     .port("/dev/ttyUSB0")
///     .baud_rate(38_400)
///     .speed(50)
///     .session_config(SessionConfig {
///         read_timeout_ms: 200,
///         ..SessionConfig::default()
///     })
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct ControllerBuilder {
    /// 串口路径（如 "/dev/ttyUSB0"、"COM3"）
    port: Option<String>,
    /// 波特率（9600 / 38400 / 115200，默认 115200）
    baud_rate: Option<u32>,
    session_config: Option<SessionConfig>,
    /// 初始水平速度百分比（默认 0）
    speed: Option<u8>,
    /// 行走方向预设基于的序列（默认 `GaitSequence::default()`）
    sequence: Option<GaitSequence>,
    /// 显式提供的适配器（优先于 `port`）
    adapter: Option<Box<dyn SerialAdapter>>,
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置串口路径
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// 设置波特率（可选，默认 115200）
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }

    /// 设置会话配置（可选）
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = Some(config);
        self
    }

    /// 设置初始速度（可选）
    pub fn speed(mut self, speed: u8) -> Self {
        self.speed = Some(speed);
        self
    }

    /// 设置序列模板（可选）
    pub fn sequence(mut self, sequence: GaitSequence) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// 使用指定的适配器代替真实串口（如 `MockSerialAdapter`）
    pub fn adapter(mut self, adapter: impl SerialAdapter + 'static) -> Self {
        self.adapter = Some(Box::new(adapter));
        self
    }

    /// 构建 Controller
    ///
    /// # Errors
    /// - `DriverError::InvalidInput`: 未指定串口，或没有可用的串口后端
    /// - `DriverError::Validation`: 初始速度或序列模板越界
    /// - `DriverError::Serial`: 串口打开失败
    pub fn build(self) -> Result<Controller, DriverError> {
        let model = RobotModel::new(self.speed.unwrap_or(0))?;
        let sequence = self.sequence.unwrap_or_default();
        sequence.validate()?;
        let config = self.session_config.unwrap_or_default();

        let session = match self.adapter {
            Some(adapter) => Ssc32::with_adapter(adapter, config),
            None => {
                let port = self.port.ok_or_else(|| {
                    DriverError::InvalidInput("no serial port configured".to_string())
                })?;
                Self::open_port(&port, self.baud_rate.unwrap_or(BAUD_GREEN_RED_115200), config)?
            },
        };
        tracing::info!("SSC-32 controller ready on {}", session.port_name());
        Ok(Controller::new(session, model, sequence))
    }

    #[cfg(feature = "hardware")]
    fn open_port(port: &str, baud_rate: u32, config: SessionConfig) -> Result<Ssc32, DriverError> {
        Ssc32::open(port, baud_rate, config)
    }

    #[cfg(not(feature = "hardware"))]
    fn open_port(port: &str, _baud_rate: u32, _config: SessionConfig) -> Result<Ssc32, DriverError> {
        Err(DriverError::InvalidInput(format!(
            "cannot open {}: built without the `hardware` feature",
            port
        )))
    }
}

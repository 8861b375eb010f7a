//! SSC-32 串口会话
//!
//! [`Ssc32`] 独占一个打开的串口，负责整行写入、带重试的应答读取，
//! 以及版本、运动状态、脉宽查询。会话是阻塞的单写者资源，
//! 不会发出重叠写入。

use crate::error::DriverError;
use crate::metrics::{MetricsSnapshot, SessionMetrics};
use hexbot_protocol::{
    FirmwareVersion, LINE_TERMINATOR, MovementStatus, Query, parse_pulse_width,
};
use hexbot_serial::{SerialAdapter, SerialError};
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

/// 会话配置
///
/// # Example
///
/// ```
/// use hexbot_driver::SessionConfig;
///
/// // 默认配置（100ms 读取超时，5 次读取重试）
/// let config = SessionConfig::default();
///
/// // 等待运动完成时最多容忍 3 次无法识别的应答
/// let config = SessionConfig {
///     max_unknown_polls: 3,
///     ..SessionConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// 单次读取超时（毫秒）
    pub read_timeout_ms: u64,
    /// 一次应答最多读取的次数
    pub read_attempts: u32,
    /// 两次读取之间的间隔（毫秒）
    pub read_retry_interval_ms: u64,
    /// 等待运动完成时的状态轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 等待运动完成时允许连续出现 Unknown 的次数
    pub max_unknown_polls: u32,
    /// 等待运动完成的总时限（毫秒）
    pub wait_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 100,
            read_attempts: 5,
            read_retry_interval_ms: 10,
            poll_interval_ms: 100,
            max_unknown_polls: 10,
            wait_timeout_ms: 30_000,
        }
    }
}

impl SessionConfig {
    fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// SSC-32 串口会话
pub struct Ssc32 {
    adapter: Box<dyn SerialAdapter>,
    config: SessionConfig,
    /// 首次成功查询后缓存
    version: Option<FirmwareVersion>,
    metrics: SessionMetrics,
}

impl Ssc32 {
    /// 打开真实串口
    #[cfg(feature = "hardware")]
    pub fn open(port: &str, baud_rate: u32, config: SessionConfig) -> Result<Self, DriverError> {
        if !hexbot_protocol::is_supported_baud_rate(baud_rate) {
            warn!(
                "Baud rate {} is not one of the SSC-32 jumper settings {:?}",
                baud_rate,
                hexbot_protocol::SUPPORTED_BAUD_RATES
            );
        }
        let adapter =
            hexbot_serial::SerialPortAdapter::open(port, baud_rate, config.read_timeout())?;
        Ok(Self::with_adapter(adapter, config))
    }

    /// 使用任意适配器创建会话（测试时传入 Mock）
    pub fn with_adapter(adapter: impl SerialAdapter + 'static, config: SessionConfig) -> Self {
        Self {
            adapter: Box::new(adapter),
            config,
            version: None,
            metrics: SessionMetrics::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.adapter.is_open()
    }

    pub fn port_name(&self) -> &str {
        self.adapter.name()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// 写入一行（自动补全行结束符），一次写入整行
    pub fn write_line(&mut self, line: &str) -> Result<(), DriverError> {
        if !self.adapter.is_open() {
            return Err(SerialError::NotOpen.into());
        }
        let mut line = line.to_string();
        if !line.ends_with(LINE_TERMINATOR) {
            line.push(LINE_TERMINATOR);
        }
        debug!("-> {:?}", line);
        match self.adapter.write_all(line.as_bytes()) {
            Ok(()) => {
                self.metrics.record_write(line.len());
                Ok(())
            },
            Err(e) => {
                SessionMetrics::bump(&self.metrics.write_errors);
                error!("Failed to write to {}: {}", self.adapter.name(), e);
                Err(e.into())
            },
        }
    }

    /// 读取一条应答
    ///
    /// 最多读取 `read_attempts` 次，每次间隔 `read_retry_interval_ms`。
    /// 全部超时返回 `Ok(None)`，其他串口错误直接返回。
    pub fn read_response(&mut self) -> Result<Option<String>, DriverError> {
        let timeout = self.config.read_timeout();
        let interval = Duration::from_millis(self.config.read_retry_interval_ms);
        for attempt in 1..=self.config.read_attempts {
            match self.adapter.read_available(timeout) {
                Ok(bytes) if !bytes.is_empty() => {
                    let response = String::from_utf8_lossy(&bytes).into_owned();
                    trace!("<- {:?} (attempt {})", response, attempt);
                    return Ok(Some(response));
                },
                Ok(_) | Err(SerialError::Timeout) => {},
                Err(e) => return Err(e.into()),
            }
            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
        SessionMetrics::bump(&self.metrics.read_timeouts);
        Ok(None)
    }

    /// 查询固件版本（首次成功后缓存）
    pub fn get_version(&mut self) -> Result<FirmwareVersion, DriverError> {
        if let Some(version) = &self.version {
            return Ok(version.clone());
        }
        self.write_line(&Query::Version.encode()?)?;
        let response = self.read_response()?.ok_or(DriverError::Timeout)?;
        let version = FirmwareVersion::parse(&response)?;
        debug!("Firmware version: {}", version);
        self.version = Some(version.clone());
        Ok(version)
    }

    /// 查询运动状态
    ///
    /// 超时或无法识别的应答记录错误日志并返回 [`MovementStatus::Unknown`]；
    /// 只有写入失败会返回错误。
    pub fn query_movement_status(&mut self) -> Result<MovementStatus, DriverError> {
        SessionMetrics::bump(&self.metrics.status_queries);
        let query = Query::MovementStatus;
        self.write_line(&query.encode()?)?;
        let status = match self.read_response()? {
            Some(response) => match MovementStatus::parse(&response) {
                Ok(status) => status,
                Err(e) => {
                    error!("Error while querying movement status ({}): {}", query.name(), e);
                    MovementStatus::Unknown
                },
            },
            None => {
                error!("Error while querying movement status ({}): no response", query.name());
                MovementStatus::Unknown
            },
        };
        if status == MovementStatus::Unknown {
            SessionMetrics::bump(&self.metrics.unknown_statuses);
        }
        Ok(status)
    }

    /// 查询通道当前脉宽（微秒）
    pub fn query_pulse_width(&mut self, channel: u8) -> Result<u16, DriverError> {
        let query = Query::PulseWidth { channel };
        self.write_line(&query.encode()?)?;
        match self.adapter.read_byte(self.config.read_timeout()) {
            Ok(byte) => Ok(parse_pulse_width(byte)),
            Err(SerialError::Timeout) => {
                warn!("No response to {} {}", query.name(), channel);
                SessionMetrics::bump(&self.metrics.read_timeouts);
                Err(DriverError::Timeout)
            },
            Err(e) => Err(e.into()),
        }
    }

    /// 阻塞直到当前运动完成
    ///
    /// - 收到 `Complete` 立即返回
    /// - 连续 `max_unknown_polls` 次 `Unknown` 后返回 `Unknown`
    /// - 超过 `wait_timeout_ms` 仍未完成返回 [`DriverError::Timeout`]
    pub fn wait_until_movement_complete(&mut self) -> Result<MovementStatus, DriverError> {
        let deadline = Instant::now() + Duration::from_millis(self.config.wait_timeout_ms);
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let mut unknown_polls = 0u32;

        loop {
            match self.query_movement_status()? {
                MovementStatus::Complete => return Ok(MovementStatus::Complete),
                MovementStatus::Unknown => {
                    unknown_polls += 1;
                    if unknown_polls >= self.config.max_unknown_polls {
                        warn!(
                            "Movement status unknown after {} consecutive polls, giving up",
                            unknown_polls
                        );
                        return Ok(MovementStatus::Unknown);
                    }
                },
                MovementStatus::InProgress => unknown_polls = 0,
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout);
            }
            std::thread::sleep(poll_interval);
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// 关闭串口
    pub fn close(&mut self) {
        if self.adapter.is_open() {
            debug!("Closing SSC-32 session on {}", self.adapter.name());
            self.adapter.close();
        }
    }
}

impl std::fmt::Debug for Ssc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ssc32")
            .field("port", &self.adapter.name())
            .field("open", &self.adapter.is_open())
            .field("config", &self.config)
            .field("version", &self.version)
            .finish()
    }
}

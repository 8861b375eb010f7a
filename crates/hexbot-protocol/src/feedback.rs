//! 查询指令与应答解析
//!
//! 控制板对查询只返回极短的 ASCII 应答（运动状态为单字符，脉宽为单字节），
//! 没有帧头和校验，因此解析只做去空白和精确匹配。

use crate::constants::*;
use crate::control::validate_channel;
use crate::{ProtocolError, ValidationError};

/// 查询指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// `VER`：固件版本
    Version,
    /// `Q`：运动状态
    MovementStatus,
    /// `QP {ch}`：指定通道的当前脉宽
    PulseWidth { channel: u8 },
}

impl Query {
    /// 编码为完整的查询行（含 `\r`）
    pub fn encode(&self) -> Result<String, ValidationError> {
        let body = match *self {
            Query::Version => QUERY_VERSION.to_string(),
            Query::MovementStatus => QUERY_MOVEMENT_STATUS.to_string(),
            Query::PulseWidth { channel } => {
                validate_channel(channel)?;
                format!("{} {}", QUERY_PULSE_WIDTH, channel)
            },
        };
        Ok(format!("{}{}", body, LINE_TERMINATOR))
    }

    /// 查询名称（用于错误信息）
    pub fn name(&self) -> &'static str {
        match self {
            Query::Version => QUERY_VERSION,
            Query::MovementStatus => QUERY_MOVEMENT_STATUS,
            Query::PulseWidth { .. } => QUERY_PULSE_WIDTH,
        }
    }
}

/// 运动状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementStatus {
    /// 运动已完成
    Complete,
    /// 运动进行中
    ///
    /// 控制板的 `.` 与 `+` 应答都表示完成，[`MovementStatus::parse`] 不会产生该值。
    /// 保留它是为了 API 完整，等待逻辑遇到它时按进行中继续轮询。
    InProgress,
    /// 无应答或应答无法识别
    Unknown,
}

impl MovementStatus {
    /// 解析 `Q` 的应答
    ///
    /// `.` 与 `+` 均视为完成；其他内容返回 [`ProtocolError`]，
    /// 由调用方决定映射为 [`MovementStatus::Unknown`]。
    pub fn parse(response: &str) -> Result<Self, ProtocolError> {
        let response = response.trim();
        match response {
            STATUS_COMPLETE | STATUS_COMPLETE_ALT => Ok(MovementStatus::Complete),
            "" => Err(ProtocolError::EmptyResponse {
                query: QUERY_MOVEMENT_STATUS,
            }),
            other => Err(ProtocolError::UnexpectedResponse {
                query: QUERY_MOVEMENT_STATUS,
                response: other.to_string(),
            }),
        }
    }
}

/// 解析 `QP` 的单字节应答，返回脉宽（微秒）
pub fn parse_pulse_width(byte: u8) -> u16 {
    u16::from(byte) * PULSE_WIDTH_RESPONSE_SCALE
}

/// 固件版本字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareVersion(String);

impl FirmwareVersion {
    /// 解析 `VER` 的应答
    pub fn parse(response: &str) -> Result<Self, ProtocolError> {
        let version = response.trim();
        if version.is_empty() {
            return Err(ProtocolError::EmptyResponse {
                query: QUERY_VERSION,
            });
        }
        Ok(FirmwareVersion(version.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

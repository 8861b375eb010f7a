//! # HexBot Protocol
//!
//! SSC-32 舵机控制板 ASCII 协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量（取值范围、波特率、查询指令）
//! - `control`: 子指令请求、参数校验与 token 编码
//! - `feedback`: 查询指令与控制板应答解析
//! - `sequence`: 步态序列 `GaitSequence` 及其有序参数表、差分
//!
//! ## 行格式
//!
//! 一条物理指令行由若干子指令 token 按顺序直接拼接，末尾追加回车 `\r`：
//!
//! ```text
//! #6P1000#7P1000#8P1000\r
//! LH 1600LM 1300LL 1000XS 50\r
//! ```
//!
//! 控制板按 token 出现的顺序执行，因此拼接顺序即执行顺序。

pub mod constants;
pub mod control;
pub mod feedback;
pub mod sequence;

// 重新导出常用类型
pub use constants::*;
pub use control::*;
pub use feedback::*;
pub use sequence::*;

use thiserror::Error;

/// 参数校验错误
///
/// 每个越界约束对应一个独立变体。校验总是在编码之前完成，
/// 出错时不会产生任何 token，也就不会有字节到达串口。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Servo channel needs to be between 0 and 31, was {channel}")]
    ChannelOutOfRange { channel: u8 },

    #[error("Pulse width needs to be between 500 and 2500us, was {pulse}")]
    PulseOutOfRange { pulse: u16 },

    #[error("Position offset is restricted to -100us to 100us, was {offset}")]
    PositionOffsetOutOfRange { offset: i8 },

    #[error("Leg value needs to be between 500 and 2500us, was {value}")]
    LegValueOutOfRange { value: u16 },

    #[error("Horizontal movement time needs to be between 1 and 65535us, was {time}")]
    MovementTimeOutOfRange { time: u16 },

    #[error("Travel percentage needs to be between -100% and 100%, was {percentage}")]
    TravelPercentageOutOfRange { percentage: i8 },

    #[error("Horizontal speed percentage needs to be between 0% and 200%, was {percentage}")]
    SpeedPercentageOutOfRange { percentage: u8 },

    #[error("Unknown gait parameter: {name}")]
    UnknownParameter { name: String },

    #[error("Value {value} does not fit gait parameter {name}")]
    ParameterValueOutOfRange { name: &'static str, value: i64 },
}

/// 应答解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Empty response to {query}")]
    EmptyResponse { query: &'static str },

    #[error("Unexpected response to {query}: {response:?}")]
    UnexpectedResponse {
        query: &'static str,
        response: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::ChannelOutOfRange { channel: 32 };
        assert_eq!(
            err.to_string(),
            "Servo channel needs to be between 0 and 31, was 32"
        );

        let err = ValidationError::TravelPercentageOutOfRange { percentage: -101 };
        assert!(err.to_string().contains("-101"));

        let err = ValidationError::UnknownParameter {
            name: "tail_length".to_string(),
        };
        assert!(err.to_string().contains("tail_length"));
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::UnexpectedResponse {
            query: "Q",
            response: "?".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Q") && msg.contains("\"?\""), "{}", msg);

        let err = ProtocolError::EmptyResponse { query: "VER" };
        assert_eq!(err.to_string(), "Empty response to VER");
    }
}

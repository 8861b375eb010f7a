//! 控制子指令定义
//!
//! 每个 [`ServoCommand`] 对应协议中的一个 token。[`ServoCommand::encode`] 先校验参数，
//! 校验通过后才生成 token，因此失败时不存在“半个 token”。
//!
//! 与步态序列器状态相关的副作用不在这里执行，而是通过
//! [`ServoCommand::sequencer_effect`] 描述出来，由驱动层在写入成功后应用。

use crate::ValidationError;
use crate::constants::*;

// ============================================================================
// 寻址枚举
// ============================================================================

/// 六足机器人的左右侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ServoSide {
    Left,
    Right,
}

impl ServoSide {
    fn letter(self) -> char {
        match self {
            ServoSide::Left => 'L',
            ServoSide::Right => 'R',
        }
    }
}

/// 垂直舵机位置：High 为最大抬腿高度，Low 为最低
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LegPosition {
    High,
    Mid,
    Low,
}

impl LegPosition {
    fn letter(self) -> char {
        match self {
            LegPosition::High => 'H',
            LegPosition::Mid => 'M',
            LegPosition::Low => 'L',
        }
    }
}

/// 水平舵机的前/后极限位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrontRear {
    Front,
    Rear,
}

impl FrontRear {
    fn letter(self) -> char {
        match self {
            FrontRear::Front => 'F',
            FrontRear::Rear => 'R',
        }
    }
}

/// 子指令对步态序列器的影响
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEffect {
    /// 启动（或保持）步态序列器运行（`XS`）
    Starts,
    /// 停止步态序列器（`XSTOP`）
    Stops,
}

// ============================================================================
// 子指令
// ============================================================================

/// 子指令请求
///
/// 字段为原始协议取值，构造时不做检查；[`validate`](Self::validate) 和
/// [`encode`](Self::encode) 负责校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoCommand {
    /// 单舵机运动：`#{ch}P{pulse}[S{speed}][T{time}]`
    SingleServo {
        channel: u8,
        pulse: u16,
        /// 运动速度（微秒/秒）
        speed: Option<u16>,
        /// 运动时间（毫秒，最大 65535）
        time: Option<u16>,
    },

    /// 中位偏移：`#{ch}PO{offset}`
    ServoPositionOffset { channel: u8, offset: i8 },

    /// 立即停止舵机并保持当前位置：`STOP{ch}`
    StopServo { channel: u8 },

    /// 垂直舵机位置：`{L|R}{H|M|L} {value}`
    SetVerticalServo {
        side: ServoSide,
        leg: LegPosition,
        value: u16,
    },

    /// 垂直舵机运动速度：`VS {speed}`，所有垂直运动共用
    SetVerticalServoMovementSpeed { speed: u16 },

    /// 水平舵机前/后极限位置：`{L|R}{F|R} {value}`
    SetHorizontalServo {
        side: ServoSide,
        end: FrontRear,
        value: u16,
    },

    /// 水平前后往返时间：`HT {time}`
    SetHorizontalServoMovementTime { time: u16 },

    /// 单侧行程百分比：`{XL|XR}{pct}`
    SetTravelPercentage { side: ServoSide, percentage: i8 },

    /// 水平速度百分比：`XS {pct}`，同时启动步态序列器
    SetHorizontalSpeedPercentage { percentage: u8 },

    /// 停止步态序列器：`XSTOP`
    StopHexSequencer,
}

/// 校验舵机通道号
pub fn validate_channel(channel: u8) -> Result<(), ValidationError> {
    if channel > MAX_SERVO_CHANNEL {
        return Err(ValidationError::ChannelOutOfRange { channel });
    }
    Ok(())
}

fn validate_leg_value(value: u16) -> Result<(), ValidationError> {
    if !(MIN_PULSE_WIDTH_US..=MAX_PULSE_WIDTH_US).contains(&value) {
        return Err(ValidationError::LegValueOutOfRange { value });
    }
    Ok(())
}

impl ServoCommand {
    /// 校验所有参数
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            ServoCommand::SingleServo { channel, pulse, .. } => {
                validate_channel(channel)?;
                if !(MIN_PULSE_WIDTH_US..=MAX_PULSE_WIDTH_US).contains(&pulse) {
                    return Err(ValidationError::PulseOutOfRange { pulse });
                }
            },
            ServoCommand::ServoPositionOffset { channel, offset } => {
                validate_channel(channel)?;
                if !(MIN_POSITION_OFFSET_US..=MAX_POSITION_OFFSET_US).contains(&offset) {
                    return Err(ValidationError::PositionOffsetOutOfRange { offset });
                }
            },
            ServoCommand::StopServo { channel } => validate_channel(channel)?,
            ServoCommand::SetVerticalServo { value, .. }
            | ServoCommand::SetHorizontalServo { value, .. } => validate_leg_value(value)?,
            ServoCommand::SetVerticalServoMovementSpeed { .. } => {},
            ServoCommand::SetHorizontalServoMovementTime { time } => {
                if time < MIN_HORIZONTAL_TIME_US {
                    return Err(ValidationError::MovementTimeOutOfRange { time });
                }
            },
            ServoCommand::SetTravelPercentage { percentage, .. } => {
                if !(MIN_TRAVEL_PERCENTAGE..=MAX_TRAVEL_PERCENTAGE).contains(&percentage) {
                    return Err(ValidationError::TravelPercentageOutOfRange { percentage });
                }
            },
            ServoCommand::SetHorizontalSpeedPercentage { percentage } => {
                if percentage > MAX_SPEED_PERCENTAGE {
                    return Err(ValidationError::SpeedPercentageOutOfRange { percentage });
                }
            },
            ServoCommand::StopHexSequencer => {},
        }
        Ok(())
    }

    /// 校验并编码为 token（不含行结束符）
    pub fn encode(&self) -> Result<String, ValidationError> {
        self.validate()?;
        Ok(self.token())
    }

    /// 对步态序列器的影响（写入成功后才应生效）
    pub fn sequencer_effect(&self) -> Option<SequencerEffect> {
        match self {
            ServoCommand::SetHorizontalSpeedPercentage { .. } => Some(SequencerEffect::Starts),
            ServoCommand::StopHexSequencer => Some(SequencerEffect::Stops),
            _ => None,
        }
    }

    fn token(&self) -> String {
        match *self {
            ServoCommand::SingleServo {
                channel,
                pulse,
                speed,
                time,
            } => {
                let mut token = format!("#{}P{}", channel, pulse);
                if let Some(speed) = speed {
                    token.push_str(&format!("S{}", speed));
                }
                if let Some(time) = time {
                    token.push_str(&format!("T{}", time));
                }
                token
            },
            ServoCommand::ServoPositionOffset { channel, offset } => {
                format!("#{}PO{}", channel, offset)
            },
            ServoCommand::StopServo { channel } => format!("STOP{}", channel),
            ServoCommand::SetVerticalServo { side, leg, value } => {
                format!("{}{} {}", side.letter(), leg.letter(), value)
            },
            ServoCommand::SetVerticalServoMovementSpeed { speed } => format!("VS {}", speed),
            ServoCommand::SetHorizontalServo { side, end, value } => {
                format!("{}{} {}", side.letter(), end.letter(), value)
            },
            ServoCommand::SetHorizontalServoMovementTime { time } => format!("HT {}", time),
            ServoCommand::SetTravelPercentage { side, percentage } => {
                format!("X{}{}", side.letter(), percentage)
            },
            ServoCommand::SetHorizontalSpeedPercentage { percentage } => {
                format!("XS {}", percentage)
            },
            ServoCommand::StopHexSequencer => STOP_SEQUENCER_TOKEN.to_string(),
        }
    }
}

/// 将一组子指令编码为一条完整的物理行（含 `\r`）
///
/// 任意一个子指令校验失败，整行都不会生成。
pub fn encode_line(commands: &[ServoCommand]) -> Result<String, ValidationError> {
    let mut line = String::new();
    for command in commands {
        line.push_str(&command.encode()?);
    }
    line.push(LINE_TERMINATOR);
    Ok(line)
}

//! 步态序列定义
//!
//! [`GaitSequence`] 是控制板步态序列器的完整参数集（腿部行程几何 + 速度）。
//! 参数的遍历顺序由 [`GaitParameter::ALL`] 固定，全量下发与差分下发共用同一顺序。

use crate::ValidationError;
use crate::control::{FrontRear, LegPosition, ServoCommand, ServoSide};

/// 步态序列（值类型）
///
/// 每次配置变化都会整体替换为一个新值，不做原地修改。
/// 默认值对应“原地站立、随时可以行走”的姿态，左右两侧镜像安装。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct GaitSequence {
    /// 左侧垂直舵机：最大抬腿位置（µs）
    #[cfg_attr(feature = "serde", serde(alias = "VerticalServo_Left_HighValue"))]
    pub vertical_left_high: u16,
    /// 左侧垂直舵机：中间位置（µs）
    #[cfg_attr(feature = "serde", serde(alias = "VerticalServo_Left_MidValue"))]
    pub vertical_left_mid: u16,
    /// 左侧垂直舵机：最低位置（µs）
    #[cfg_attr(feature = "serde", serde(alias = "VerticalServo_Left_LowValue"))]
    pub vertical_left_low: u16,
    /// 右侧垂直舵机：最大抬腿位置（µs）
    #[cfg_attr(feature = "serde", serde(alias = "VerticalServo_Right_HighValue"))]
    pub vertical_right_high: u16,
    /// 右侧垂直舵机：中间位置（µs）
    #[cfg_attr(feature = "serde", serde(alias = "VerticalServo_Right_MidValue"))]
    pub vertical_right_mid: u16,
    /// 右侧垂直舵机：最低位置（µs）
    #[cfg_attr(feature = "serde", serde(alias = "VerticalServo_Right_LowValue"))]
    pub vertical_right_low: u16,
    /// 垂直运动速度（µs/s）
    #[cfg_attr(feature = "serde", serde(alias = "VerticalServo_MovementSpeed"))]
    pub vertical_movement_speed: u16,
    /// 左侧水平舵机：最前位置（µs）
    #[cfg_attr(feature = "serde", serde(alias = "HorizontalServo_Left_FrontValue"))]
    pub horizontal_left_front: u16,
    /// 左侧水平舵机：最后位置（µs）
    #[cfg_attr(feature = "serde", serde(alias = "HorizontalServo_Left_RearValue"))]
    pub horizontal_left_rear: u16,
    /// 右侧水平舵机：最前位置（µs）
    #[cfg_attr(feature = "serde", serde(alias = "HorizontalServo_Right_FrontValue"))]
    pub horizontal_right_front: u16,
    /// 右侧水平舵机：最后位置（µs）
    #[cfg_attr(feature = "serde", serde(alias = "HorizontalServo_Right_RearValue"))]
    pub horizontal_right_rear: u16,
    /// 前后往返时间（µs）
    #[cfg_attr(feature = "serde", serde(alias = "HorizontalServo_MovementTime"))]
    pub horizontal_movement_time: u16,
    /// 左侧行程百分比（-100..=100）
    #[cfg_attr(feature = "serde", serde(alias = "TravelPercentage_Left"))]
    pub travel_percentage_left: i8,
    /// 右侧行程百分比（-100..=100）
    #[cfg_attr(feature = "serde", serde(alias = "TravelPercentage_Right"))]
    pub travel_percentage_right: i8,
}

impl Default for GaitSequence {
    fn default() -> Self {
        Self {
            vertical_left_high: 1600,
            vertical_left_mid: 1300,
            vertical_left_low: 1000,
            vertical_right_high: 1000,
            vertical_right_mid: 1300,
            vertical_right_low: 1600,
            vertical_movement_speed: 3000,
            horizontal_left_front: 700,
            horizontal_left_rear: 1600,
            horizontal_right_front: 1600,
            horizontal_right_rear: 700,
            horizontal_movement_time: 1500,
            travel_percentage_left: 100,
            travel_percentage_right: 100,
        }
    }
}

impl GaitSequence {
    /// 前进：两侧全行程
    pub fn forward() -> Self {
        Self::default().with_travel(100, 100)
    }

    /// 后退：两侧反向全行程
    pub fn backward() -> Self {
        Self::default().with_travel(-100, -100)
    }

    /// 左转：左侧前进，右侧后退
    pub fn turn_left() -> Self {
        Self::default().with_travel(100, -100)
    }

    /// 右转：左侧后退，右侧前进
    pub fn turn_right() -> Self {
        Self::default().with_travel(-100, 100)
    }

    /// 返回替换了两侧行程百分比的新序列
    pub fn with_travel(mut self, left: i8, right: i8) -> Self {
        self.travel_percentage_left = left;
        self.travel_percentage_right = right;
        self
    }

    /// 按参数名替换单个参数，返回新序列
    ///
    /// 参数名为字段名（如 `travel_percentage_left`）。
    pub fn with_parameter(&self, name: &str, value: i64) -> Result<Self, ValidationError> {
        let parameter =
            GaitParameter::from_name(name).ok_or_else(|| ValidationError::UnknownParameter {
                name: name.to_string(),
            })?;
        let mut sequence = *self;
        parameter.assign(&mut sequence, value)?;
        Ok(sequence)
    }

    /// 校验所有参数（与下发时使用相同的规则）
    pub fn validate(&self) -> Result<(), ValidationError> {
        for parameter in GaitParameter::ALL {
            parameter.command(self).validate()?;
        }
        Ok(())
    }

    /// 全量下发所需的几何子指令（固定顺序，不含 `XS`）
    pub fn geometry_commands(&self) -> Vec<ServoCommand> {
        GaitParameter::ALL.iter().map(|p| p.command(self)).collect()
    }

    /// 从 `self` 变为 `new` 所需的最少几何子指令（固定顺序，不含 `XS`）
    pub fn diff(&self, new: &GaitSequence) -> Vec<ServoCommand> {
        GaitParameter::ALL
            .iter()
            .filter(|p| p.value(self) != p.value(new))
            .map(|p| p.command(new))
            .collect()
    }

    /// 按固定顺序列出 (参数名, 值)
    pub fn parameters(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        GaitParameter::ALL.iter().map(move |p| (p.name(), p.value(self)))
    }
}

/// 步态参数（有序 schema）
///
/// 每个变体同时提供取值器（[`value`](Self::value)）和编码器（[`command`](Self::command)），
/// [`ALL`](Self::ALL) 的顺序即协议下发顺序：
/// 6 个垂直位置、垂直速度、4 个水平位置、水平时间、2 个行程百分比。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GaitParameter {
    VerticalLeftHigh,
    VerticalLeftMid,
    VerticalLeftLow,
    VerticalRightHigh,
    VerticalRightMid,
    VerticalRightLow,
    VerticalMovementSpeed,
    HorizontalLeftFront,
    HorizontalLeftRear,
    HorizontalRightFront,
    HorizontalRightRear,
    HorizontalMovementTime,
    TravelPercentageLeft,
    TravelPercentageRight,
}

impl GaitParameter {
    /// 下发顺序
    pub const ALL: [GaitParameter; 14] = [
        GaitParameter::VerticalLeftHigh,
        GaitParameter::VerticalLeftMid,
        GaitParameter::VerticalLeftLow,
        GaitParameter::VerticalRightHigh,
        GaitParameter::VerticalRightMid,
        GaitParameter::VerticalRightLow,
        GaitParameter::VerticalMovementSpeed,
        GaitParameter::HorizontalLeftFront,
        GaitParameter::HorizontalLeftRear,
        GaitParameter::HorizontalRightFront,
        GaitParameter::HorizontalRightRear,
        GaitParameter::HorizontalMovementTime,
        GaitParameter::TravelPercentageLeft,
        GaitParameter::TravelPercentageRight,
    ];

    /// 参数名（与 `GaitSequence` 字段名、配置文件键名一致）
    pub fn name(self) -> &'static str {
        match self {
            GaitParameter::VerticalLeftHigh => "vertical_left_high",
            GaitParameter::VerticalLeftMid => "vertical_left_mid",
            GaitParameter::VerticalLeftLow => "vertical_left_low",
            GaitParameter::VerticalRightHigh => "vertical_right_high",
            GaitParameter::VerticalRightMid => "vertical_right_mid",
            GaitParameter::VerticalRightLow => "vertical_right_low",
            GaitParameter::VerticalMovementSpeed => "vertical_movement_speed",
            GaitParameter::HorizontalLeftFront => "horizontal_left_front",
            GaitParameter::HorizontalLeftRear => "horizontal_left_rear",
            GaitParameter::HorizontalRightFront => "horizontal_right_front",
            GaitParameter::HorizontalRightRear => "horizontal_right_rear",
            GaitParameter::HorizontalMovementTime => "horizontal_movement_time",
            GaitParameter::TravelPercentageLeft => "travel_percentage_left",
            GaitParameter::TravelPercentageRight => "travel_percentage_right",
        }
    }

    /// 按名称查找参数
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// 取值器
    pub fn value(self, seq: &GaitSequence) -> i32 {
        match self {
            GaitParameter::VerticalLeftHigh => i32::from(seq.vertical_left_high),
            GaitParameter::VerticalLeftMid => i32::from(seq.vertical_left_mid),
            GaitParameter::VerticalLeftLow => i32::from(seq.vertical_left_low),
            GaitParameter::VerticalRightHigh => i32::from(seq.vertical_right_high),
            GaitParameter::VerticalRightMid => i32::from(seq.vertical_right_mid),
            GaitParameter::VerticalRightLow => i32::from(seq.vertical_right_low),
            GaitParameter::VerticalMovementSpeed => i32::from(seq.vertical_movement_speed),
            GaitParameter::HorizontalLeftFront => i32::from(seq.horizontal_left_front),
            GaitParameter::HorizontalLeftRear => i32::from(seq.horizontal_left_rear),
            GaitParameter::HorizontalRightFront => i32::from(seq.horizontal_right_front),
            GaitParameter::HorizontalRightRear => i32::from(seq.horizontal_right_rear),
            GaitParameter::HorizontalMovementTime => i32::from(seq.horizontal_movement_time),
            GaitParameter::TravelPercentageLeft => i32::from(seq.travel_percentage_left),
            GaitParameter::TravelPercentageRight => i32::from(seq.travel_percentage_right),
        }
    }

    /// 编码器：生成设置该参数的子指令
    pub fn command(self, seq: &GaitSequence) -> ServoCommand {
        use FrontRear::*;
        use LegPosition::*;
        use ServoSide::*;

        let vertical = |side, leg, value| ServoCommand::SetVerticalServo { side, leg, value };
        let horizontal = |side, end, value| ServoCommand::SetHorizontalServo { side, end, value };

        match self {
            GaitParameter::VerticalLeftHigh => vertical(Left, High, seq.vertical_left_high),
            GaitParameter::VerticalLeftMid => vertical(Left, Mid, seq.vertical_left_mid),
            GaitParameter::VerticalLeftLow => vertical(Left, Low, seq.vertical_left_low),
            GaitParameter::VerticalRightHigh => vertical(Right, High, seq.vertical_right_high),
            GaitParameter::VerticalRightMid => vertical(Right, Mid, seq.vertical_right_mid),
            GaitParameter::VerticalRightLow => vertical(Right, Low, seq.vertical_right_low),
            GaitParameter::VerticalMovementSpeed => ServoCommand::SetVerticalServoMovementSpeed {
                speed: seq.vertical_movement_speed,
            },
            GaitParameter::HorizontalLeftFront => {
                horizontal(Left, Front, seq.horizontal_left_front)
            },
            GaitParameter::HorizontalLeftRear => horizontal(Left, Rear, seq.horizontal_left_rear),
            GaitParameter::HorizontalRightFront => {
                horizontal(Right, Front, seq.horizontal_right_front)
            },
            GaitParameter::HorizontalRightRear => {
                horizontal(Right, Rear, seq.horizontal_right_rear)
            },
            GaitParameter::HorizontalMovementTime => {
                ServoCommand::SetHorizontalServoMovementTime {
                    time: seq.horizontal_movement_time,
                }
            },
            GaitParameter::TravelPercentageLeft => ServoCommand::SetTravelPercentage {
                side: Left,
                percentage: seq.travel_percentage_left,
            },
            GaitParameter::TravelPercentageRight => ServoCommand::SetTravelPercentage {
                side: Right,
                percentage: seq.travel_percentage_right,
            },
        }
    }

    fn assign(self, seq: &mut GaitSequence, value: i64) -> Result<(), ValidationError> {
        let name = self.name();
        let as_u16 = || {
            u16::try_from(value)
                .map_err(|_| ValidationError::ParameterValueOutOfRange { name, value })
        };
        let as_i8 = || {
            i8::try_from(value)
                .map_err(|_| ValidationError::ParameterValueOutOfRange { name, value })
        };

        match self {
            GaitParameter::VerticalLeftHigh => seq.vertical_left_high = as_u16()?,
            GaitParameter::VerticalLeftMid => seq.vertical_left_mid = as_u16()?,
            GaitParameter::VerticalLeftLow => seq.vertical_left_low = as_u16()?,
            GaitParameter::VerticalRightHigh => seq.vertical_right_high = as_u16()?,
            GaitParameter::VerticalRightMid => seq.vertical_right_mid = as_u16()?,
            GaitParameter::VerticalRightLow => seq.vertical_right_low = as_u16()?,
            GaitParameter::VerticalMovementSpeed => seq.vertical_movement_speed = as_u16()?,
            GaitParameter::HorizontalLeftFront => seq.horizontal_left_front = as_u16()?,
            GaitParameter::HorizontalLeftRear => seq.horizontal_left_rear = as_u16()?,
            GaitParameter::HorizontalRightFront => seq.horizontal_right_front = as_u16()?,
            GaitParameter::HorizontalRightRear => seq.horizontal_right_rear = as_u16()?,
            GaitParameter::HorizontalMovementTime => seq.horizontal_movement_time = as_u16()?,
            GaitParameter::TravelPercentageLeft => seq.travel_percentage_left = as_i8()?,
            GaitParameter::TravelPercentageRight => seq.travel_percentage_right = as_i8()?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::encode_line;

    #[test]
    fn test_default_sequence_is_valid() {
        assert!(GaitSequence::default().validate().is_ok());
    }

    #[test]
    fn test_geometry_commands_fixed_order() {
        let line = encode_line(&GaitSequence::default().geometry_commands()).unwrap();
        assert_eq!(
            line,
            "LH 1600LM 1300LL 1000RH 1000RM 1300RL 1600VS 3000\
             LF 700LR 1600RF 1600RR 700HT 1500XL100XR100\r"
        );
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let seq = GaitSequence::default();
        assert!(seq.diff(&seq).is_empty());
    }

    #[test]
    fn test_diff_single_field() {
        let old = GaitSequence::default();
        let new = old.with_travel(-40, 100);
        assert_eq!(
            old.diff(&new),
            vec![ServoCommand::SetTravelPercentage {
                side: ServoSide::Left,
                percentage: -40
            }]
        );
    }

    #[test]
    fn test_diff_preserves_parameter_order() {
        let old = GaitSequence::default();
        let mut new = GaitSequence::backward();
        new.vertical_left_high = 1700;
        new.horizontal_movement_time = 1200;

        let tokens: Vec<String> = old.diff(&new).iter().map(|c| c.encode().unwrap()).collect();
        assert_eq!(tokens, vec!["LH 1700", "HT 1200", "XL-100", "XR-100"]);
    }

    #[test]
    fn test_presets() {
        assert_eq!(GaitSequence::forward(), GaitSequence::default());
        let back = GaitSequence::backward();
        assert_eq!(
            (back.travel_percentage_left, back.travel_percentage_right),
            (-100, -100)
        );
        let left = GaitSequence::turn_left();
        assert_eq!(
            (left.travel_percentage_left, left.travel_percentage_right),
            (100, -100)
        );
        let right = GaitSequence::turn_right();
        assert_eq!(
            (right.travel_percentage_left, right.travel_percentage_right),
            (-100, 100)
        );
    }

    #[test]
    fn test_with_parameter() {
        let seq = GaitSequence::default();
        let updated = seq.with_parameter("horizontal_movement_time", 900).unwrap();
        assert_eq!(updated.horizontal_movement_time, 900);
        // 原值不受影响
        assert_eq!(seq.horizontal_movement_time, 1500);

        assert_eq!(
            seq.with_parameter("tail", 1),
            Err(ValidationError::UnknownParameter {
                name: "tail".to_string()
            })
        );
        assert_eq!(
            seq.with_parameter("travel_percentage_left", 300),
            Err(ValidationError::ParameterValueOutOfRange {
                name: "travel_percentage_left",
                value: 300
            })
        );
        assert!(seq.with_parameter("vertical_left_low", -1).is_err());
    }

    #[test]
    fn test_with_parameter_does_not_range_check_protocol_limits() {
        // 类型范围内的值可以写入，协议范围在下发时校验
        let seq = GaitSequence::default()
            .with_parameter("travel_percentage_right", 120)
            .unwrap();
        assert_eq!(
            seq.validate(),
            Err(ValidationError::TravelPercentageOutOfRange { percentage: 120 })
        );
    }

    #[test]
    fn test_parameter_names_round_trip() {
        for parameter in GaitParameter::ALL {
            assert_eq!(GaitParameter::from_name(parameter.name()), Some(parameter));
        }
        assert_eq!(GaitParameter::from_name("VerticalServo_Left_HighValue"), None);
    }

    #[test]
    fn test_parameters_listing() {
        let params: Vec<_> = GaitSequence::default().parameters().collect();
        assert_eq!(params.len(), 14);
        assert_eq!(params[0], ("vertical_left_high", 1600));
        assert_eq!(params[13], ("travel_percentage_right", 100));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial_table() {
        let seq: GaitSequence = toml::from_str(
            r#"
travel_percentage_left = -50
HorizontalServo_MovementTime = 1200
"#,
        )
        .unwrap();
        assert_eq!(seq.travel_percentage_left, -50);
        assert_eq!(seq.horizontal_movement_time, 1200);
        assert_eq!(seq.vertical_left_high, 1600);
    }
}

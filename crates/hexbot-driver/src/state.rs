//! 机器人运动状态模型
//!
//! [`RobotModel`] 记录控制板步态序列器是否在运行以及当前的水平速度百分比。
//! 运动状态只能通过写入成功的 `XS` / `XSTOP` 改变，调用方无法直接设置。

use hexbot_protocol::{MAX_SPEED_PERCENTAGE, SequencerEffect, ValidationError};

/// 步态序列器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementState {
    /// 序列器停止，舵机按普通指令运动
    #[default]
    Stopped,
    /// 序列器正在自主驱动腿部
    InWalkSequence,
}

impl MovementState {
    /// 应用子指令的状态迁移
    pub(crate) fn after(self, effect: SequencerEffect) -> Self {
        match effect {
            SequencerEffect::Starts => MovementState::InWalkSequence,
            SequencerEffect::Stops => MovementState::Stopped,
        }
    }
}

impl std::fmt::Display for MovementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementState::Stopped => write!(f, "Stopped"),
            MovementState::InWalkSequence => write!(f, "InWalkSequence"),
        }
    }
}

/// 机器人模型（每个控制器一个）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotModel {
    state: MovementState,
    /// 水平速度百分比（0..=200）
    speed: u8,
}

impl RobotModel {
    /// 以给定的初始速度创建模型，状态为 `Stopped`
    pub fn new(speed: u8) -> Result<Self, ValidationError> {
        let mut model = Self::default();
        model.set_speed(speed)?;
        Ok(model)
    }

    pub fn state(&self) -> MovementState {
        self.state
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn is_walking(&self) -> bool {
        self.state == MovementState::InWalkSequence
    }

    /// 设置速度（仅修改模型，不产生任何指令）
    pub fn set_speed(&mut self, speed: u8) -> Result<(), ValidationError> {
        if speed > MAX_SPEED_PERCENTAGE {
            return Err(ValidationError::SpeedPercentageOutOfRange { percentage: speed });
        }
        self.speed = speed;
        Ok(())
    }

    /// 计算调整后的速度（饱和到 0..=200），不修改模型
    pub fn adjusted_speed(&self, delta: i16) -> u8 {
        let speed = (i16::from(self.speed) + delta).clamp(0, i16::from(MAX_SPEED_PERCENTAGE));
        // clamp 之后一定落在 u8 范围内
        speed as u8
    }

    /// 写入成功后应用状态迁移
    pub(crate) fn apply(&mut self, effect: SequencerEffect) {
        self.state = self.state.after(effect);
    }
}

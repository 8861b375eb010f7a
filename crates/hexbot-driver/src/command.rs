//! 指令构建器
//!
//! [`Command`] 是一次性的 token 累加器：每个方法对应一个协议原语，先校验参数，
//! 通过后再追加 token，并返回构建器本身以便链式调用。校验失败时构建器被消耗，
//! 已累积的内容随之丢弃，不会有任何字节写出。
//!
//! 组装期间只推演一份“预期状态”，真正的 [`RobotModel`] 在
//! [`Command::execute`] 中逐行写入成功后才更新。
//!
//! # Example
//!
//! ```
//! use hexbot_driver::{Controller, DriverError};
//! use hexbot_protocol::ServoSide;
//!
//! fn lower_legs(ctl: &mut Controller) -> Result<(), DriverError> {
//!     ctl.command()
//!         .single_servo(6, 1000)?
//!         .single_servo(7, 1000)?
//!         .set_travel_percentage(ServoSide::Left, 50)?
//!         .execute()
//! }
//! ```

use crate::error::DriverError;
use crate::ssc32::Ssc32;
use crate::state::{MovementState, RobotModel};
use hexbot_protocol::{
    FrontRear, LINE_TERMINATOR, LegPosition, SequencerEffect, ServoCommand, ServoSide,
    ValidationError,
};
use tracing::debug;

/// 一条待写出的物理行
#[derive(Debug, Default)]
struct PendingLine {
    body: String,
    effects: Vec<SequencerEffect>,
}

/// 指令构建器（单次使用）
#[must_use = "a Command does nothing until `execute` is called"]
pub struct Command<'a> {
    session: &'a mut Ssc32,
    model: &'a mut RobotModel,
    /// 组装过程中推演的序列器状态
    projected: MovementState,
    lines: Vec<PendingLine>,
}

impl<'a> Command<'a> {
    pub(crate) fn new(session: &'a mut Ssc32, model: &'a mut RobotModel) -> Self {
        let projected = model.state();
        Self {
            session,
            model,
            projected,
            lines: vec![PendingLine::default()],
        }
    }

    /// 校验并追加一个子指令
    pub fn push(mut self, command: ServoCommand) -> Result<Self, ValidationError> {
        let token = command.encode()?;
        let line = self.current_line();
        line.body.push_str(&token);
        if let Some(effect) = command.sequencer_effect() {
            line.effects.push(effect);
            self.projected = self.projected.after(effect);
        }
        Ok(self)
    }

    /// 结束当前行，之后的 token 写入新的一行
    pub fn line_break(mut self) -> Self {
        if !self.current_line().body.is_empty() {
            self.lines.push(PendingLine::default());
        }
        self
    }

    /// 单舵机运动：`#{ch}P{pulse}`
    pub fn single_servo(self, channel: u8, pulse: u16) -> Result<Self, ValidationError> {
        self.single_servo_with(channel, pulse, None, None)
    }

    /// 单舵机运动，可选速度（µs/s）和时间（ms）：`#{ch}P{pulse}[S{speed}][T{time}]`
    pub fn single_servo_with(
        self,
        channel: u8,
        pulse: u16,
        speed: Option<u16>,
        time: Option<u16>,
    ) -> Result<Self, ValidationError> {
        self.push(ServoCommand::SingleServo {
            channel,
            pulse,
            speed,
            time,
        })
    }

    /// 中位偏移：`#{ch}PO{offset}`
    pub fn servo_position_offset(self, channel: u8, offset: i8) -> Result<Self, ValidationError> {
        self.push(ServoCommand::ServoPositionOffset { channel, offset })
    }

    /// 停止舵机：`STOP{ch}`
    pub fn stop_servo(self, channel: u8) -> Result<Self, ValidationError> {
        self.push(ServoCommand::StopServo { channel })
    }

    /// 垂直舵机位置：`{L|R}{H|M|L} {value}`
    pub fn set_vertical_servo(
        self,
        side: ServoSide,
        leg: LegPosition,
        value: u16,
    ) -> Result<Self, ValidationError> {
        self.push(ServoCommand::SetVerticalServo { side, leg, value })
    }

    /// 垂直运动速度：`VS {speed}`
    pub fn set_vertical_servo_movement_speed(self, speed: u16) -> Result<Self, ValidationError> {
        self.push(ServoCommand::SetVerticalServoMovementSpeed { speed })
    }

    /// 水平舵机位置：`{L|R}{F|R} {value}`
    pub fn set_horizontal_servo(
        self,
        side: ServoSide,
        end: FrontRear,
        value: u16,
    ) -> Result<Self, ValidationError> {
        self.push(ServoCommand::SetHorizontalServo { side, end, value })
    }

    /// 水平往返时间：`HT {time}`
    pub fn set_horizontal_servo_movement_time(self, time: u16) -> Result<Self, ValidationError> {
        self.push(ServoCommand::SetHorizontalServoMovementTime { time })
    }

    /// 行程百分比：`XL{pct}` / `XR{pct}`
    pub fn set_travel_percentage(
        self,
        side: ServoSide,
        percentage: i8,
    ) -> Result<Self, ValidationError> {
        self.push(ServoCommand::SetTravelPercentage { side, percentage })
    }

    /// 水平速度百分比：`XS {pct}`，写入成功后状态变为 `InWalkSequence`
    pub fn set_horizontal_speed_percentage(self, percentage: u8) -> Result<Self, ValidationError> {
        self.push(ServoCommand::SetHorizontalSpeedPercentage { percentage })
    }

    /// 停止步态序列器：`XSTOP`
    ///
    /// 预期状态已经是 `Stopped` 时不追加任何内容。
    pub fn stop_hex_sequencer(self) -> Self {
        if self.projected == MovementState::Stopped {
            return self;
        }
        let mut command = self;
        let line = command.current_line();
        line.body.push_str(hexbot_protocol::STOP_SEQUENCER_TOKEN);
        line.effects.push(SequencerEffect::Stops);
        command.projected = MovementState::Stopped;
        command
    }

    /// 组装完成后的预期状态
    pub fn projected_state(&self) -> MovementState {
        self.projected
    }

    /// 模型中的当前速度
    pub fn speed(&self) -> u8 {
        self.model.speed()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.body.is_empty())
    }

    /// 将要写出的物理行（含行结束符）
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter(|line| !line.body.is_empty())
            .map(|line| format!("{}{}", line.body, LINE_TERMINATOR))
            .collect()
    }

    /// 逐行写出，每行写入成功后应用该行的状态迁移
    ///
    /// 空构建器不产生任何 I/O。某一行写入失败时立即返回，
    /// 该行及之后各行的状态迁移都不会应用。
    pub fn execute(self) -> Result<(), DriverError> {
        let Command {
            session,
            model,
            lines,
            ..
        } = self;
        for line in lines.into_iter().filter(|line| !line.body.is_empty()) {
            session.write_line(&line.body)?;
            for effect in line.effects {
                model.apply(effect);
            }
        }
        debug!("Movement state after execute: {}", model.state());
        Ok(())
    }

    fn current_line(&mut self) -> &mut PendingLine {
        if self.lines.is_empty() {
            self.lines.push(PendingLine::default());
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }
}

impl std::fmt::Debug for Command<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("projected", &self.projected)
            .field("lines", &self.lines())
            .finish()
    }
}

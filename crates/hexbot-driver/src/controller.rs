//! 控制器
//!
//! [`Controller`] 独占串口会话和机器人模型，并保存差分下发所需的基线
//! （上一次成功下发到控制板的步态序列及当时的速度）。
//! 基线只在整批指令写入成功后更新；写入失败时基线被作废，
//! 下一次下发退回全量下发。

use crate::command::Command;
use crate::error::DriverError;
use crate::metrics::MetricsSnapshot;
use crate::ssc32::{SessionConfig, Ssc32};
use crate::state::{MovementState, RobotModel};
use hexbot_protocol::{FirmwareVersion, GaitSequence, MovementStatus};
use hexbot_serial::SerialAdapter;
use tracing::{debug, error, info};

/// 行走方向（预设行程百分比）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkDirection {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

impl WalkDirection {
    /// (左侧, 右侧) 行程百分比
    pub fn travel(self) -> (i8, i8) {
        match self {
            WalkDirection::Forward => (100, 100),
            WalkDirection::Backward => (-100, -100),
            WalkDirection::TurnLeft => (100, -100),
            WalkDirection::TurnRight => (-100, 100),
        }
    }

    /// 以 `template` 为基础生成该方向的步态序列
    pub fn sequence(self, template: &GaitSequence) -> GaitSequence {
        let (left, right) = self.travel();
        template.with_travel(left, right)
    }
}

impl std::fmt::Display for WalkDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WalkDirection::Forward => "FORWARD",
            WalkDirection::Backward => "BACKWARD",
            WalkDirection::TurnLeft => "LEFT",
            WalkDirection::TurnRight => "RIGHT",
        };
        f.write_str(name)
    }
}

/// 差分基线：控制板当前持有的序列及下发时的速度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    pub sequence: GaitSequence,
    pub speed: u8,
}

/// 控制器状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerStatus {
    pub port: String,
    pub open: bool,
    pub state: MovementState,
    pub speed: u8,
    pub baseline: Option<Baseline>,
    pub metrics: MetricsSnapshot,
}

/// 控制器
#[derive(Debug)]
pub struct Controller {
    session: Ssc32,
    model: RobotModel,
    /// 行走方向预设和热加载所基于的序列
    template: GaitSequence,
    baseline: Option<Baseline>,
    /// 最近一次下发的 (左, 右) 行程百分比，基线作废后用于全量重发
    travel: (i8, i8),
}

impl Controller {
    pub fn new(session: Ssc32, model: RobotModel, template: GaitSequence) -> Self {
        Self {
            session,
            model,
            template,
            baseline: None,
            travel: (
                template.travel_percentage_left,
                template.travel_percentage_right,
            ),
        }
    }

    /// 打开真实串口并创建控制器（速度 0，默认序列）
    #[cfg(feature = "hardware")]
    pub fn open(port: &str, baud_rate: u32, config: SessionConfig) -> Result<Self, DriverError> {
        let session = Ssc32::open(port, baud_rate, config)?;
        Ok(Self::new(session, RobotModel::default(), GaitSequence::default()))
    }

    /// 使用任意适配器创建控制器（速度 0，默认序列）
    pub fn with_adapter(adapter: impl SerialAdapter + 'static, config: SessionConfig) -> Self {
        Self::new(
            Ssc32::with_adapter(adapter, config),
            RobotModel::default(),
            GaitSequence::default(),
        )
    }

    /// 开始组装一条新指令
    pub fn command(&mut self) -> Command<'_> {
        Command::new(&mut self.session, &mut self.model)
    }

    pub fn model(&self) -> &RobotModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut RobotModel {
        &mut self.model
    }

    pub fn session(&self) -> &Ssc32 {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Ssc32 {
        &mut self.session
    }

    /// 当前序列模板
    pub fn sequence(&self) -> &GaitSequence {
        &self.template
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    /// 作废基线，下一次下发使用全量下发
    pub fn invalidate_baseline(&mut self) {
        self.baseline = None;
    }

    /// 全量下发序列并启动序列器
    pub fn start_sequence(&mut self, sequence: &GaitSequence) -> Result<(), DriverError> {
        let result = self.command().start_sequence(sequence)?.execute();
        self.commit(result, sequence)
    }

    /// 下发序列：有基线时差分下发，否则全量下发
    pub fn apply_sequence(&mut self, sequence: &GaitSequence) -> Result<(), DriverError> {
        let Some(baseline) = self.baseline else {
            return self.start_sequence(sequence);
        };
        let result = self
            .command()
            .update_sequence(&baseline.sequence, baseline.speed, sequence)?
            .execute();
        self.commit(result, sequence)
    }

    /// 按方向行走
    pub fn walk(&mut self, direction: WalkDirection) -> Result<(), DriverError> {
        let sequence = direction.sequence(&self.template);
        self.apply_sequence(&sequence)?;
        info!("{} (speed {})", direction, self.model.speed());
        Ok(())
    }

    /// 停止序列器（已停止时不产生任何写入）
    pub fn stop(&mut self) -> Result<(), DriverError> {
        self.command().stop_hex_sequencer().execute()?;
        info!("STOP");
        Ok(())
    }

    /// 设置速度
    ///
    /// 序列器运行中立即下发 `XS`，写入成功后才更新模型；否则只更新模型。
    pub fn set_speed(&mut self, speed: u8) -> Result<(), DriverError> {
        if self.model.is_walking() {
            self.command()
                .set_horizontal_speed_percentage(speed)?
                .execute()?;
            if let Some(baseline) = self.baseline.as_mut() {
                baseline.speed = speed;
            }
        }
        self.model.set_speed(speed)?;
        info!("Set speed to: {}", speed);
        Ok(())
    }

    /// 按增量调整速度（饱和到 0..=200），返回新速度
    pub fn adjust_speed(&mut self, delta: i16) -> Result<u8, DriverError> {
        let speed = self.model.adjusted_speed(delta);
        self.set_speed(speed)?;
        Ok(speed)
    }

    /// 在一行中移动多个舵机
    pub fn move_servos(&mut self, moves: &[(u8, u16)]) -> Result<(), DriverError> {
        if moves.is_empty() {
            return Err(DriverError::InvalidInput("no servo moves given".to_string()));
        }
        let mut command = self.command();
        for &(channel, pulse) in moves {
            command = command.single_servo(channel, pulse)?;
        }
        command.execute()
    }

    /// 在一行中释放多个舵机（`STOP{ch}`）
    pub fn release_servos(&mut self, channels: &[u8]) -> Result<(), DriverError> {
        if channels.is_empty() {
            return Err(DriverError::InvalidInput("no channels given".to_string()));
        }
        let mut command = self.command();
        for &channel in channels {
            command = command.stop_servo(channel)?;
        }
        command.execute()
    }

    /// 修改序列模板中的单个参数
    ///
    /// 序列器运行中时，同样的修改差分下发到当前行走的序列上；
    /// 基线已作废时按当前行程全量重发。
    pub fn set_parameter(&mut self, name: &str, value: i64) -> Result<(), DriverError> {
        let template = self.template.with_parameter(name, value)?;
        template.validate()?;
        if self.model.is_walking() {
            match self.baseline {
                Some(baseline) => {
                    let active = baseline.sequence.with_parameter(name, value)?;
                    self.apply_sequence(&active)?;
                },
                None => {
                    let (left, right) = self.travel;
                    self.start_sequence(&template.with_travel(left, right))?;
                },
            }
        }
        self.template = template;
        info!("Set {} to {}", name, value);
        Ok(())
    }

    /// 替换序列模板（配置文件热加载）
    ///
    /// 序列器运行中时，先停止再全量下发新序列（保持当前行走方向）。
    pub fn reload_sequence(&mut self, sequence: GaitSequence) -> Result<(), DriverError> {
        sequence.validate()?;
        self.template = sequence;
        if !self.model.is_walking() {
            debug!("Sequence template replaced while stopped");
            return Ok(());
        }
        let (left, right) = self.travel;
        let active = sequence.with_travel(left, right);
        self.start_sequence(&active)?;
        info!("Reloaded gait sequence while walking");
        Ok(())
    }

    pub fn get_version(&mut self) -> Result<FirmwareVersion, DriverError> {
        self.session.get_version()
    }

    pub fn query_movement_status(&mut self) -> Result<MovementStatus, DriverError> {
        self.session.query_movement_status()
    }

    pub fn query_pulse_width(&mut self, channel: u8) -> Result<u16, DriverError> {
        self.session.query_pulse_width(channel)
    }

    pub fn wait_until_movement_complete(&mut self) -> Result<MovementStatus, DriverError> {
        self.session.wait_until_movement_complete()
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            port: self.session.port_name().to_string(),
            open: self.session.is_open(),
            state: self.model.state(),
            speed: self.model.speed(),
            baseline: self.baseline,
            metrics: self.session.metrics(),
        }
    }

    /// 停止正在进行的行走并关闭串口
    pub fn close(&mut self) {
        if !self.session.is_open() {
            return;
        }
        if self.model.is_walking()
            && let Err(e) = self.stop()
        {
            error!("Failed to stop hex sequencer on shutdown: {}", e);
        }
        self.session.close();
    }

    /// 写入成功后更新基线；传输失败时作废基线
    ///
    /// 无论成败都记录本次行程，写入失败后控制板持有哪一版未知，
    /// 之后的全量重发以调用方最后请求的方向为准。
    fn commit(
        &mut self,
        result: Result<(), DriverError>,
        sequence: &GaitSequence,
    ) -> Result<(), DriverError> {
        self.travel = (
            sequence.travel_percentage_left,
            sequence.travel_percentage_right,
        );
        match result {
            Ok(()) => {
                self.baseline = Some(Baseline {
                    sequence: *sequence,
                    speed: self.model.speed(),
                });
                Ok(())
            },
            Err(e) => {
                if e.is_transport() {
                    self.baseline = None;
                }
                Err(e)
            },
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexbot_serial::{MockHandle, MockSerialAdapter};

    fn controller(speed: u8) -> (Controller, MockHandle) {
        let (adapter, handle) = MockSerialAdapter::new("mock");
        let mut ctl = Controller::with_adapter(adapter, SessionConfig::default());
        ctl.model_mut().set_speed(speed).unwrap();
        (ctl, handle)
    }

    #[test]
    fn test_walk_directions() {
        assert_eq!(WalkDirection::Forward.travel(), (100, 100));
        assert_eq!(WalkDirection::Backward.travel(), (-100, -100));
        assert_eq!(WalkDirection::TurnLeft.travel(), (100, -100));
        assert_eq!(WalkDirection::TurnRight.travel(), (-100, 100));
        assert_eq!(
            WalkDirection::TurnLeft.sequence(&GaitSequence::default()),
            GaitSequence::turn_left()
        );
    }

    #[test]
    fn test_first_walk_is_full_then_diff() {
        let (mut ctl, handle) = controller(50);
        ctl.walk(WalkDirection::Forward).unwrap();
        let first = handle.take_written_lines();
        assert_eq!(first.len(), 1);
        assert!(first[0].starts_with("LH 1600") && first[0].ends_with("XS 50\r"));

        ctl.walk(WalkDirection::Backward).unwrap();
        assert_eq!(handle.take_written_lines(), vec!["XL-100XR-100\r"]);
        assert_eq!(
            ctl.baseline().map(|b| b.sequence),
            Some(GaitSequence::backward())
        );
    }

    #[test]
    fn test_walk_after_stop_restarts_sequencer() {
        let (mut ctl, handle) = controller(50);
        ctl.walk(WalkDirection::Forward).unwrap();
        ctl.stop().unwrap();
        handle.take_written_lines();

        ctl.walk(WalkDirection::Forward).unwrap();
        assert_eq!(handle.take_written_lines(), vec!["XS 50\r"]);
        assert!(ctl.model().is_walking());
    }

    #[test]
    fn test_speed_sent_only_while_walking() {
        let (mut ctl, handle) = controller(50);
        assert_eq!(ctl.adjust_speed(10).unwrap(), 60);
        assert_eq!(handle.write_count(), 0);

        ctl.walk(WalkDirection::Forward).unwrap();
        handle.take_written_lines();
        assert_eq!(ctl.adjust_speed(-10).unwrap(), 50);
        assert_eq!(handle.take_written_lines(), vec!["XS 50\r"]);
        assert_eq!(ctl.baseline().map(|b| b.speed), Some(50));
    }

    #[test]
    fn test_speed_saturates() {
        let (mut ctl, _handle) = controller(195);
        assert_eq!(ctl.adjust_speed(10).unwrap(), 200);
        assert_eq!(ctl.adjust_speed(10).unwrap(), 200);
        assert!(ctl.set_speed(201).unwrap_err().is_validation());
        assert_eq!(ctl.model().speed(), 200);
    }

    #[test]
    fn test_failed_speed_write_keeps_model() {
        let (mut ctl, handle) = controller(50);
        ctl.walk(WalkDirection::Forward).unwrap();
        handle.set_fail_writes(true);
        assert!(ctl.set_speed(80).unwrap_err().is_transport());
        assert_eq!(ctl.model().speed(), 50);
    }

    #[test]
    fn test_failed_write_invalidates_baseline() {
        let (mut ctl, handle) = controller(50);
        ctl.walk(WalkDirection::Forward).unwrap();
        ctl.stop().unwrap();

        handle.set_fail_writes(true);
        assert!(ctl.walk(WalkDirection::Backward).is_err());
        assert!(ctl.baseline().is_none());
        assert_eq!(ctl.model().state(), MovementState::Stopped);

        handle.set_fail_writes(false);
        handle.take_written_lines();
        ctl.walk(WalkDirection::Backward).unwrap();
        let lines = handle.take_written_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("LH 1600"));
    }

    #[test]
    fn test_invalid_sequence_keeps_baseline() {
        let (mut ctl, handle) = controller(50);
        ctl.walk(WalkDirection::Forward).unwrap();
        handle.take_written_lines();
        let before = ctl.baseline().copied();

        let mut bad = GaitSequence::forward();
        bad.vertical_left_high = 3000;
        assert!(ctl.apply_sequence(&bad).unwrap_err().is_validation());
        assert_eq!(handle.write_count(), 0);
        assert_eq!(ctl.baseline().copied(), before);
        assert!(ctl.model().is_walking());
    }

    #[test]
    fn test_move_and_release_servos() {
        let (mut ctl, handle) = controller(0);
        ctl.move_servos(&[(6, 1000), (7, 1000), (22, 2000)]).unwrap();
        ctl.release_servos(&[6, 7, 22]).unwrap();
        assert_eq!(
            handle.written_lines(),
            vec!["#6P1000#7P1000#22P2000\r", "STOP6STOP7STOP22\r"]
        );
        assert!(matches!(
            ctl.move_servos(&[]),
            Err(DriverError::InvalidInput(_))
        ));
        assert!(ctl.release_servos(&[1, 32]).unwrap_err().is_validation());
        assert_eq!(handle.write_count(), 2);
    }

    #[test]
    fn test_set_parameter_while_walking_sends_diff() {
        let (mut ctl, handle) = controller(50);
        ctl.walk(WalkDirection::Forward).unwrap();
        handle.take_written_lines();

        ctl.set_parameter("horizontal_movement_time", 1200).unwrap();
        assert_eq!(handle.take_written_lines(), vec!["HT 1200\r"]);
        assert_eq!(ctl.sequence().horizontal_movement_time, 1200);
    }

    #[test]
    fn test_set_parameter_rejects_invalid_values() {
        let (mut ctl, handle) = controller(50);
        assert!(ctl.set_parameter("no_such", 1).unwrap_err().is_validation());
        assert!(
            ctl.set_parameter("vertical_left_high", 100)
                .unwrap_err()
                .is_validation()
        );
        assert_eq!(ctl.sequence(), &GaitSequence::default());
        assert_eq!(handle.write_count(), 0);
    }

    #[test]
    fn test_reload_while_walking_restarts() {
        let (mut ctl, handle) = controller(50);
        ctl.walk(WalkDirection::TurnLeft).unwrap();
        handle.take_written_lines();

        let mut reloaded = GaitSequence::default();
        reloaded.horizontal_movement_time = 1000;
        ctl.reload_sequence(reloaded).unwrap();

        let lines = handle.take_written_lines();
        assert_eq!(lines[0], "XSTOP\r");
        assert!(lines[1].contains("HT 1000XL100XR-100XS 50"));
        assert!(ctl.model().is_walking());
    }

    #[test]
    fn test_set_parameter_after_failed_update_restarts() {
        let (mut ctl, handle) = controller(50);
        ctl.walk(WalkDirection::Forward).unwrap();
        handle.set_fail_writes(true);
        assert!(ctl.walk(WalkDirection::Backward).unwrap_err().is_transport());
        assert!(ctl.baseline().is_none());
        assert!(ctl.model().is_walking());

        handle.set_fail_writes(false);
        handle.take_written_lines();
        ctl.set_parameter("horizontal_movement_time", 1200).unwrap();

        let lines = handle.take_written_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "XSTOP\r");
        assert!(lines[1].ends_with("HT 1200XL-100XR-100XS 50\r"));
        assert_eq!(
            ctl.baseline().map(|b| b.sequence),
            Some(GaitSequence {
                horizontal_movement_time: 1200,
                ..GaitSequence::backward()
            })
        );
        assert!(ctl.model().is_walking());
    }

    #[test]
    fn test_reload_rejects_invalid_sequence() {
        let (mut ctl, handle) = controller(50);
        let bad = GaitSequence {
            horizontal_movement_time: 0,
            ..GaitSequence::default()
        };
        assert!(ctl.reload_sequence(bad).unwrap_err().is_validation());
        assert_eq!(ctl.sequence(), &GaitSequence::default());

        ctl.walk(WalkDirection::Forward).unwrap();
        handle.take_written_lines();
        assert!(ctl.reload_sequence(bad).unwrap_err().is_validation());
        assert_eq!(handle.write_count(), 0);
        assert_eq!(ctl.sequence(), &GaitSequence::default());
        assert_eq!(
            ctl.baseline().map(|b| b.sequence),
            Some(GaitSequence::forward())
        );

        ctl.walk(WalkDirection::Backward).unwrap();
        assert_eq!(handle.take_written_lines(), vec!["XL-100XR-100\r"]);
    }

    #[test]
    fn test_reload_while_stopped_sends_nothing() {
        let (mut ctl, handle) = controller(50);
        let reloaded = GaitSequence::default().with_travel(10, 10);
        ctl.reload_sequence(reloaded).unwrap();
        assert_eq!(handle.write_count(), 0);
        assert_eq!(ctl.sequence(), &reloaded);
    }

    #[test]
    fn test_close_stops_walk() {
        let (mut ctl, handle) = controller(50);
        ctl.walk(WalkDirection::Forward).unwrap();
        handle.take_written_lines();
        drop(ctl);
        assert_eq!(handle.written_lines(), vec!["XSTOP\r"]);
        assert!(handle.is_closed());
    }

    #[test]
    fn test_status_snapshot() {
        let (mut ctl, _handle) = controller(40);
        ctl.walk(WalkDirection::Forward).unwrap();
        let status = ctl.status();
        assert_eq!(status.port, "mock");
        assert!(status.open);
        assert_eq!(status.state, MovementState::InWalkSequence);
        assert_eq!(status.speed, 40);
        assert_eq!(status.metrics.lines_written, 1);
    }
}

//! 单消费者指令队列
//!
//! 输入源（蓝牙、控制台、配置文件监听）各自运行在自己的线程上，只向队列发布
//! [`Intent`]；唯一的控制线程独占 [`Controller`] 并按顺序处理，
//! 串口上因此不会出现重叠写入。

use crate::controller::{Controller, ControllerStatus, WalkDirection};
use crate::error::DriverError;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use hexbot_protocol::{GaitSequence, MovementStatus};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// 指令队列容量
pub const INTENT_QUEUE_CAPACITY: usize = 10;

/// 速度调整步长
pub const SPEED_STEP: i16 = 10;

/// 输入源发布的意图
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// 按方向行走
    Walk(WalkDirection),
    /// 停止序列器
    Stop,
    /// 设置速度
    SetSpeed(u8),
    /// 调整速度（饱和到 0..=200）
    AdjustSpeed(i16),
    /// 下发序列（差分）
    ApplySequence(GaitSequence),
    /// 替换序列模板（热加载）
    ReloadSequence(GaitSequence),
    /// 修改序列模板中的单个参数
    SetParameter { name: String, value: i64 },
    /// 在一行中移动多个舵机
    MoveServos(Vec<(u8, u16)>),
    /// 在一行中释放多个舵机
    ReleaseServos(Vec<u8>),
    /// 查询控制器状态
    Status,
    /// 查询固件版本
    Version,
    /// 查询运动状态
    MovementStatus,
    /// 查询通道脉宽
    PulseWidth(u8),
    /// 阻塞直到运动完成
    WaitComplete,
}

/// 意图处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Done,
    Speed(u8),
    Status(ControllerStatus),
    Version(String),
    Movement(MovementStatus),
    PulseWidth(u16),
}

type ReplySender = Sender<Result<Reply, DriverError>>;

/// 在控制器上执行一个意图
pub fn dispatch(controller: &mut Controller, intent: Intent) -> Result<Reply, DriverError> {
    match intent {
        Intent::Walk(direction) => controller.walk(direction).map(|_| Reply::Done),
        Intent::Stop => controller.stop().map(|_| Reply::Done),
        Intent::SetSpeed(speed) => controller.set_speed(speed).map(|_| Reply::Speed(speed)),
        Intent::AdjustSpeed(delta) => controller.adjust_speed(delta).map(Reply::Speed),
        Intent::ApplySequence(sequence) => {
            controller.apply_sequence(&sequence).map(|_| Reply::Done)
        },
        Intent::ReloadSequence(sequence) => {
            controller.reload_sequence(sequence).map(|_| Reply::Done)
        },
        Intent::SetParameter { name, value } => {
            controller.set_parameter(&name, value).map(|_| Reply::Done)
        },
        Intent::MoveServos(moves) => controller.move_servos(&moves).map(|_| Reply::Done),
        Intent::ReleaseServos(channels) => {
            controller.release_servos(&channels).map(|_| Reply::Done)
        },
        Intent::Status => Ok(Reply::Status(controller.status())),
        Intent::Version => controller
            .get_version()
            .map(|version| Reply::Version(version.to_string())),
        Intent::MovementStatus => controller.query_movement_status().map(Reply::Movement),
        Intent::PulseWidth(channel) => controller.query_pulse_width(channel).map(Reply::PulseWidth),
        Intent::WaitComplete => controller.wait_until_movement_complete().map(Reply::Movement),
    }
}

/// 控制线程主循环
///
/// 队列的所有发送端关闭后退出，并在退出前停止正在进行的行走、关闭串口。
pub fn controller_loop(mut controller: Controller, rx: Receiver<(Intent, Option<ReplySender>)>) {
    info!("Controller loop started on {}", controller.session().port_name());
    for (intent, reply_tx) in rx.iter() {
        debug!("Handling {:?}", intent);
        let result = dispatch(&mut controller, intent);
        match reply_tx {
            Some(reply_tx) => {
                // 请求方可能已经放弃等待
                let _ = reply_tx.send(result);
            },
            None => {
                if let Err(e) = result {
                    error!("Intent failed: {}", e);
                }
            },
        }
    }
    controller.close();
    info!("Controller loop exited");
}

/// 控制线程句柄
///
/// Drop 时关闭队列并等待控制线程退出。
pub struct ControllerTask {
    tx: Option<Sender<(Intent, Option<ReplySender>)>>,
    handle: Option<JoinHandle<()>>,
}

impl ControllerTask {
    /// 把控制器移交给新的控制线程
    pub fn spawn(controller: Controller) -> Result<Self, DriverError> {
        let (tx, rx) = bounded(INTENT_QUEUE_CAPACITY);
        let handle = std::thread::Builder::new()
            .name("hexbot-controller".to_string())
            .spawn(move || controller_loop(controller, rx))
            .map_err(|e| DriverError::IoThread(e.to_string()))?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// 发布意图，不等待结果（失败只记录日志）
    ///
    /// 队列已满时返回 [`DriverError::ChannelFull`]，不阻塞输入源。
    pub fn send(&self, intent: Intent) -> Result<(), DriverError> {
        let tx = self.tx.as_ref().ok_or(DriverError::ChannelClosed)?;
        tx.try_send((intent, None)).map_err(|e| match e {
            TrySendError::Full(_) => DriverError::ChannelFull,
            TrySendError::Disconnected(_) => DriverError::ChannelClosed,
        })
    }

    /// 发布意图并等待结果
    pub fn request(&self, intent: Intent) -> Result<Reply, DriverError> {
        let tx = self.tx.as_ref().ok_or(DriverError::ChannelClosed)?;
        let (reply_tx, reply_rx) = bounded(1);
        tx.send((intent, Some(reply_tx)))
            .map_err(|_| DriverError::ChannelClosed)?;
        reply_rx.recv().map_err(|_| DriverError::ChannelClosed)?
    }

    /// 控制线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 关闭队列并等待控制线程退出
    pub fn shutdown(&mut self) {
        // 先释放发送端，控制线程才会看到队列断开
        self.tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Controller thread panicked");
        }
    }
}

impl Drop for ControllerTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssc32::SessionConfig;
    use crate::state::MovementState;
    use hexbot_serial::{MockHandle, MockSerialAdapter};

    fn task() -> (ControllerTask, MockHandle) {
        let (adapter, handle) = MockSerialAdapter::new("mock");
        let mut controller = Controller::with_adapter(adapter, SessionConfig::default());
        controller.model_mut().set_speed(50).unwrap();
        (ControllerTask::spawn(controller).unwrap(), handle)
    }

    #[test]
    fn test_requests_are_serialized() {
        let (task, handle) = task();
        assert_eq!(
            task.request(Intent::Walk(WalkDirection::Forward)).unwrap(),
            Reply::Done
        );
        assert_eq!(
            task.request(Intent::AdjustSpeed(SPEED_STEP)).unwrap(),
            Reply::Speed(60)
        );
        let Reply::Status(status) = task.request(Intent::Status).unwrap() else {
            panic!("expected status reply");
        };
        assert_eq!(status.state, MovementState::InWalkSequence);
        assert_eq!(status.speed, 60);

        let lines = handle.written_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "XS 60\r");
    }

    #[test]
    fn test_errors_are_returned_to_requester() {
        let (task, handle) = task();
        let err = task.request(Intent::ReleaseServos(vec![40])).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(handle.write_count(), 0);
        // 失败后控制线程继续工作
        assert_eq!(task.request(Intent::Stop).unwrap(), Reply::Done);
    }

    #[test]
    fn test_fire_and_forget_then_shutdown_stops_walk() {
        let (mut task, handle) = task();
        task.send(Intent::Walk(WalkDirection::Backward)).unwrap();
        task.shutdown();
        assert!(!task.is_running());

        let lines = handle.written_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("XL-100XR-100XS 50\r"));
        assert_eq!(lines[1], "XSTOP\r");
        assert!(handle.is_closed());

        assert!(matches!(
            task.send(Intent::Stop),
            Err(DriverError::ChannelClosed)
        ));
    }

    #[test]
    fn test_queries_through_task() {
        let (task, handle) = task();
        handle.queue_response("SSC32-V2.50USB");
        assert_eq!(
            task.request(Intent::Version).unwrap(),
            Reply::Version("SSC32-V2.50USB".to_string())
        );
        handle.queue_response(".");
        assert_eq!(
            task.request(Intent::MovementStatus).unwrap(),
            Reply::Movement(MovementStatus::Complete)
        );
        handle.queue_response([100u8]);
        assert_eq!(
            task.request(Intent::PulseWidth(3)).unwrap(),
            Reply::PulseWidth(1000)
        );
    }
}

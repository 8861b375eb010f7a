//! REPL 模式（交互式 Shell）
//!
//! 专用输入线程运行 rustyline 并通过通道把输入行交给主线程，
//! 主线程解析行协议并把意图提交给控制线程。

use anyhow::Result;
use crossbeam_channel::{Receiver, bounded};
use hexbot_driver::{ControllerTask, Intent};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::thread;

use crate::actions::{self, Action, ActionError, parse_action};
use crate::modes::oneshot::OneShotConfig;
use crate::utils::format_reply;

const HISTORY_PATH: &str = ".hexbot_history";

/// 输入线程发给主线程的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplEvent {
    Line(String),
    /// Ctrl+C：急停
    Interrupted,
}

/// REPL 输入（专用输入线程）
pub struct ReplInput {
    event_rx: Receiver<ReplEvent>,
    _input_thread: thread::JoinHandle<Result<()>>,
}

impl ReplInput {
    /// 创建专用输入线程（保留历史记录）
    pub fn new() -> Self {
        let (event_tx, event_rx) = bounded::<ReplEvent>(10);

        let input_thread = thread::spawn(move || {
            let mut rl = Editor::<(), DefaultHistory>::new()
                .map_err(|e| anyhow::anyhow!("Failed to initialize readline: {}", e))?;
            // 首次运行时没有历史文件
            rl.load_history(HISTORY_PATH).ok();

            loop {
                match rl.readline("hexbot> ") {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        let _ = rl.add_history_entry(line.clone());
                        if event_tx.send(ReplEvent::Line(line)).is_err() {
                            break;
                        }
                    },
                    Err(ReadlineError::Interrupted) => {
                        println!("^C");
                        if event_tx.send(ReplEvent::Interrupted).is_err() {
                            break;
                        }
                    },
                    Err(ReadlineError::Eof) => break,
                    Err(err) => {
                        eprintln!("Error: {:?}", err);
                        break;
                    },
                }
            }
            rl.save_history(HISTORY_PATH).ok();
            Ok(())
        });

        Self {
            event_rx,
            _input_thread: input_thread,
        }
    }

    /// 阻塞等待用户输入（输入线程退出后返回 None）
    pub fn recv(&self) -> Option<ReplEvent> {
        self.event_rx.recv().ok()
    }
}

/// 处理一行输入，返回 false 表示退出
pub fn handle_line(task: &ControllerTask, line: &str) -> bool {
    match parse_action(line) {
        Ok(Action::Quit) => return false,
        Ok(Action::Help) => println!("{}", actions::HELP),
        Ok(Action::Intent(intent)) => match task.request(intent) {
            Ok(reply) => println!("{}", format_reply(&reply)),
            Err(e) => eprintln!("❌ Error: {}", e),
        },
        Err(ActionError::Empty) => {},
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 输入 'help' 查看可用指令");
        },
    }
    true
}

/// 运行 REPL 模式
pub fn run_repl(config: &OneShotConfig) -> Result<()> {
    let controller = config.connect()?;
    let task = ControllerTask::spawn(controller)?;

    println!("HexBot CLI v{} - 交互式 Shell", env!("CARGO_PKG_VERSION"));
    println!("输入 'help' 查看帮助，'quit' 退出；Ctrl+C 停止行走");
    println!();

    let input = ReplInput::new();
    while let Some(event) = input.recv() {
        match event {
            ReplEvent::Line(line) => {
                if !handle_line(&task, &line) {
                    break;
                }
            },
            ReplEvent::Interrupted => {
                eprintln!("🛑 停止行走");
                if let Err(e) = task.request(Intent::Stop) {
                    eprintln!("❌ Error: {}", e);
                }
            },
        }
    }

    // Drop 时控制线程停止行走并关闭串口
    drop(task);
    println!("👋 再见！");
    Ok(())
}

use set_eden_core::TickTicket;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// 每秒一次的 tick 调度
///
/// 任何时候最多只有一个活着的 tick 任务：`start` 会先取消旧任务。
/// 取消后任务立即终止；已经进入通道的 tick 带着旧凭证，会被 `SetGame` 忽略。
#[derive(Debug, Default)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Ticker {
        Ticker { handle: None }
    }

    pub fn start(&mut self, ticket: TickTicket, tx: mpsc::Sender<TickTicket>) {
        self.cancel();
        let handle = tokio::spawn(async move {
            // 第一次 tick 在一秒之后，而不是立即触发
            let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(ticket).await.is_err() {
                    // 接收端已关闭，说明界面已经退出
                    break;
                }
            }
        });
        self.handle = Some(handle);
    }

    /// 取消当前的 tick 任务，返回是否真的取消了一个任务
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

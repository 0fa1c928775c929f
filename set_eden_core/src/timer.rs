use serde::{Deserialize, Serialize};

/// 倒计时的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerState {
    /// 没有进行中的回合
    Idle,
    /// 正在倒计时
    Running { remaining: u32 },
    /// 时间到，本回合不能再选牌
    Expired,
}

/// 一次倒计时的凭证。
///
/// 每次 `start` / `reset` 都会换一个新的凭证，拿着旧凭证的 tick 一律作废。
/// 这样即使取消前已经有 tick 排在队列里，它也不可能再改动计时器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickTicket(u64);

/// `Timer::tick` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 还在计时，附带剩余秒数
    Running(u32),
    /// 本次 tick 让时间归零。每次倒计时只会出现一次。
    Expired,
    /// 过期的凭证，或计时器不在运行
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Timer {
    state: TimerState,
    generation: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Timer::new()
    }
}

impl Timer {
    pub fn new() -> Timer {
        Timer { state: TimerState::Idle, generation: 0 }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// 开始一次新的倒计时，之前发出的凭证全部失效
    pub fn start(&mut self, duration_secs: u32) -> TickTicket {
        self.generation += 1;
        self.state = if duration_secs == 0 {
            TimerState::Expired
        } else {
            TimerState::Running { remaining: duration_secs }
        };
        TickTicket(self.generation)
    }

    /// 前进一秒
    pub fn tick(&mut self, ticket: TickTicket) -> TickOutcome {
        if ticket.0 != self.generation {
            return TickOutcome::Ignored;
        }
        match self.state {
            TimerState::Running { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.state = TimerState::Expired;
                    TickOutcome::Expired
                } else {
                    self.state = TimerState::Running { remaining };
                    TickOutcome::Running(remaining)
                }
            }
            TimerState::Idle | TimerState::Expired => TickOutcome::Ignored,
        }
    }

    /// 回到 Idle，并让当前凭证失效
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = TimerState::Idle;
    }

    pub fn remaining(&self) -> u32 {
        match self.state {
            TimerState::Running { remaining } => remaining,
            TimerState::Idle | TimerState::Expired => 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }
}

/// 把秒数格式化为 `mm:ss`，例如 75 -> `01:15`
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

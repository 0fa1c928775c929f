use crate::card::Card;
use crate::state::RoundConfig;
use crate::timer::TickTicket;
use serde::{Deserialize, Serialize};

// --- 界面 -> 控制器 的输入 ---
// 界面层（终端 UI）把按键、鼠标点击和定时 tick 统一翻译成这些输入。

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// 用选定的难度和时长开始新的一局
    StartRound(RoundConfig),
    /// 选中（或取消选中）桌面上某个位置的牌
    SelectCard(usize),
    /// 重新发一整桌牌，分数和计时不变
    RefreshBoard,
    /// 返回菜单，结束本局
    EndRound,
    /// 计时器前进一秒
    Tick(TickTicket),
}

// --- 控制器 -> 界面 的事件 ---
// 控制器处理完一个输入后返回的状态变化通知，界面据此重绘。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// 新的一局开始。界面需要用 `ticket` 启动每秒一次的 tick。
    RoundStarted {
        config: RoundConfig,
        board: Vec<Card>,
        ticket: TickTicket,
    },

    /// 当前选中的位置（按选择顺序）
    SelectionChanged { selected: Vec<usize> },

    /// 三张牌组成了 Set，已被原地替换
    SetFound {
        slots: [usize; 3],
        cards: [Card; 3],
        replacements: [Card; 3],
        score: u32,
    },

    /// 三张牌不是 Set，桌面不变
    NotASet { slots: [usize; 3], cards: [Card; 3] },

    /// 整桌重新发牌
    BoardDealt { board: Vec<Card> },

    /// 剩余时间
    TimerTicked { remaining: u32 },

    /// 时间到，本局不能再选牌
    OutOfTime { score: u32 },

    /// 返回菜单，附带本局最终得分
    RoundEnded { score: u32 },
}

//! # Set 游戏核心逻辑库
//!
//! 这个 `core` crate 包含了 Set 纸牌游戏的全部规则和状态：
//! 牌的属性模型、Set 判定、不重复的随机发牌、倒计时状态机，
//! 以及把它们串起来的回合控制器 `SetGame`。
//! 它不依赖任何界面实现，终端客户端只负责把按键和定时 tick
//! 翻译成 `PlayerInput`，再根据返回的 `GameEvent` 重绘。

mod card;
mod error;
mod logic;
mod message;
mod state;
mod timer;

pub use card::*;

pub use error::*;

pub use message::*;

pub use state::*;

pub use timer::*;

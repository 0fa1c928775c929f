use thiserror::Error;

use crate::card::Difficulty;

/// 解析牌面编码或难度名称时的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCardError {
    #[error("card code must have 4 parts separated by '-', got {0}")]
    WrongArity(usize),
    #[error("unknown card attribute '{0}'")]
    UnknownAttribute(String),
    #[error("unknown difficulty '{0}', expected 'easy' or 'hard'")]
    UnknownDifficulty(String),
}

/// 游戏逻辑中可能出现的错误
///
/// 没凑成 Set 不算错误，那是正常的游戏结果（见 `GameEvent::NotASet`）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// 该难度下所有可能的牌都已经在桌面上了
    #[error("no unused {difficulty} card left ({in_use} cards in use)")]
    CardSpaceExhausted { difficulty: Difficulty, in_use: usize },
    #[error("slot {slot} is not on the board (board has {board_size} cards)")]
    NoSuchSlot { slot: usize, board_size: usize },
    #[error("slot {0} appears more than once")]
    DuplicateSlot(usize),
    #[error("round duration must be at least one second")]
    InvalidDuration,
}

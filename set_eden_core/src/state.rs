use crate::card::{generate_unique_card, Card, Difficulty};
use crate::error::GameError;
use crate::timer::Timer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 菜单中可选的回合时长（秒）
pub const DURATION_PRESETS: [u32; 3] = [60, 180, 300];
pub const DEFAULT_DURATION_SECS: u32 = 60;

/// 一个回合开始时由玩家选定的配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub difficulty: Difficulty,
    pub duration_secs: u32,
}

impl RoundConfig {
    pub fn new(difficulty: Difficulty, duration_secs: u32) -> Result<RoundConfig, GameError> {
        if duration_secs == 0 {
            return Err(GameError::InvalidDuration);
        }
        Ok(RoundConfig { difficulty, duration_secs })
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        RoundConfig { difficulty: Difficulty::Easy, duration_secs: DEFAULT_DURATION_SECS }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    /// 菜单界面，没有进行中的回合
    Menu,
    /// 回合进行中，可以选牌
    Playing,
    /// 时间到，桌面保留但不能再选牌
    OutOfTime,
}

/// 桌面 (Board)
///
/// 有序的牌列表，外加一个集合索引用于 O(1) 判重。
/// 两者始终一致：桌面上不会有两张相同的牌。
#[derive(Debug, Clone, Default)]
pub struct Board {
    cards: Vec<Card>,
    index: HashSet<Card>,
}

impl Board {
    /// 按难度发一整桌互不相同的牌
    pub fn deal<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Result<Board, GameError> {
        let size = difficulty.board_size();
        let mut board = Board {
            cards: Vec::with_capacity(size),
            index: HashSet::with_capacity(size),
        };
        for _ in 0..size {
            let card = generate_unique_card(difficulty, &board.index, rng)?;
            board.index.insert(card);
            board.cards.push(card);
        }
        Ok(board)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<Card> {
        self.cards.get(slot).copied()
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.index.contains(card)
    }

    /// 把指定位置的牌原地换成新牌
    ///
    /// 新牌既不能和替换前桌面上的任何一张牌相同（包括被换掉的那几张），
    /// 彼此之间也不能相同。返回按 `slots` 顺序排列的新牌。
    /// `slots` 中有重复位置时拒绝替换，桌面保持不变。
    pub fn replace<R: Rng + ?Sized>(
        &mut self,
        slots: [usize; 3],
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<[Card; 3], GameError> {
        for (i, &slot) in slots.iter().enumerate() {
            if slot >= self.cards.len() {
                return Err(GameError::NoSuchSlot { slot, board_size: self.cards.len() });
            }
            if slots[..i].contains(&slot) {
                return Err(GameError::DuplicateSlot(slot));
            }
        }

        let mut excluded = self.index.clone();
        let mut fresh = [self.cards[slots[0]]; 3];
        for card in fresh.iter_mut() {
            *card = generate_unique_card(difficulty, &excluded, rng)?;
            excluded.insert(*card);
        }

        for (&slot, &card) in slots.iter().zip(fresh.iter()) {
            let old = std::mem::replace(&mut self.cards[slot], card);
            self.index.remove(&old);
        }
        self.index.extend(fresh);
        Ok(fresh)
    }
}

/// 一局游戏的全部状态，由唯一的控制器实例持有
///
/// 操作见 `logic.rs`。
#[derive(Debug, Clone)]
pub struct SetGame {
    pub(crate) config: RoundConfig,
    pub(crate) phase: GamePhase,
    pub(crate) board: Board,
    // 按选择顺序记录的桌面位置，最多 3 个
    pub(crate) selection: Vec<usize>,
    pub(crate) score: u32,
    pub(crate) timer: Timer,
    pub(crate) rng: StdRng,
}

impl SetGame {
    /// 使用系统随机源
    pub fn new() -> SetGame {
        SetGame::with_rng(StdRng::from_os_rng())
    }

    /// 固定种子，发牌顺序可复现
    pub fn with_seed(seed: u64) -> SetGame {
        SetGame::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> SetGame {
        SetGame {
            config: RoundConfig::default(),
            phase: GamePhase::Menu,
            board: Board::default(),
            selection: Vec::with_capacity(3),
            score: 0,
            timer: Timer::new(),
            rng,
        }
    }

    pub fn config(&self) -> RoundConfig {
        self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// 只有回合进行中才接受选牌和刷新
    pub fn accepts_input(&self) -> bool {
        self.phase == GamePhase::Playing
    }
}

impl Default for SetGame {
    fn default() -> Self {
        SetGame::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Shading;

    #[test]
    fn test_round_config_rejects_zero_duration() {
        assert_eq!(RoundConfig::new(Difficulty::Hard, 0), Err(GameError::InvalidDuration));
        let config = RoundConfig::new(Difficulty::Hard, 75).unwrap();
        assert_eq!(config.duration_secs, 75);
    }

    #[test]
    fn test_deal_sizes_and_uniqueness() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let easy = Board::deal(Difficulty::Easy, &mut rng).unwrap();
            assert_eq!(easy.len(), 9);
            assert!(easy.cards().iter().all(|c| c.shading == Shading::Solid));
            let unique: HashSet<_> = easy.cards().iter().collect();
            assert_eq!(unique.len(), 9);

            let hard = Board::deal(Difficulty::Hard, &mut rng).unwrap();
            assert_eq!(hard.len(), 12);
            let unique: HashSet<_> = hard.cards().iter().collect();
            assert_eq!(unique.len(), 12);
        }
    }

    #[test]
    fn test_replace_keeps_board_unique() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let mut board = Board::deal(Difficulty::Easy, &mut rng).unwrap();
            let before: Vec<Card> = board.cards().to_vec();

            let fresh = board.replace([0, 4, 8], Difficulty::Easy, &mut rng).unwrap();

            // 新牌不会和替换前桌面上的任何牌重复
            for card in &fresh {
                assert!(!before.contains(card));
            }
            assert_eq!(board.get(0), Some(fresh[0]));
            assert_eq!(board.get(4), Some(fresh[1]));
            assert_eq!(board.get(8), Some(fresh[2]));
            for slot in [1, 2, 3, 5, 6, 7] {
                assert_eq!(board.get(slot), Some(before[slot]));
            }

            let unique: HashSet<_> = board.cards().iter().collect();
            assert_eq!(unique.len(), 9);
            assert!(board.cards().iter().all(|c| board.contains(c)));
            for old in [before[0], before[4], before[8]] {
                assert!(!board.contains(&old));
            }
        }
    }

    #[test]
    fn test_replace_rejects_unknown_slot() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut board = Board::deal(Difficulty::Easy, &mut rng).unwrap();
        let before = board.cards().to_vec();
        assert_eq!(
            board.replace([0, 1, 9], Difficulty::Easy, &mut rng),
            Err(GameError::NoSuchSlot { slot: 9, board_size: 9 })
        );
        assert_eq!(board.cards(), &before[..]);
    }

    #[test]
    fn test_replace_rejects_repeated_slot() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut board = Board::deal(Difficulty::Easy, &mut rng).unwrap();
        let before = board.cards().to_vec();
        assert_eq!(
            board.replace([0, 0, 1], Difficulty::Easy, &mut rng),
            Err(GameError::DuplicateSlot(0))
        );
        assert_eq!(
            board.replace([2, 5, 5], Difficulty::Easy, &mut rng),
            Err(GameError::DuplicateSlot(5))
        );

        // 桌面和索引仍然一致
        assert_eq!(board.cards(), &before[..]);
        assert_eq!(board.index.len(), board.len());
        assert!(board.cards().iter().all(|c| board.contains(c)));
    }

    #[test]
    fn test_new_game_starts_in_menu() {
        let game = SetGame::with_seed(0);
        assert_eq!(game.phase(), GamePhase::Menu);
        assert!(game.board().is_empty());
        assert_eq!(game.score(), 0);
        assert!(!game.accepts_input());
    }
}

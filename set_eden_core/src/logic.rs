use crate::card::is_set;
use crate::error::GameError;
use crate::message::{GameEvent, PlayerInput};
use crate::state::{Board, GamePhase, RoundConfig, SetGame};
use crate::timer::{TickOutcome, TickTicket};
use tracing::{debug, info, trace};

// --- 核心游戏流程函数 ---

impl SetGame {
    /// 处理一个输入，返回需要通知界面的事件
    ///
    /// 回合不在进行中时，选牌和刷新会被直接忽略（返回空列表），
    /// 这相当于网页版里移除点击监听器，但不需要反复增删监听器。
    pub fn handle(&mut self, input: PlayerInput) -> Result<Vec<GameEvent>, GameError> {
        match input {
            PlayerInput::StartRound(config) => self.start_round(config),
            PlayerInput::SelectCard(slot) => self.select_card(slot),
            PlayerInput::RefreshBoard => self.refresh_board(),
            PlayerInput::EndRound => Ok(self.end_round()),
            PlayerInput::Tick(ticket) => Ok(self.tick(ticket)),
        }
    }

    /// 开始新的一局
    ///
    /// - 按难度发 9 或 12 张互不相同的牌。
    /// - 分数清零，清空选择。
    /// - 启动倒计时，返回的 `RoundStarted` 里带着本局的 tick 凭证。
    ///
    /// 回合进行中再次调用相当于重开，旧的 tick 凭证随之作废。
    /// 时长为 0 的配置被拒绝，状态保持不变。
    pub fn start_round(&mut self, config: RoundConfig) -> Result<Vec<GameEvent>, GameError> {
        // `RoundConfig` 的字段是公开的，不能只依赖 `RoundConfig::new` 的校验
        if config.duration_secs == 0 {
            return Err(GameError::InvalidDuration);
        }
        // 先发牌，失败时不改动任何状态
        let board = Board::deal(config.difficulty, &mut self.rng)?;

        self.config = config;
        self.board = board;
        self.selection.clear();
        self.score = 0;
        let ticket = self.timer.start(config.duration_secs);
        self.phase = GamePhase::Playing;

        info!(difficulty = %config.difficulty, duration = config.duration_secs, "round started");
        Ok(vec![GameEvent::RoundStarted {
            config,
            board: self.board.cards().to_vec(),
            ticket,
        }])
    }

    /// 选中桌面上的一张牌
    ///
    /// 再次点击已选中的牌会取消选中。凑满三张时立即清空选择，
    /// 然后只判定一次：
    /// - 是 Set：分数加一，三张牌原地换成新牌。
    /// - 不是 Set：桌面不变，界面短暂提示。
    pub fn select_card(&mut self, slot: usize) -> Result<Vec<GameEvent>, GameError> {
        if !self.accepts_input() {
            trace!(slot, phase = ?self.phase, "selection ignored");
            return Ok(vec![]);
        }
        if slot >= self.board.len() {
            return Err(GameError::NoSuchSlot { slot, board_size: self.board.len() });
        }

        if let Some(pos) = self.selection.iter().position(|&s| s == slot) {
            self.selection.remove(pos);
            return Ok(vec![GameEvent::SelectionChanged { selected: self.selection.clone() }]);
        }

        self.selection.push(slot);
        if self.selection.len() < 3 {
            return Ok(vec![GameEvent::SelectionChanged { selected: self.selection.clone() }]);
        }

        let slots = [self.selection[0], self.selection[1], self.selection[2]];
        self.selection.clear();
        let mut events = vec![GameEvent::SelectionChanged { selected: vec![] }];

        let board = self.board.cards();
        let cards = slots.map(|s| board[s]);
        if is_set(&cards[0], &cards[1], &cards[2]) {
            let replacements = self.board.replace(slots, self.config.difficulty, &mut self.rng)?;
            self.score += 1;
            debug!(
                cards = %format!("{} {} {}", cards[0], cards[1], cards[2]),
                score = self.score,
                "set found"
            );
            events.push(GameEvent::SetFound { slots, cards, replacements, score: self.score });
        } else {
            debug!(cards = %format!("{} {} {}", cards[0], cards[1], cards[2]), "not a set");
            events.push(GameEvent::NotASet { slots, cards });
        }
        Ok(events)
    }

    /// 整桌重新发牌，分数和剩余时间不变
    pub fn refresh_board(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if !self.accepts_input() {
            return Ok(vec![]);
        }
        self.board = Board::deal(self.config.difficulty, &mut self.rng)?;
        self.selection.clear();
        debug!("board refreshed");
        Ok(vec![GameEvent::BoardDealt { board: self.board.cards().to_vec() }])
    }

    /// 计时器前进一秒
    ///
    /// 旧凭证的 tick 被忽略。时间归零时进入 `OutOfTime`，清空选择。
    pub fn tick(&mut self, ticket: TickTicket) -> Vec<GameEvent> {
        match self.timer.tick(ticket) {
            TickOutcome::Running(remaining) => {
                trace!(remaining, "tick");
                vec![GameEvent::TimerTicked { remaining }]
            }
            TickOutcome::Expired => {
                self.phase = GamePhase::OutOfTime;
                let mut events = vec![GameEvent::TimerTicked { remaining: 0 }];
                if !self.selection.is_empty() {
                    self.selection.clear();
                    events.push(GameEvent::SelectionChanged { selected: vec![] });
                }
                info!(score = self.score, "out of time");
                events.push(GameEvent::OutOfTime { score: self.score });
                events
            }
            TickOutcome::Ignored => {
                trace!(?ticket, "stale tick ignored");
                vec![]
            }
        }
    }

    /// 返回菜单：停止计时、分数清零
    pub fn end_round(&mut self) -> Vec<GameEvent> {
        if self.phase == GamePhase::Menu {
            return vec![];
        }
        let score = self.score;
        self.timer.reset();
        self.score = 0;
        self.selection.clear();
        self.board = Board::default();
        self.phase = GamePhase::Menu;

        info!(score, "round ended");
        vec![GameEvent::RoundEnded { score }]
    }
}

// --- 单元测试 ---

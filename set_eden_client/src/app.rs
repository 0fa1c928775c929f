use std::error::Error;
use std::time::Duration;

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tui::Terminal;
use tui::backend::Backend;
use tui::layout::Rect;

use set_eden_core::{
    Difficulty, GameError, GameEvent, GamePhase, PlayerInput, RoundConfig, SetGame, TickTicket,
    DURATION_PRESETS,
};

use crate::ticker::Ticker;
use crate::ui;

/// "SET!" / "Not a Set" 提示的显示时长
pub const FLASH_DURATION: Duration = Duration::from_secs(1);
/// 检查提示是否过期的频率
const FRAME_PERIOD: Duration = Duration::from_millis(100);

/// 选牌快捷键，依次对应桌面位置 0..12
const SLOT_KEYS: [char; 12] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l'];

/// 桌面固定为 3 行
pub const BOARD_ROWS: usize = 3;

/// 按键或鼠标翻译出来的界面命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    StartRound,
    EndRound,
    Refresh,
    Select(usize),
    SelectAtCursor,
    MoveCursor { dx: i32, dy: i32 },
    ToggleDifficulty,
    NextDuration,
    PrevDuration,
    None,
}

/// 菜单里正在编辑的回合配置
#[derive(Debug, Clone)]
pub struct MenuState {
    pub difficulty: Difficulty,
    pub durations: Vec<u32>,
    pub duration_idx: usize,
}

impl MenuState {
    /// 预设时长加上命令行指定的时长，去重排序
    pub fn new(config: RoundConfig) -> MenuState {
        let mut durations: Vec<u32> = DURATION_PRESETS.to_vec();
        if !durations.contains(&config.duration_secs) {
            durations.push(config.duration_secs);
        }
        durations.sort_unstable();
        let duration_idx = durations
            .iter()
            .position(|&d| d == config.duration_secs)
            .unwrap_or(0);
        MenuState { difficulty: config.difficulty, durations, duration_idx }
    }

    pub fn duration_secs(&self) -> u32 {
        self.durations[self.duration_idx]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    SetFound,
    NotASet,
}

/// 短暂覆盖在三张牌上的结果提示
#[derive(Debug, Clone, Copy)]
pub struct Flash {
    pub kind: FlashKind,
    pub slots: [usize; 3],
    pub until: Instant,
}

pub struct App {
    pub game: SetGame,
    pub menu: MenuState,
    pub cursor: usize,
    /// 仍在显示的结果提示，后来的在后面；同一张牌最多出现在一个提示里
    pub flashes: Vec<Flash>,
    /// 上一局结束时的得分，显示在菜单上
    pub last_score: Option<u32>,
    /// 最近一次绘制时每张牌所占的区域，用于鼠标点击
    pub card_areas: Vec<Rect>,
    pub should_quit: bool,
    ticker: Ticker,
    tick_tx: mpsc::Sender<TickTicket>,
}

impl App {
    pub fn new(game: SetGame, config: RoundConfig, tick_tx: mpsc::Sender<TickTicket>) -> App {
        App {
            game,
            menu: MenuState::new(config),
            cursor: 0,
            flashes: vec![],
            last_score: None,
            card_areas: vec![],
            should_quit: false,
            ticker: Ticker::new(),
            tick_tx,
        }
    }

    pub fn ticking(&self) -> bool {
        self.ticker.is_active()
    }

    /// 桌面的列数（9 张为 3 列，12 张为 4 列）
    pub fn columns(&self) -> usize {
        (self.game.board().len() / BOARD_ROWS).max(1)
    }

    pub fn command_for_key(&self, key: KeyEvent) -> Command {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Command::Quit;
        }
        match self.game.phase() {
            GamePhase::Menu => match key.code {
                KeyCode::Enter | KeyCode::Char('s') => Command::StartRound,
                KeyCode::Left | KeyCode::Right | KeyCode::Char('d') => Command::ToggleDifficulty,
                KeyCode::Up => Command::PrevDuration,
                KeyCode::Down | KeyCode::Char('t') => Command::NextDuration,
                KeyCode::Esc | KeyCode::Char('q') => Command::Quit,
                _ => Command::None,
            },
            GamePhase::Playing | GamePhase::OutOfTime => match key.code {
                KeyCode::Esc | KeyCode::Backspace => Command::EndRound,
                KeyCode::Char('r') => Command::Refresh,
                KeyCode::Enter | KeyCode::Char(' ') => Command::SelectAtCursor,
                KeyCode::Left => Command::MoveCursor { dx: -1, dy: 0 },
                KeyCode::Right => Command::MoveCursor { dx: 1, dy: 0 },
                KeyCode::Up => Command::MoveCursor { dx: 0, dy: -1 },
                KeyCode::Down => Command::MoveCursor { dx: 0, dy: 1 },
                KeyCode::Char(c) => match SLOT_KEYS.iter().position(|&k| k == c) {
                    Some(slot) if slot < self.game.board().len() => Command::Select(slot),
                    _ => Command::None,
                },
                _ => Command::None,
            },
        }
    }

    pub fn command_for_mouse(&self, event: MouseEvent) -> Command {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return Command::None;
        }
        if self.game.phase() == GamePhase::Menu {
            return Command::None;
        }
        self.card_areas
            .iter()
            .position(|area| {
                event.column >= area.x
                    && event.column < area.x + area.width
                    && event.row >= area.y
                    && event.row < area.y + area.height
            })
            .map_or(Command::None, Command::Select)
    }

    pub fn apply(&mut self, command: Command) -> Result<(), GameError> {
        match command {
            Command::Quit => {
                self.ticker.cancel();
                self.should_quit = true;
                Ok(())
            }
            Command::StartRound => {
                let config = RoundConfig::new(self.menu.difficulty, self.menu.duration_secs())?;
                self.dispatch(PlayerInput::StartRound(config))
            }
            Command::EndRound => self.dispatch(PlayerInput::EndRound),
            Command::Refresh => self.dispatch(PlayerInput::RefreshBoard),
            Command::Select(slot) => {
                self.cursor = slot;
                self.dispatch(PlayerInput::SelectCard(slot))
            }
            Command::SelectAtCursor => self.dispatch(PlayerInput::SelectCard(self.cursor)),
            Command::MoveCursor { dx, dy } => {
                self.move_cursor(dx, dy);
                Ok(())
            }
            Command::ToggleDifficulty => {
                self.menu.difficulty = match self.menu.difficulty {
                    Difficulty::Easy => Difficulty::Hard,
                    Difficulty::Hard => Difficulty::Easy,
                };
                Ok(())
            }
            Command::NextDuration => {
                self.menu.duration_idx = (self.menu.duration_idx + 1) % self.menu.durations.len();
                Ok(())
            }
            Command::PrevDuration => {
                let n = self.menu.durations.len();
                self.menu.duration_idx = (self.menu.duration_idx + n - 1) % n;
                Ok(())
            }
            Command::None => Ok(()),
        }
    }

    pub fn on_tick(&mut self, ticket: TickTicket) -> Result<(), GameError> {
        self.dispatch(PlayerInput::Tick(ticket))
    }

    /// 清除已经到期的提示，每条提示按自己的截止时间过期
    pub fn expire_flash(&mut self, now: Instant) {
        self.flashes.retain(|f| now < f.until);
    }

    /// 当前覆盖在 `slot` 上的提示
    pub fn flash_for(&self, slot: usize) -> Option<FlashKind> {
        self.flashes
            .iter()
            .rev()
            .find(|f| f.slots.contains(&slot))
            .map(|f| f.kind)
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let len = self.game.board().len();
        if len == 0 {
            return;
        }
        let cols = self.columns() as i32;
        let rows = (len as i32 + cols - 1) / cols;
        let col = (self.cursor as i32 % cols + dx).rem_euclid(cols);
        let row = (self.cursor as i32 / cols + dy).rem_euclid(rows);
        self.cursor = ((row * cols + col) as usize).min(len - 1);
    }

    fn dispatch(&mut self, input: PlayerInput) -> Result<(), GameError> {
        for event in self.game.handle(input)? {
            self.on_event(event);
        }
        Ok(())
    }

    fn on_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::RoundStarted { config, ticket, .. } => {
                debug!(difficulty = %config.difficulty, "starting tick schedule");
                self.ticker.start(ticket, self.tick_tx.clone());
                self.cursor = 0;
                self.flashes.clear();
                self.last_score = None;
            }
            GameEvent::SetFound { slots, score, .. } => {
                debug!(?slots, score, "set found");
                self.flash_slots(FlashKind::SetFound, slots);
            }
            GameEvent::NotASet { slots, .. } => {
                debug!(?slots, "not a set");
                self.flash_slots(FlashKind::NotASet, slots);
            }
            GameEvent::BoardDealt { .. } => {
                self.flashes.clear();
            }
            GameEvent::OutOfTime { score } => {
                debug!(score, "out of time, stopping tick schedule");
                self.ticker.cancel();
            }
            GameEvent::RoundEnded { score } => {
                info!(score, "back to menu");
                self.ticker.cancel();
                self.flashes.clear();
                self.card_areas.clear();
                self.last_score = Some(score);
            }
            GameEvent::SelectionChanged { .. } | GameEvent::TimerTicked { .. } => {}
        }
    }

    fn flash_slots(&mut self, kind: FlashKind, slots: [usize; 3]) {
        // 新结果盖住同位置上的旧提示，其余提示照常显示到各自过期
        self.flashes.retain(|f| !f.slots.iter().any(|s| slots.contains(s)));
        self.flashes.push(Flash { kind, slots, until: Instant::now() + FLASH_DURATION });
    }
}

/// 主事件循环：按键、鼠标、tick 和提示过期都在这里串行处理
pub async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    mut tick_rx: mpsc::Receiver<TickTicket>,
) -> Result<(), Box<dyn Error>> {
    let mut events = EventStream::new();
    let mut frame = tokio::time::interval(FRAME_PERIOD);

    loop {
        terminal.draw(|f| ui::draw(f, &mut app))?;
        if app.should_quit {
            break;
        }

        let result = tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    let command = app.command_for_key(key);
                    app.apply(command)
                }
                Some(Ok(Event::Mouse(mouse))) => {
                    let command = app.command_for_mouse(mouse);
                    app.apply(command)
                }
                Some(Ok(_)) => Ok(()),
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(ticket) = tick_rx.recv() => app.on_tick(ticket),
            _ = frame.tick() => {
                app.expire_flash(Instant::now());
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("input rejected: {}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn app(difficulty: Difficulty, secs: u32) -> (App, mpsc::Receiver<TickTicket>) {
        let (tx, rx) = mpsc::channel(8);
        let config = RoundConfig::new(difficulty, secs).unwrap();
        (App::new(SetGame::with_seed(5), config, tx), rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        let command = app.command_for_key(key(code));
        app.apply(command).unwrap();
    }

    #[test]
    fn test_menu_includes_cli_duration() {
        let menu = MenuState::new(RoundConfig::new(Difficulty::Hard, 75).unwrap());
        assert_eq!(menu.durations, vec![60, 75, 180, 300]);
        assert_eq!(menu.duration_secs(), 75);

        let menu = MenuState::new(RoundConfig::new(Difficulty::Easy, 180).unwrap());
        assert_eq!(menu.durations, vec![60, 180, 300]);
        assert_eq!(menu.duration_secs(), 180);
    }

    #[tokio::test]
    async fn test_menu_keys_configure_round() {
        let (mut app, _rx) = app(Difficulty::Easy, 60);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.menu.difficulty, Difficulty::Hard);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.menu.duration_secs(), 180);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.menu.duration_secs(), 300);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.game.phase(), GamePhase::Playing);
        assert_eq!(app.game.board().len(), 12);
        assert_eq!(app.game.timer().remaining(), 300);
        assert!(app.ticking());
    }

    #[tokio::test]
    async fn test_slot_keys_respect_board_size() {
        let (mut app, _rx) = app(Difficulty::Easy, 60);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.command_for_key(key(KeyCode::Char('a'))), Command::Select(0));
        assert_eq!(app.command_for_key(key(KeyCode::Char('i'))), Command::Select(8));
        // 简单模式只有 9 张牌
        assert_eq!(app.command_for_key(key(KeyCode::Char('j'))), Command::None);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.game.selection(), &[2]);
        assert_eq!(app.cursor, 2);
    }

    #[tokio::test]
    async fn test_cursor_wraps_around_grid() {
        let (mut app, _rx) = app(Difficulty::Hard, 60);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.columns(), 4);

        press(&mut app, KeyCode::Left);
        assert_eq!(app.cursor, 3);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.cursor, 11);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.cursor, 3);

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.game.selection(), &[3]);
    }

    #[tokio::test]
    async fn test_click_selects_card_under_pointer() {
        let (mut app, _rx) = app(Difficulty::Easy, 60);
        press(&mut app, KeyCode::Enter);
        app.card_areas = vec![Rect::new(0, 0, 10, 5), Rect::new(10, 0, 10, 5)];

        assert_eq!(app.command_for_mouse(click(12, 3)), Command::Select(1));
        assert_eq!(app.command_for_mouse(click(9, 4)), Command::Select(0));
        assert_eq!(app.command_for_mouse(click(25, 1)), Command::None);
    }

    #[tokio::test]
    async fn test_three_selections_flash_outcome() {
        let (mut app, _rx) = app(Difficulty::Hard, 60);
        press(&mut app, KeyCode::Enter);
        for c in ['a', 'b', 'c'] {
            press(&mut app, KeyCode::Char(c));
        }

        assert_eq!(app.flashes.len(), 1);
        let flash = app.flashes[0];
        assert_eq!(flash.slots, [0, 1, 2]);
        assert_eq!(app.flash_for(1), Some(flash.kind));
        assert_eq!(app.flash_for(3), None);
        assert!(app.game.selection().is_empty());
        let expected_score = u32::from(flash.kind == FlashKind::SetFound);
        assert_eq!(app.game.score(), expected_score);

        app.expire_flash(flash.until - Duration::from_millis(1));
        assert_eq!(app.flashes.len(), 1);
        app.expire_flash(flash.until);
        assert!(app.flashes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_outcomes_keep_their_own_flash() {
        let (mut app, _rx) = app(Difficulty::Hard, 60);
        press(&mut app, KeyCode::Enter);
        for c in ['a', 'b', 'c'] {
            press(&mut app, KeyCode::Char(c));
        }
        tokio::time::advance(Duration::from_millis(400)).await;
        for c in ['d', 'e', 'f'] {
            press(&mut app, KeyCode::Char(c));
        }

        // 两次结果相隔不到一秒，两条提示同时显示
        assert_eq!(app.flashes.len(), 2);
        let (first, second) = (app.flashes[0], app.flashes[1]);
        assert_eq!(first.slots, [0, 1, 2]);
        assert_eq!(second.slots, [3, 4, 5]);
        assert_eq!(second.until - first.until, Duration::from_millis(400));
        assert_eq!(app.flash_for(0), Some(first.kind));
        assert_eq!(app.flash_for(5), Some(second.kind));

        // 第一条到期不影响第二条
        app.expire_flash(first.until);
        assert_eq!(app.flash_for(0), None);
        assert_eq!(app.flash_for(4), Some(second.kind));
        app.expire_flash(second.until);
        assert!(app.flashes.is_empty());
    }

    #[tokio::test]
    async fn test_new_outcome_replaces_overlapping_flash() {
        let (mut app, _rx) = app(Difficulty::Hard, 60);
        press(&mut app, KeyCode::Enter);
        for c in ['a', 'b', 'c', 'c', 'd', 'e'] {
            press(&mut app, KeyCode::Char(c));
        }

        assert_eq!(app.flashes.len(), 1);
        assert_eq!(app.flashes[0].slots, [2, 3, 4]);
        assert_eq!(app.flash_for(0), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_runs_out_of_time() {
        let (mut app, mut rx) = app(Difficulty::Easy, 2);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('a'));

        for _ in 0..2 {
            let ticket = rx.recv().await.unwrap();
            app.on_tick(ticket).unwrap();
        }
        assert_eq!(app.game.phase(), GamePhase::OutOfTime);
        assert!(app.game.selection().is_empty());
        assert!(!app.ticking());

        // 时间到之后选牌无效
        press(&mut app, KeyCode::Char('b'));
        assert!(app.game.selection().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_stops_ticking_and_shows_score() {
        let (mut app, mut rx) = app(Difficulty::Easy, 60);
        press(&mut app, KeyCode::Enter);
        let ticket = rx.recv().await.unwrap();
        app.on_tick(ticket).unwrap();

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.game.phase(), GamePhase::Menu);
        assert_eq!(app.last_score, Some(0));
        assert!(!app.ticking());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, _rx) = app(Difficulty::Easy, 60);
        assert_eq!(app.command_for_key(key(KeyCode::Char('q'))), Command::Quit);
        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        };
        press(&mut app, KeyCode::Enter);
        // 游戏中 q 不退出，Ctrl-C 总是退出
        assert_eq!(app.command_for_key(key(KeyCode::Char('q'))), Command::None);
        assert_eq!(app.command_for_key(ctrl_c), Command::Quit);
        app.apply(Command::Quit).unwrap();
        assert!(app.should_quit);
        assert!(!app.ticking());
    }
}

mod app;
mod ticker;
mod ui;

use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use crossterm::cursor::Show;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tui::Terminal;
use tui::backend::CrosstermBackend;

use set_eden_core::{Difficulty, RoundConfig, SetGame, DEFAULT_DURATION_SECS};

use crate::app::App;

/// 终端版 Set 纸牌游戏
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// 初始难度：easy（9 张牌，全部实心）或 hard（12 张牌）
    #[arg(long, default_value_t = Difficulty::Easy)]
    difficulty: Difficulty,

    /// 每局时长（秒）
    #[arg(long, default_value_t = DEFAULT_DURATION_SECS)]
    duration: u32,

    /// 随机种子，指定后发牌顺序可复现
    #[arg(long)]
    seed: Option<u64>,

    /// 日志文件；不指定则不记录日志（避免打乱终端界面）
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let config = RoundConfig::new(cli.difficulty, cli.duration)?;
    let game = cli.seed.map_or_else(SetGame::new, SetGame::with_seed);
    info!(
        difficulty = %config.difficulty,
        duration = config.duration_secs,
        seed = ?cli.seed,
        "starting"
    );

    let (tick_tx, tick_rx) = mpsc::channel(16);
    let app = App::new(game, config, tick_tx);

    // guard 先于 terminal 创建、后于它释放，出错返回或 panic 时都会恢复终端
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.hide_cursor()?;

    let result = app::run(&mut terminal, app, tick_rx).await;
    if let Err(e) = &result {
        tracing::error!("event loop failed: {}", e);
    }
    result
}

/// 进入原始模式和备用屏幕，释放时恢复终端
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<TerminalGuard> {
        enable_raw_mode()?;
        // 从这里开始的失败都由 Drop 负责撤销
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("failed to disable raw mode: {}", e);
        }
        if let Err(e) = restore_screen(&mut io::stdout()) {
            warn!("failed to restore terminal: {}", e);
        }
    }
}

/// 离开备用屏幕、关闭鼠标捕获并显示光标，重复调用无副作用
fn restore_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, LeaveAlternateScreen, DisableMouseCapture, Show)
}

fn init_tracing(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

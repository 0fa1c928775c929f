use tui::Frame;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use tui::style::{Color as TuiColor, Modifier, Style};
use tui::text::{Span, Spans};
use tui::widgets::{Block, BorderType, Borders, Paragraph};

use set_eden_core::{
    find_sets, format_clock, Card, Color, Difficulty, GamePhase, Shading, Shape,
};

use crate::app::{App, FlashKind, BOARD_ROWS};

pub fn draw<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    match app.game.phase() {
        GamePhase::Menu => draw_menu(f, app),
        GamePhase::Playing | GamePhase::OutOfTime => draw_game(f, app),
    }
}

// --- 菜单 ---

fn draw_menu<B: Backend>(f: &mut Frame<B>, app: &App) {
    let area = centered(f.size(), 44, 14);
    let highlight = Style::default().fg(TuiColor::Yellow).add_modifier(Modifier::BOLD);

    let difficulty = [Difficulty::Easy, Difficulty::Hard]
        .into_iter()
        .map(|d| {
            let label = format!(" {} ", d);
            if d == app.menu.difficulty {
                Span::styled(label, highlight)
            } else {
                Span::raw(label)
            }
        });
    let durations = app.menu.durations.iter().enumerate().map(|(i, &secs)| {
        let label = format!(" {} ", format_clock(secs));
        if i == app.menu.duration_idx {
            Span::styled(label, highlight)
        } else {
            Span::raw(label)
        }
    });

    let difficulty_line: Vec<Span> = std::iter::once(Span::raw("Difficulty: "))
        .chain(difficulty)
        .collect();
    let duration_line: Vec<Span> = std::iter::once(Span::raw("Time:       "))
        .chain(durations)
        .collect();
    let mut lines = vec![
        Spans::from(""),
        Spans::from(difficulty_line),
        Spans::from(""),
        Spans::from(duration_line),
        Spans::from(""),
    ];
    if let Some(score) = app.last_score {
        lines.push(Spans::from(format!("Last round: {} sets", score)));
        lines.push(Spans::from(""));
    }
    lines.push(Spans::from(Span::styled(
        "Enter start · ←/→ difficulty · ↑/↓ time · q quit",
        Style::default().fg(TuiColor::DarkGray),
    )));

    let block = Block::default()
        .title(" Set ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let menu = Paragraph::new(lines).alignment(Alignment::Center).block(block);
    f.render_widget(menu, area);
}

// --- 游戏界面 ---

fn draw_game<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(9), Constraint::Length(1)])
        .split(f.size());

    draw_status(f, app, chunks[0]);
    app.card_areas = board_areas(chunks[1], app.game.board().len(), app.columns());
    for (slot, card) in app.game.board().cards().iter().enumerate() {
        if let Some(&area) = app.card_areas.get(slot) {
            draw_card(f, app, slot, card, area);
        }
    }

    let help = if app.game.phase() == GamePhase::OutOfTime {
        Span::styled("Time's up! Esc back to menu", Style::default().fg(TuiColor::Red))
    } else {
        Span::styled(
            "a-l or ←↑↓→ + Enter select · click a card · r refresh · Esc back",
            Style::default().fg(TuiColor::DarkGray),
        )
    };
    let help = Paragraph::new(Spans::from(help)).alignment(Alignment::Center);
    f.render_widget(help, chunks[2]);
}

fn draw_status<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let time_style = if app.game.timer().remaining() <= 10 {
        Style::default().fg(TuiColor::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let sets_on_board = find_sets(app.game.board().cards()).len();
    let difficulty = app.game.config().difficulty;
    let line = Spans::from(vec![
        Span::raw("Time "),
        Span::styled(format_clock(app.game.timer().remaining()), time_style),
        Span::raw("   Sets found "),
        Span::styled(app.game.score().to_string(), bold),
        Span::raw(format!("   Sets on board {}   {}", sets_on_board, difficulty)),
    ]);
    let status = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

/// 把桌面区域切成 3 行 × cols 列
fn board_areas(area: Rect, len: usize, cols: usize) -> Vec<Rect> {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, BOARD_ROWS as u32); BOARD_ROWS])
        .split(area);
    rows.into_iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, cols as u32); cols])
                .split(row)
        })
        .take(len)
        .collect()
}

fn draw_card<B: Backend>(f: &mut Frame<B>, app: &App, slot: usize, card: &Card, area: Rect) {
    let selected = app.game.selection().contains(&slot);
    let out_of_time = app.game.phase() == GamePhase::OutOfTime;

    let border_style = if out_of_time {
        Style::default().fg(TuiColor::DarkGray)
    } else if selected {
        Style::default().fg(TuiColor::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let border_type = if slot == app.cursor && !out_of_time {
        BorderType::Thick
    } else {
        BorderType::Plain
    };
    let title = format!(" {} ", (b'a' + slot as u8) as char);

    // 提示期间遮住牌面，只显示结果
    let body = match app.flash_for(slot) {
        Some(kind) => {
            let (text, color) = match kind {
                FlashKind::SetFound => ("SET!", TuiColor::Green),
                FlashKind::NotASet => ("Not a Set", TuiColor::Red),
            };
            let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
            vec![Spans::from(""), Spans::from(Span::styled(text, style))]
        }
        None => {
            let style = Style::default().fg(card_color(card.color));
            let symbols =
                vec![glyph(card.shape, card.shading); card.count.value() as usize].join(" ");
            let code = Span::styled(card.to_string(), Style::default().fg(TuiColor::DarkGray));
            vec![
                Spans::from(""),
                Spans::from(Span::styled(symbols, style)),
                Spans::from(code),
            ]
        }
    };

    let widget = Paragraph::new(body).alignment(Alignment::Center).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(border_style),
    );
    f.render_widget(widget, area);
}

fn card_color(color: Color) -> TuiColor {
    match color {
        Color::Green => TuiColor::Green,
        Color::Purple => TuiColor::Magenta,
        Color::Red => TuiColor::Red,
    }
}

/// 终端里用不同的字符区分形状和填充方式
fn glyph(shape: Shape, shading: Shading) -> &'static str {
    match (shape, shading) {
        (Shape::Diamond, Shading::Solid) => "◆",
        (Shape::Diamond, Shading::Outline) => "◇",
        (Shape::Diamond, Shading::Striped) => "◈",
        (Shape::Oval, Shading::Solid) => "●",
        (Shape::Oval, Shading::Outline) => "○",
        (Shape::Oval, Shading::Striped) => "◍",
        (Shape::Squiggle, Shading::Solid) => "■",
        (Shape::Squiggle, Shading::Outline) => "□",
        (Shape::Squiggle, Shading::Striped) => "▤",
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_areas_cover_grid() {
        let area = Rect::new(0, 0, 40, 12);
        let easy = board_areas(area, 9, 3);
        assert_eq!(easy.len(), 9);
        assert_eq!(easy[0].y, easy[2].y);
        assert!(easy[3].y > easy[0].y);

        let hard = board_areas(area, 12, 4);
        assert_eq!(hard.len(), 12);
        assert_eq!(hard[0].y, hard[3].y);
        assert!(hard[4].y > hard[3].y);
    }

    #[test]
    fn test_every_shape_and_shading_has_its_own_glyph() {
        let glyphs: std::collections::HashSet<&str> = Difficulty::Hard
            .card_space()
            .into_iter()
            .map(|c| glyph(c.shape, c.shading))
            .collect();
        assert_eq!(glyphs.len(), 9);
    }

    #[test]
    fn test_centered_clamps_to_area() {
        let r = centered(Rect::new(0, 0, 20, 10), 44, 14);
        assert_eq!(r, Rect::new(0, 0, 20, 10));
        let r = centered(Rect::new(0, 0, 100, 40), 44, 14);
        assert_eq!(r, Rect::new(28, 13, 44, 14));
    }
}

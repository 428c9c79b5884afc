use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use crate::app::{App, Screen};
use crate::session::{bubble_text_width, wrap_line, ChatSession};
use crate::state::Sender;

const USER_BUBBLE: Color = Color::Rgb(0x41, 0xce, 0x8c);
const BOT_BUBBLE: Color = Color::Rgb(0xea, 0xcf, 0xd1);
const TYPING_DOT: Color = Color::Rgb(0x41, 0xce, 0x8c);

/// Turn **bold** spans into styled spans on top of `base`
fn parse_markdown_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };
        if open > 0 {
            spans.push(Span::styled(rest[..open].to_string(), base));
        }
        if close > 0 {
            spans.push(Span::styled(
                after_open[..close].to_string(),
                base.add_modifier(Modifier::BOLD),
            ));
        }
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::styled(rest.to_string(), base));
    }
    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen() {
        Screen::Home => render_home(app, frame, body_area),
        Screen::Options => render_options(app, frame, body_area),
        Screen::AIChatPage => {
            if let Some(chat) = app.chat.as_mut() {
                render_chat(chat, frame, body_area);
            }
        }
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let back = if app.can_go_back() { " ‹ " } else { "   " };

    let title = Line::from(vec![
        Span::styled(back, Style::default().fg(Color::Gray)),
        Span::styled(app.header_title(), Style::default().fg(Color::White).bold()),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = match app.screen() {
        Screen::Home => "click or Enter: open  drag or hjkl: move  q: quit",
        Screen::Options => "j/k: choose  Enter or 1-3: chat  Esc: back  q: quit",
        Screen::AIChatPage => {
            if app.is_awaiting_reply() {
                "waiting for reply...  ↑/↓ PgUp/PgDn: scroll  Esc: back"
            } else {
                "Enter: send  ↑/↓ PgUp/PgDn: scroll  Esc: back"
            }
        }
    };

    let footer = Paragraph::new(Span::styled(format!(" {}", hints), Style::default().fg(Color::DarkGray)));
    frame.render_widget(footer, area);
}

fn render_home(app: &mut App, frame: &mut Frame, area: Rect) {
    app.launcher.clamp_to(area);
    let launcher = &app.launcher;
    let rect = launcher.rect();

    let border_type = if launcher.config.is_circle {
        BorderType::Rounded
    } else {
        BorderType::Plain
    };
    let border_color = if launcher.is_dragging() { Color::White } else { launcher.config.render_color };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(launcher.config.render_color));

    // Centre the label vertically inside the border
    let inner_height = rect.height.saturating_sub(2);
    let mut lines: Vec<Line> = vec![Line::default(); (inner_height.saturating_sub(1) / 2) as usize];
    lines.push(Line::from(Span::styled(
        launcher.config.render_text.clone(),
        Style::default().fg(Color::Black).add_modifier(Modifier::BOLD),
    )));

    let button = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);

    frame.render_widget(button, rect);
}

fn render_options(app: &mut App, frame: &mut Frame, area: Rect) {
    // Three buttons, 90% wide, evenly stacked
    let [_, column, _] = Layout::horizontal([
        Constraint::Percentage(5),
        Constraint::Percentage(90),
        Constraint::Percentage(5),
    ])
    .areas(area);

    let rows = Layout::vertical([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .spacing(1)
    .split(column);

    let selected = app.menu.state.selected();
    app.menu.button_areas.clear();

    for (i, persona) in app.menu.personas.iter().enumerate() {
        let rect = rows[i];
        app.menu.button_areas.push(rect);

        let is_selected = selected == Some(i);
        let border_color = if is_selected { Color::Cyan } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .title(format!(" {} ", i + 1));

        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let [avatar_area, label_area] = Layout::horizontal([
            Constraint::Percentage(35),
            Constraint::Percentage(65),
        ])
        .areas(inner);

        let (glyph, color) = persona.avatar();
        let avatar = Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled(glyph, Style::default().fg(Color::Black).bold())),
        ])
        .alignment(Alignment::Center)
        .style(Style::default().bg(color));
        frame.render_widget(avatar, avatar_area.inner(ratatui::layout::Margin::new(1, 0)));

        let label_style = if is_selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let label = Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled(persona.menu_label(), label_style)),
        ]);
        frame.render_widget(label, label_area);
    }
}

fn chat_lines(chat: &ChatSession) -> Vec<Line<'static>> {
    let width = bubble_text_width(chat.chat_width);
    let mut lines: Vec<Line> = Vec::new();

    for msg in chat.messages() {
        let (alignment, bg) = match msg.sender {
            Sender::User => (Alignment::Right, USER_BUBBLE),
            Sender::Bot => (Alignment::Left, BOT_BUBBLE),
        };
        let base = Style::default().fg(Color::Black).bg(bg);

        let mut rows: Vec<String> = Vec::new();
        for line in msg.text.lines() {
            rows.extend(wrap_line(line, width));
        }
        if rows.is_empty() {
            rows.push(String::new());
        }

        // Pad every row to the bubble's widest row so the background is square
        let bubble_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        for row in rows {
            let padded = format!(" {:<w$} ", row, w = bubble_width);
            let line = match msg.sender {
                Sender::User => Line::from(Span::styled(padded, base)),
                Sender::Bot => parse_markdown_line(&padded, base),
            };
            lines.push(line.alignment(alignment));
        }
        lines.push(Line::default());
    }

    if chat.awaiting_response {
        // Three dots, one raised per tick
        let spans: Vec<Span> = (0..3u8)
            .map(|i| {
                let dot = if i == chat.typing_frame { "● " } else { "• " };
                Span::styled(dot, Style::default().fg(TYPING_DOT).add_modifier(Modifier::BOLD))
            })
            .collect();
        lines.push(Line::from(spans));
    }

    lines
}

fn render_chat(chat: &mut ChatSession, frame: &mut Frame, area: Rect) {
    let [chat_area, input_row] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    chat.chat_height = chat_area.height.saturating_sub(2);
    chat.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let chat_text = if chat.messages().is_empty() && !chat.awaiting_response {
        Text::from(Span::styled(
            format!("Say hello to your {}...", chat.title),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(chat_lines(chat))
    };

    let transcript = Paragraph::new(chat_text)
        .block(chat_block)
        .scroll((chat.scroll, 0));
    frame.render_widget(transcript, chat_area);

    let [input_area, send_area] = Layout::horizontal([
        Constraint::Percentage(80),
        Constraint::Min(8),
    ])
    .areas(input_row);
    chat.send_area = Some(send_area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Gray));

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = chat.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if chat.input.is_empty() {
        Paragraph::new(Span::styled("Type a message", Style::default().fg(Color::DarkGray)))
    } else {
        let visible_text: String = chat.input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text)
    };
    frame.render_widget(input.block(input_block), input_area);

    let send_style = if chat.awaiting_response {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Black).bg(USER_BUBBLE).add_modifier(Modifier::BOLD)
    };
    let send = Paragraph::new("Send")
        .alignment(Alignment::Center)
        .style(send_style)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    frame.render_widget(send, send_area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
}

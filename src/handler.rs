use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, Screen};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick().await,
    }
    // Replies can land between ticks
    app.poll_reply().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work on any screen
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.screen() {
        Screen::Home => handle_home(app, key),
        Screen::Options => handle_options(app, key),
        Screen::AIChatPage => handle_chat(app, key),
    }
}

fn handle_home(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,

        // Short press
        KeyCode::Enter | KeyCode::Char(' ') => app.open_menu(),

        // Move the button
        KeyCode::Char('h') | KeyCode::Left => app.launcher.nudge(-2, 0),
        KeyCode::Char('l') | KeyCode::Right => app.launcher.nudge(2, 0),
        KeyCode::Char('k') | KeyCode::Up => app.launcher.nudge(0, -1),
        KeyCode::Char('j') | KeyCode::Down => app.launcher.nudge(0, 1),

        _ => {}
    }
}

fn handle_options(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => app.back(),

        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => app.menu.next(),
        KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => app.menu.previous(),

        KeyCode::Char(c @ '1'..='3') => {
            app.menu.select(c as usize - '1' as usize);
            app.choose_persona();
        }
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.choose_persona(),

        _ => {}
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.back();
        return;
    }
    if key.code == KeyCode::Enter {
        app.submit_message();
        return;
    }

    let Some(chat) = app.chat.as_mut() else {
        return;
    };
    let half_page = (chat.chat_height / 2).max(1);
    match key.code {
        KeyCode::Backspace => chat.backspace(),
        KeyCode::Delete => chat.delete(),
        KeyCode::Left => chat.cursor_left(),
        KeyCode::Right => chat.cursor_right(),
        KeyCode::Home => chat.cursor_home(),
        KeyCode::End => chat.cursor_end(),
        KeyCode::Up => chat.scroll_up(1),
        KeyCode::Down => chat.scroll_down(1),
        KeyCode::PageUp => chat.scroll_up(half_page),
        KeyCode::PageDown => chat.scroll_down(half_page),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => chat.insert_char(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (x, y) = (mouse.column, mouse.row);

    match app.screen() {
        Screen::Home => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                app.launcher.press(x, y);
            }
            MouseEventKind::Drag(MouseButton::Left) => app.launcher.drag_to(x, y),
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(event) = app.launcher.release() {
                    app.on_launcher_event(event);
                }
            }
            _ => {}
        },
        Screen::Options => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(i) = app.menu.hit_test(x, y) {
                    app.menu.select(i);
                    app.choose_persona();
                }
            }
            MouseEventKind::ScrollDown => app.menu.next(),
            MouseEventKind::ScrollUp => app.menu.previous(),
            _ => {}
        },
        Screen::AIChatPage => {
            let Some(chat) = app.chat.as_mut() else {
                return;
            };
            match mouse.kind {
                MouseEventKind::ScrollDown => chat.scroll_down(3),
                MouseEventKind::ScrollUp => chat.scroll_up(3),
                MouseEventKind::Down(MouseButton::Left) => {
                    let on_send = chat.send_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
                    if on_send {
                        app.submit_message();
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionClient, CompletionRequest};
    use crate::launcher::LauncherConfig;
    use crate::store::{KeyValueStore, SqliteStore};
    use async_trait::async_trait;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use std::sync::Arc;
    use std::time::Duration;

    struct SilentClient;

    #[async_trait]
    impl CompletionClient for SilentClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<String> {
            Ok("...".to_string())
        }
    }

    fn app() -> App {
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::in_memory().unwrap());
        App::new(Arc::new(SilentClient), store, "m", Duration::ZERO, LauncherConfig::default())
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> AppEvent {
        AppEvent::Mouse(MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE })
    }

    #[tokio::test]
    async fn test_keyboard_path_to_chat_and_back() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.screen(), Screen::Options);

        handle_event(&mut app, key(KeyCode::Char('3'))).await.unwrap();
        assert_eq!(app.header_title(), "AI Grandpa");

        for c in "q?".chars() {
            handle_event(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        assert_eq!(app.chat.as_ref().unwrap().input, "q?");
        assert!(!app.should_quit);

        handle_event(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.screen(), Screen::Options);
    }

    #[tokio::test]
    async fn test_click_activates_but_drag_does_not() {
        let mut app = app();
        app.launcher.clamp_to(Rect::new(0, 0, 80, 24));

        handle_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 37, 11)).await.unwrap();
        handle_event(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 20, 5)).await.unwrap();
        handle_event(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 20, 5)).await.unwrap();
        assert_eq!(app.screen(), Screen::Home);

        let (x, y) = (app.launcher.x, app.launcher.y);
        handle_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), x, y)).await.unwrap();
        handle_event(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), x, y)).await.unwrap();
        assert_eq!(app.screen(), Screen::Options);
    }
}

use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use papo_core::{Outcome, PendingExchange, Transport};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent, tx: &UnboundedSender<AppEvent>) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Resize(_, _) => {
            if app.follow_bottom {
                app.scroll_to_bottom();
            }
        }
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Reply { exchange, result } => {
            let shown = app.latest_options().map(|set| set.id);
            let outcome = app.client.resolve(exchange, result);
            debug!(exchange = exchange.0, ?outcome, "exchange settled");
            if outcome != Outcome::Stale {
                // Only a new option set moves the highlight back to the top
                if app.latest_options().map(|set| set.id) != shown {
                    app.option_highlight = 0;
                } else {
                    app.clamp_option_highlight();
                }
                if app.follow_bottom {
                    app.scroll_to_bottom();
                }
            }
        }
    }
    Ok(())
}

/// Run the network half of an exchange in the background and report the
/// result back through the event channel.
fn spawn_exchange(
    transport: Arc<dyn Transport>,
    pending: PendingExchange,
    tx: UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = transport.send(&pending.message, &pending.user_id).await;
        // The UI may already be gone; nothing left to update then.
        let _ = tx.send(AppEvent::Reply {
            exchange: pending.id,
            result,
        });
    });
}

fn submit_input(app: &mut App, tx: &UnboundedSender<AppEvent>) {
    if let Some(pending) = app.client.begin_send(&mut app.input, None) {
        app.cursor = 0;
        app.scroll_to_bottom();
        spawn_exchange(app.client.transport(), pending, tx.clone());
    }
}

fn choose_option(app: &mut App, index: usize, tx: &UnboundedSender<AppEvent>) {
    let Some(set) = app.latest_options().map(|set| set.id) else {
        return;
    };

    if let Some(pending) = app.client.choose_option(set, index) {
        app.clamp_option_highlight();
        app.scroll_to_bottom();
        spawn_exchange(app.client.transport(), pending, tx.clone());
    }
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    // Global keys
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // Shift+Enter does not send
        KeyCode::Enter if !key.modifiers.contains(KeyModifiers::SHIFT) => submit_input(app, tx),

        // Options
        KeyCode::Tab => {
            let index = app.option_highlight;
            choose_option(app, index, tx);
        }
        KeyCode::Char('o') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let index = app.option_highlight;
            choose_option(app, index, tx);
        }
        KeyCode::Char(c @ '1'..='9') if key.modifiers.contains(KeyModifiers::ALT) => {
            let index = c as usize - '1' as usize;
            choose_option(app, index, tx);
        }
        KeyCode::Down => {
            if app.latest_options().is_some() {
                app.option_down();
            } else {
                app.scroll_down(1);
            }
        }
        KeyCode::Up => {
            if app.latest_options().is_some() {
                app.option_up();
            } else {
                app.scroll_up(1);
            }
        }

        // Scrolling
        KeyCode::PageDown => {
            let page = app.chat_height.max(1);
            app.scroll_down(page);
        }
        KeyCode::PageUp => {
            let page = app.chat_height.max(1);
            app.scroll_up(page);
        }

        // Text entry
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c)
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

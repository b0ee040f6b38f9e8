//! Terminal session and the event channel feeding the UI loop.

use std::io::{self, Stderr};
use std::panic;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use crossterm::{execute, terminal};
use futures_util::StreamExt;
use papo_core::{ChatReply, EntryId, TransportError};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// Animation step for pending placeholders
const TICK_RATE: Duration = Duration::from_millis(300);

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    /// A chat request finished, successfully or not
    Reply {
        exchange: EntryId,
        result: Result<ChatReply, TransportError>,
    },
}

/// Map a raw terminal event to something the UI reacts to.
///
/// Key releases and repeats are dropped so each press is handled once.
fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Resize(width, height) => Some(AppEvent::Resize(width, height)),
        _ => None,
    }
}

/// Single producer for terminal input and ticks. Background exchanges
/// push their replies through [`EventHandler::sender`].
pub struct EventHandler {
    rx: UnboundedReceiver<AppEvent>,
    tx: UnboundedSender<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(tx.clone()));
        Self { rx, tx }
    }

    pub fn sender(&self) -> UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

async fn pump(tx: UnboundedSender<AppEvent>) {
    let mut input = EventStream::new();
    let mut ticks = tokio::time::interval(TICK_RATE);

    loop {
        let event = tokio::select! {
            _ = ticks.tick() => Some(AppEvent::Tick),
            raw = input.next() => match raw {
                Some(Ok(raw)) => translate(raw),
                Some(Err(e)) => {
                    warn!(error = %e, "terminal event stream error");
                    None
                }
                None => break,
            },
        };

        if let Some(event) = event {
            if tx.send(event).is_err() {
                break;
            }
        }
    }
    debug!("event pump stopped");
}

/// Raw mode plus alternate screen, undone by [`Session::close`] or on panic.
pub struct Session {
    pub terminal: Tui,
}

impl Session {
    pub fn open() -> Result<Self> {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let _ = leave_screen();
            previous(info);
        }));

        terminal::enable_raw_mode()?;
        execute!(io::stderr(), terminal::EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stderr()))?;
        Ok(Self { terminal })
    }

    pub fn close(mut self) -> Result<()> {
        self.terminal.show_cursor()?;
        leave_screen()
    }
}

fn leave_screen() -> Result<()> {
    execute!(io::stderr(), terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    Ok(())
}

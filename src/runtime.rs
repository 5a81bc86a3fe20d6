use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::game::CancelHandle;

/// Input events consumed by a game session and the front end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Digit(char),
    Clear,
    Submit,
    Quit,
    Resize,
}

/// Keyboard equivalents of the on-screen keypad.
pub fn map_key(key: KeyEvent) -> Option<GameEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(GameEvent::Quit)
        }
        KeyCode::Char(c) if c.is_ascii_digit() => Some(GameEvent::Digit(c)),
        KeyCode::Char('q') => Some(GameEvent::Quit),
        KeyCode::Backspace | KeyCode::Delete | KeyCode::Esc => Some(GameEvent::Clear),
        KeyCode::Enter => Some(GameEvent::Submit),
        _ => None,
    }
}

/// Forwards terminal input into `tx` from a dedicated thread until the
/// receiving side goes away. A quit key also fires `on_quit`, so a session
/// stuck in playback stops right away instead of at its next input read.
pub fn spawn_crossterm_reader(tx: UnboundedSender<GameEvent>, on_quit: Option<CancelHandle>) {
    std::thread::spawn(move || loop {
        let forwarded = match event::read() {
            Ok(CtEvent::Key(key)) => match map_key(key) {
                Some(GameEvent::Quit) => {
                    if let Some(handle) = &on_quit {
                        handle.cancel();
                    }
                    tx.send(GameEvent::Quit)
                }
                Some(ev) => tx.send(ev),
                None => Ok(()),
            },
            Ok(CtEvent::Resize(_, _)) => tx.send(GameEvent::Resize),
            Ok(_) => Ok(()),
            Err(e) => {
                debug!(error = %e, "terminal event stream closed");
                break;
            }
        };
        if forwarded.is_err() {
            break;
        }
    });
}

pub fn crossterm_events(on_quit: Option<CancelHandle>) -> UnboundedReceiver<GameEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    spawn_crossterm_reader(tx, on_quit);
    rx
}

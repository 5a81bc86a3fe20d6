mod ui;

use async_trait::async_trait;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use fastmath::{
    config::{ConfigStore, FileConfigStore},
    game::{Game, GameError},
    presentation::{DisplayContent, HapticIntensity, Presenter, SoundKind, SpeechError},
    runtime::{self, GameEvent},
    session::GameResult,
    settings::{DigitCount, GameSettings, SettingsError},
    telemetry,
    voice::UnsupportedRecognizer,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    time::Duration,
};
use tokio::{sync::mpsc::UnboundedReceiver, time::sleep};
use tracing::{debug, info, warn};

use crate::ui::View;

/// Keys pressed this soon after a result are dropped, not taken as replay or quit.
const RESULT_HOLD_MS: u64 = 1000;

/// flash-anzan trainer: numbers flash by, you type their sum
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Numbers flash on screen one after another; type their sum when the sequence ends. Scoring gives partial credit for near misses, rewards fast answers and scales with difficulty."
)]
pub struct Cli {
    /// digits per number (2-5)
    #[clap(short = 'd', long, value_parser = clap::value_parser!(u8).range(2..=5))]
    digits: Option<u8>,

    /// numbers per sequence (3-50)
    #[clap(short = 'n', long)]
    length: Option<usize>,

    /// milliseconds each number stays on screen
    #[clap(short = 's', long)]
    time_on_screen: Option<u64>,

    /// milliseconds of blank screen between numbers
    #[clap(short = 'b', long)]
    time_between: Option<u64>,

    /// disable the terminal bell
    #[clap(long)]
    no_sound: bool,

    /// disable haptic feedback
    #[clap(long)]
    no_haptic: bool,

    /// store the resulting settings as the new defaults
    #[clap(long)]
    save: bool,

    /// print every round's result as a JSON line on exit
    #[clap(long)]
    json: bool,
}

impl Cli {
    /// Layer the command line over stored settings.
    fn apply(&self, mut settings: GameSettings) -> Result<GameSettings, SettingsError> {
        if let Some(digits) = self.digits {
            settings.digit_count = DigitCount::try_from(digits)?;
        }
        if let Some(length) = self.length {
            settings.sequence_length = length;
        }
        if let Some(ms) = self.time_on_screen {
            settings.time_on_screen = ms;
        }
        if let Some(ms) = self.time_between {
            settings.time_between = ms;
        }
        if self.no_sound {
            settings.sound_enabled = false;
        }
        if self.no_haptic {
            settings.haptic_enabled = false;
        }
        settings.validate()?;
        Ok(settings)
    }
}

/// Renders sessions with ratatui. Sounds map to the terminal bell; there is
/// no speech synthesis or vibration in a terminal.
struct TerminalPresenter<B: Backend> {
    terminal: Terminal<B>,
    view: View,
    bell: bool,
}

impl<B: Backend> TerminalPresenter<B> {
    fn new(terminal: Terminal<B>, bell: bool) -> Self {
        Self {
            terminal,
            view: View::default(),
            bell,
        }
    }

    fn show(&mut self, view: View) {
        self.view = view;
        self.redraw();
    }

    fn redraw(&mut self) {
        let view = &self.view;
        if let Err(e) = self.terminal.draw(|f| f.render_widget(view, f.area())) {
            warn!(error = %e, "redraw failed");
        }
    }
}

#[async_trait]
impl<B: Backend + Send> Presenter for TerminalPresenter<B> {
    fn display(&mut self, content: DisplayContent) {
        self.show(View::Session(content));
    }

    fn play_sound(&mut self, kind: SoundKind) {
        debug!(?kind, tone = ?kind.tone(), "sound");
        if !self.bell {
            return;
        }
        if matches!(kind, SoundKind::Number | SoundKind::Correct | SoundKind::Incorrect) {
            let mut out = io::stdout();
            if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
                debug!(error = %e, "bell failed");
            }
        }
    }

    fn trigger_haptic(&mut self, intensity: HapticIntensity) {
        debug!(?intensity, pattern = ?intensity.pattern(), "haptic");
    }

    fn refresh(&mut self) {
        self.redraw();
    }

    async fn speak(
        &mut self,
        _value: i64,
        _rate: f32,
        _voice_uri: &str,
    ) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable)
    }
}

type TerminalGame<B> = Game<TerminalPresenter<B>, UnsupportedRecognizer>;

/// Rounds until the player quits: play, show the result, Enter replays.
async fn run_app<B: Backend + Send>(
    game: &mut TerminalGame<B>,
    events: &mut UnboundedReceiver<GameEvent>,
) -> Result<Vec<GameResult>, GameError> {
    let mut results = Vec::new();
    loop {
        match game.play(events).await {
            Ok(result) => {
                game.presenter_mut().show(View::Result(result.clone()));
                results.push(result);
            }
            Err(GameError::Cancelled | GameError::InputClosed) => return Ok(results),
            Err(e) => return Err(e),
        }

        sleep(Duration::from_millis(RESULT_HOLD_MS)).await;
        while let Ok(ev) = events.try_recv() {
            match ev {
                GameEvent::Quit => {
                    game.reset();
                    return Ok(results);
                }
                GameEvent::Resize => game.presenter_mut().redraw(),
                _ => {}
            }
        }

        loop {
            match events.recv().await {
                Some(GameEvent::Submit) => break,
                Some(GameEvent::Quit | GameEvent::Clear) | None => {
                    game.reset();
                    return Ok(results);
                }
                Some(GameEvent::Resize) => game.presenter_mut().redraw(),
                Some(GameEvent::Digit(_)) => {}
            }
        }
    }
}

fn start_tui(
    settings: GameSettings,
    rt: &tokio::runtime::Runtime,
) -> Result<Vec<GameResult>, Box<dyn Error>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let presenter = TerminalPresenter::new(terminal, true);
    let mut game: TerminalGame<_> = Game::new(settings, presenter, None)?;
    let mut events = runtime::crossterm_events(Some(game.cancel_handle()));

    Ok(rt.block_on(run_app(&mut game, &mut events))?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    telemetry::init_tracing();

    let store = FileConfigStore::new();
    let settings = match cli.apply(store.load()) {
        Ok(settings) => settings,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };
    if cli.save {
        store.save(&settings)?;
        info!(path = %store.path().display(), "settings saved");
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut settings = settings;
    if settings.voice_enabled || settings.voice_recognition_enabled {
        warn!("speech is not available in the terminal, narration and voice answers are off");
        settings.voice_enabled = false;
        settings.voice_recognition_enabled = false;
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    enable_raw_mode()?;
    let outcome = start_tui(settings, &rt);
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;

    let results = outcome?;
    if cli.json {
        let mut out = io::stdout().lock();
        for result in &results {
            serde_json::to_writer(&mut out, result)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

pub mod ui;

use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, KeyCode,
        KeyEvent, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};

use tasbeeh::{
    app_dirs::AppDirs,
    bead::BeadConfig,
    celebration::Celebration,
    config::{Config, ConfigStore, FileConfigStore, StorageBackend},
    dhikr::DhikrCatalog,
    feedback::{BellFeedback, Feedback},
    gesture::{CounterSignal, DragCell, GestureController, PointerEvent, PointerKind},
    geometry::Path,
    history,
    logging,
    runtime::{CrosstermEventSource, FixedTicker, Runner, TasbeehEvent},
    session::{is_allowed_target, CountingSessionStore, ALLOWED_TARGETS},
    storage::{FileSessionStorage, SessionStorage, SqliteSessionStorage},
    viewport::Viewport,
};

use crate::ui::screen::current_screen;

/// a prayer-bead counter for the terminal
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "Drag the bead along the string with the mouse, or press space, to count remembrances. Rounds, history and lifetime totals are kept between runs."
)]
pub struct Cli {
    /// round target (33, 99, 100, 500 or 1000)
    #[clap(short = 't', long, value_parser = parse_target)]
    target: Option<u32>,

    /// dhikr id to count (see --list-dhikr)
    #[clap(short = 'd', long)]
    dhikr: Option<String>,

    /// storage backend for the session
    #[clap(short = 's', long, value_enum)]
    storage: Option<StorageBackend>,

    /// session file location, overriding the backend default
    #[clap(long = "data")]
    data_path: Option<PathBuf>,

    /// write completed rounds to a CSV file and exit
    #[clap(long)]
    export_csv: Option<PathBuf>,

    /// print the bundled dhikr catalogue and exit
    #[clap(long)]
    list_dhikr: bool,

    /// disable the round-complete animation
    #[clap(long)]
    no_celebration: bool,
}

fn parse_target(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|e| format!("{e}"))?;
    if is_allowed_target(n) {
        Ok(n)
    } else {
        Err(format!("target must be one of {ALLOWED_TARGETS:?}"))
    }
}

impl Cli {
    /// Fold command-line overrides into the persisted config
    fn apply_to(&self, cfg: &mut Config) {
        if let Some(storage) = self.storage {
            cfg.storage = storage;
        }
        if let Some(path) = &self.data_path {
            cfg.data_path = Some(path.clone());
        }
        if self.no_celebration {
            cfg.celebrate = false;
        }
    }
}

fn open_storage(cfg: &Config) -> tasbeeh::Result<Box<dyn SessionStorage>> {
    let path = cfg.resolved_data_path();
    info!(backend = %cfg.storage, path = %path.display(), "opening session storage");
    Ok(match cfg.storage {
        StorageBackend::Json => Box::new(FileSessionStorage::with_path(path)),
        StorageBackend::Sqlite => Box::new(SqliteSessionStorage::open(path)?),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Counter,
    History,
}

pub type Store = CountingSessionStore<Box<dyn SessionStorage>>;

pub struct App {
    pub controller: GestureController,
    /// Render-side view of the active bead
    pub drag: DragCell,
    pub store: Store,
    pub catalog: DhikrCatalog,
    pub celebration: Celebration,
    pub celebrate: bool,
    pub state: AppState,
    /// Where the bead canvas was last drawn; set by the counter screen
    pub viewport: Viewport,
    pub frame_size: (u16, u16),
    pub history_scroll: usize,
    feedback: Box<dyn Feedback>,
}

impl App {
    pub fn new(store: Store, catalog: DhikrCatalog, feedback: Box<dyn Feedback>, celebrate: bool) -> Self {
        let controller = GestureController::new(Arc::new(Path::tasbeeh_string()), BeadConfig::default());
        Self {
            drag: controller.drag_cell(),
            controller,
            store,
            catalog,
            celebration: Celebration::new(),
            celebrate,
            state: AppState::Counter,
            viewport: Viewport::default(),
            frame_size: (80, 24),
            history_scroll: 0,
            feedback,
        }
    }

    /// Returns false when the app should quit
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return true;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return false;
        }

        match (self.state, key.code) {
            (_, KeyCode::Esc) | (_, KeyCode::Char('q')) => return false,
            (_, KeyCode::Tab) => {
                self.state = match self.state {
                    AppState::Counter => AppState::History,
                    AppState::History => AppState::Counter,
                };
                self.history_scroll = 0;
            }
            (AppState::Counter, KeyCode::Char(' ')) | (AppState::Counter, KeyCode::Enter) => {
                let signals = self.controller.pull(&mut self.store);
                self.after_signals(&signals);
            }
            (AppState::Counter, KeyCode::Char('r')) => {
                self.controller.settle();
                self.store.reset();
            }
            (AppState::Counter, KeyCode::Char('t')) => {
                self.controller.settle();
                self.store.cycle_target();
            }
            (AppState::Counter, KeyCode::Char('d')) => {
                if let Some(next) = self.catalog.next_after(self.store.current_dhikr()) {
                    let (id, suggested) = (next.id.clone(), next.suggested_target);
                    self.controller.settle();
                    if self.store.set_dhikr(&id) {
                        self.store.set_target(suggested);
                    }
                }
            }
            (AppState::Counter, KeyCode::Char('h')) => {
                self.store.toggle_haptic();
            }
            (AppState::History, KeyCode::Up) => {
                self.history_scroll = self.history_scroll.saturating_sub(1);
            }
            (AppState::History, KeyCode::Down) => {
                // Clamped by the history renderer
                self.history_scroll += 1;
            }
            (AppState::History, KeyCode::Home) => {
                self.history_scroll = 0;
            }
            _ => {}
        }
        true
    }

    pub fn on_mouse(&mut self, kind: PointerKind, column: u16, row: u16) {
        // Releases still reach the controller so a drag never sticks
        if self.state != AppState::Counter && kind != PointerKind::Up && kind != PointerKind::Cancel {
            return;
        }
        if kind == PointerKind::Down && !self.viewport.contains(column, row) {
            return;
        }
        let event = match self.viewport.to_canvas(column, row) {
            Some(p) => PointerEvent::at(kind, p),
            None if kind == PointerKind::Cancel => PointerEvent::cancel(0.0, 0.0),
            None => return,
        };
        let signals = self.controller.handle(event, &mut self.store);
        self.after_signals(&signals);
    }

    pub fn on_tick(&mut self, dt: Duration) {
        self.controller.tick(dt);
        self.celebration.update(dt.as_secs_f64());
    }

    pub fn is_animating(&self) -> bool {
        self.controller.is_animating() || self.celebration.is_active()
    }

    fn after_signals(&mut self, signals: &[CounterSignal]) {
        self.feedback.deliver(signals, self.store.haptic_enabled());
        if self.celebrate && signals.contains(&CounterSignal::TargetReached) {
            self.celebration.start(self.frame_size.0, self.frame_size.1);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply_to(&mut config);
    if let Err(e) = config_store.save(&config) {
        eprintln!("warning: could not save config: {e}");
    }

    if let Err(e) = logging::init_file_logging(&AppDirs::log_path()) {
        eprintln!("warning: logging disabled: {e}");
    }

    let catalog = DhikrCatalog::embedded();

    if cli.list_dhikr {
        for d in catalog.iter() {
            println!("{:<28} {:>4}  {}  ({})", d.id, d.suggested_target, d.transliteration, d.translation);
        }
        return Ok(());
    }

    let mut store = CountingSessionStore::load(open_storage(&config)?);
    if let Some(id) = &cli.dhikr {
        store.set_dhikr(id);
    }
    if let Some(target) = cli.target {
        store.set_target(target);
    }

    if let Some(path) = &cli.export_csv {
        history::export_csv_file(store.sessions(), path)?;
        println!("wrote {} rounds to {}", store.sessions().len(), path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let feedback = Box::new(BellFeedback::new(io::stdout()));
    let mut app = App::new(store, catalog, feedback, config.celebrate);
    let result = start_tui(&mut terminal, &mut app, config.tick_rate_ms());

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = app.store.flush() {
        warn!(error = %e, "final save failed");
        eprintln!("warning: session not saved: {e}");
    }
    info!(lifetime = app.store.total_lifetime_count(), "exiting");

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, tick_rate_ms: u64) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(tick_rate_ms)),
    );
    let mut last_tick = Instant::now();

    terminal.draw(|f| current_screen(app.state).render(app, f))?;

    loop {
        let redraw = match runner.step() {
            TasbeehEvent::Tick => {
                let now = Instant::now();
                let animating = app.is_animating();
                app.on_tick(now - last_tick);
                last_tick = now;
                animating
            }
            TasbeehEvent::Resize => true,
            TasbeehEvent::Key(key) => {
                if !app.on_key(key) {
                    break;
                }
                true
            }
            TasbeehEvent::Mouse { kind, column, row } => {
                app.on_mouse(kind, column, row);
                true
            }
        };

        if redraw {
            terminal.draw(|f| current_screen(app.state).render(app, f))?;
        }
    }

    Ok(())
}

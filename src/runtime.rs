use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseButton, MouseEventKind};

use crate::gesture::PointerKind;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum TasbeehEvent {
    Key(KeyEvent),
    /// Left-button mouse activity in terminal cell coordinates
    Mouse {
        kind: PointerKind,
        column: u16,
        row: u16,
    },
    Resize,
    Tick,
}

/// Map a crossterm mouse event onto the pointer stream. Only the left button
/// drives the bead; everything else is dropped.
pub fn pointer_from_mouse(kind: MouseEventKind) -> Option<PointerKind> {
    match kind {
        MouseEventKind::Down(MouseButton::Left) => Some(PointerKind::Down),
        MouseEventKind::Drag(MouseButton::Left) => Some(PointerKind::Move),
        MouseEventKind::Up(MouseButton::Left) => Some(PointerKind::Up),
        _ => None,
    }
}

/// Source of terminal events (keyboard, mouse, resize)
pub trait TasbeehEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<TasbeehEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<TasbeehEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => Some(TasbeehEvent::Key(key)),
                Ok(CtEvent::Mouse(mouse)) => pointer_from_mouse(mouse.kind).map(|kind| TasbeehEvent::Mouse {
                    kind,
                    column: mouse.column,
                    row: mouse.row,
                }),
                Ok(CtEvent::Resize(_, _)) => Some(TasbeehEvent::Resize),
                // Losing focus mid-drag must not leave the bead captured
                Ok(CtEvent::FocusLost) => Some(TasbeehEvent::Mouse {
                    kind: PointerKind::Cancel,
                    column: 0,
                    row: 0,
                }),
                Ok(_) => None,
                Err(_) => break,
            };

            if let Some(evt) = evt {
                if tx.send(evt).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TasbeehEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TasbeehEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for tests
pub struct TestEventSource {
    rx: Receiver<TasbeehEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TasbeehEvent>) -> Self {
        Self { rx }
    }
}

impl TasbeehEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TasbeehEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: TasbeehEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: TasbeehEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self { event_source, ticker }
    }

    pub fn tick_interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> TasbeehEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => TasbeehEvent::Tick,
        }
    }
}

// Library surface for the binary, headless tests and reuse.
// The TUI itself (Cli, App, rendering) stays in main.rs.
pub mod animation;
pub mod app_dirs;
pub mod bead;
pub mod celebration;
pub mod config;
pub mod dhikr;
pub mod error;
pub mod feedback;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod util;
pub mod viewport;

pub use error::{Result, TasbeehError};
pub use geometry::Path;
pub use gesture::{CounterSignal, GestureController, PointerEvent, PointerKind};
pub use session::CountingSessionStore;

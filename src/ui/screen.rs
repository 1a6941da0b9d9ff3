use ratatui::Frame;

use tasbeeh::viewport::Viewport;

use crate::{
    ui::{counter_layout, history::render_history},
    App, AppState,
};

/// A UI Screen boundary. Key handling lives on [`App`].
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Bead string and counter
pub struct CounterScreen;

impl Screen for CounterScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        let area = f.area();
        // Pointer events are mapped through the rect drawn last
        let [_, canvas, _] = counter_layout(area);
        app.viewport = Viewport::new(canvas);
        app.frame_size = (area.width, area.height);
        f.render_widget(&*app, area);
    }
}

/// Completed rounds and per-dhikr totals
pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_history(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Counter => Box::new(CounterScreen),
        AppState::History => Box::new(HistoryScreen),
    }
}

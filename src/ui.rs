pub mod history;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Gauge, Paragraph, Widget,
    },
};
use unicode_width::UnicodeWidthStr;

use tasbeeh::{
    celebration::Celebration,
    geometry::{Point, CANVAS_HEIGHT, CANVAS_WIDTH},
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const HEADER_HEIGHT: u16 = 6;
const FOOTER_HEIGHT: u16 = 3;
const STRING_RESOLUTION: usize = 120;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f64 = 2.0;

const SPARK_COLORS: [Color; 6] = [
    Color::Yellow,
    Color::Green,
    Color::Cyan,
    Color::Magenta,
    Color::LightYellow,
    Color::LightGreen,
];

/// Header, bead canvas and footer rectangles for the counter screen
pub fn counter_layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    [chunks[0], canvas_rect(chunks[1]), chunks[2]]
}

/// Largest rect inside `body` that keeps the canvas proportions, centred
fn canvas_rect(body: Rect) -> Rect {
    let ideal_width = (body.height as f64 * CELL_ASPECT * CANVAS_WIDTH / CANVAS_HEIGHT).round() as u16;
    let width = ideal_width.min(body.width);
    let height = if width < ideal_width {
        (width as f64 * CANVAS_HEIGHT / (CANVAS_WIDTH * CELL_ASPECT)).round() as u16
    } else {
        body.height
    }
    .min(body.height);

    Rect::new(
        body.x + (body.width - width) / 2,
        body.y + (body.height - height) / 2,
        width,
        height,
    )
}

/// Canvas space has y pointing up
fn flip(p: Point) -> (f64, f64) {
    (p.x, CANVAS_HEIGHT - p.y)
}

fn centered_line<'a>(text: &'a str, style: Style, width: u16) -> Line<'a> {
    let pad = (width as usize).saturating_sub(text.width()) / 2;
    Line::from(vec![Span::raw(" ".repeat(pad)), Span::styled(text, style)])
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let [header, canvas_area, footer] = counter_layout(area);

        // header: phrase, count, progress
        let dhikr_id = self.store.current_dhikr();
        let phrase = self.catalog.get(dhikr_id);
        let arabic = phrase.map_or("", |d| d.arabic.as_str());
        let title = self.catalog.label(dhikr_id);
        let translation = phrase.map_or("", |d| d.translation.as_str());
        let count = format!("{} / {}", self.store.current_count(), self.store.current_target());

        let header_lines = vec![
            centered_line(arabic, bold_style.fg(Color::Green), header.width),
            centered_line(title, bold_style, header.width),
            centered_line(translation, italic_style, header.width),
            centered_line(&count, bold_style.fg(Color::Yellow), header.width),
        ];
        let header_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Length(1), Constraint::Min(0)])
            .split(header);
        Paragraph::new(header_lines).render(header_chunks[0], buf);

        Gauge::default()
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .ratio(self.store.progress().clamp(0.0, 1.0))
            .label(format!("{} to go", self.store.remaining()))
            .render(header_chunks[1], buf);

        // the string and its beads
        let path = self.controller.path().clone();
        let beads = *self.controller.beads();
        let drag = self.drag.snapshot();
        let string = path.polyline(STRING_RESOLUTION);
        let statics = beads.static_bead_points(&path);
        let active = path.point(drag.active_t);
        let radius = beads.size / 2.0;

        let active_color = if drag.has_counted_this_drag {
            Color::LightGreen
        } else if drag.is_dragging {
            Color::Yellow
        } else {
            Color::White
        };
        let show_active = drag.opacity > 0.35;

        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, CANVAS_WIDTH])
            .y_bounds([0.0, CANVAS_HEIGHT])
            .paint(|ctx| {
                for pair in string.windows(2) {
                    let (x1, y1) = flip(pair[0]);
                    let (x2, y2) = flip(pair[1]);
                    ctx.draw(&CanvasLine {
                        x1,
                        y1,
                        x2,
                        y2,
                        color: Color::DarkGray,
                    });
                }
                ctx.layer();
                for p in &statics {
                    let (x, y) = flip(*p);
                    for r in [radius, radius * 0.6] {
                        ctx.draw(&Circle {
                            x,
                            y,
                            radius: r,
                            color: Color::Cyan,
                        });
                    }
                }
                if show_active {
                    let (x, y) = flip(active);
                    for r in [radius, radius * 0.66, radius * 0.33] {
                        ctx.draw(&Circle {
                            x,
                            y,
                            radius: r,
                            color: active_color,
                        });
                    }
                }
            })
            .render(canvas_area, buf);

        // footer: status and legend
        let mut status = format!(
            "lifetime {}  ·  rounds {}  ·  bell {}",
            self.store.total_lifetime_count(),
            self.store.sessions().len(),
            if self.store.haptic_enabled() { "on" } else { "off" },
        );
        if self.store.has_pending_flush() {
            status.push_str("  ·  unsaved");
        }
        let footer_lines = vec![
            centered_line(&status, dim_style, footer.width),
            centered_line(
                "(space) pull / (r)eset / (t)arget / (d)hikr / (h)aptic / (tab) history / (esc)ape",
                italic_style,
                footer.width,
            ),
        ];
        Paragraph::new(footer_lines)
            .alignment(Alignment::Left)
            .render(footer, buf);

        if self.celebration.is_active() {
            render_celebration(&self.celebration, area, buf);
        }
    }
}

/// Draw the round-complete bloom over whatever is on screen
fn render_celebration(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    for spark in &celebration.sparks {
        if spark.x < 0.0 || spark.y < 0.0 {
            continue;
        }
        let (x, y) = (spark.x as u16, spark.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }

        let color = SPARK_COLORS[spark.color_index % SPARK_COLORS.len()];
        let life = 1.0 - spark.age / spark.max_age;
        let style = if spark.is_text || life > 0.6 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else if life > 0.25 {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&spark.symbol.to_string());
            cell.set_style(style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;
    use tasbeeh::{
        dhikr::DhikrCatalog,
        feedback::RecordingFeedback,
        session::CountingSessionStore,
        storage::MemorySessionStorage,
    };

    fn test_app() -> App {
        let store: Store = CountingSessionStore::load(Box::new(MemorySessionStorage::new()));
        App::new(store, DhikrCatalog::embedded(), Box::new(RecordingFeedback::default()), true)
    }

    fn rendered(app: &App, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_counter_screen_shows_count_and_phrase() {
        let mut app = test_app();
        app.on_key(crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Char(' '),
            crossterm::event::KeyModifiers::NONE,
        ));
        let text = rendered(&app, Rect::new(0, 0, 100, 40));
        assert!(text.contains("1 / 33"));
        assert!(text.contains("SubhanAllah"));
        assert!(text.contains("32 to go"));
    }

    #[test]
    fn test_canvas_keeps_proportions() {
        let [_, canvas, _] = counter_layout(Rect::new(0, 0, 200, 50));
        let ratio = canvas.width as f64 * CANVAS_HEIGHT / (canvas.height as f64 * CELL_ASPECT * CANVAS_WIDTH);
        assert!((ratio - 1.0).abs() < 0.1, "ratio {ratio}");

        let [_, narrow, _] = counter_layout(Rect::new(0, 0, 20, 60));
        assert!(narrow.width <= 16);
        assert!(narrow.height < 60);
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let app = test_app();
        for area in [Rect::new(0, 0, 1, 1), Rect::new(0, 0, 10, 5), Rect::new(0, 0, 200, 8)] {
            let mut buffer = Buffer::empty(area);
            (&app).render(area, &mut buffer);
            assert_eq!(*buffer.area(), area);
        }
    }

    #[test]
    fn test_unsaved_marker() {
        let mut storage = MemorySessionStorage::new();
        storage.set_fail_writes(true);
        let mut store: Store = CountingSessionStore::load(Box::new(storage));
        store.increment();
        let app = App::new(store, DhikrCatalog::embedded(), Box::new(RecordingFeedback::default()), true);
        assert!(rendered(&app, Rect::new(0, 0, 120, 40)).contains("unsaved"));
    }

    #[test]
    fn test_celebration_renders() {
        let mut app = test_app();
        app.celebration.start(80, 24);
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        (&app).render(area, &mut buffer);
        assert_eq!(*buffer.area(), area);
    }
}

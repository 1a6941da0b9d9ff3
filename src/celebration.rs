use rand::seq::SliceRandom;
use rand::Rng;

/// How long a round-complete bloom stays on screen, in seconds
pub const CELEBRATION_SECS: f64 = 2.5;

const GRAVITY: f64 = 12.0;
const SPARKS: [char; 6] = ['*', '+', '·', '✦', '✧', '◆'];
const WORDS: [&str; 4] = ["MASHAALLAH", "ALHAMDULILLAH", "ROUND COMPLETE", "BARAKALLAH"];

/// One glyph of the round-complete bloom
#[derive(Debug, Clone)]
pub struct Spark {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    /// Letters settle at `target`; loose sparks fall
    pub is_text: bool,
    pub target_x: f64,
    pub target_y: f64,
}

impl Spark {
    fn loose<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *SPARKS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..6),
            age: 0.0,
            max_age: rng.gen_range(1.5..CELEBRATION_SECS),
            is_text: false,
            target_x: x,
            target_y: y,
        }
    }

    fn letter(from: (f64, f64), to: (f64, f64), symbol: char, color_index: usize) -> Self {
        Self {
            x: from.0,
            y: from.1,
            vel_x: to.0 - from.0,
            vel_y: to.1 - from.1,
            symbol,
            color_index,
            age: 0.0,
            max_age: CELEBRATION_SECS,
            is_text: true,
            target_x: to.0,
            target_y: to.1,
        }
    }

    /// Returns false once the spark has outlived `max_age`
    fn update(&mut self, dt: f64) -> bool {
        if self.is_text {
            let dist = ((self.target_x - self.x).powi(2) + (self.target_y - self.y).powi(2)).sqrt();
            if dist > 0.5 {
                self.x += self.vel_x * dt * 4.0;
                self.y += self.vel_y * dt * 4.0;
                self.vel_x = self.target_x - self.x;
                self.vel_y = self.target_y - self.y;
            } else {
                self.x = self.target_x;
                self.y = self.target_y;
                self.vel_x = 0.0;
                self.vel_y = 0.0;
            }
        } else {
            self.x += self.vel_x * dt;
            self.y += self.vel_y * dt;
            self.vel_y += GRAVITY * dt;
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// Short particle bloom shown when a round reaches its target
#[derive(Debug, Default)]
pub struct Celebration {
    pub sparks: Vec<Spark>,
    pub word: &'static str,
    elapsed: f64,
    active: bool,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start a bloom centred in a `width` x `height` cell area
    pub fn start(&mut self, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.sparks.clear();
        self.elapsed = 0.0;
        self.active = true;
        self.width = width as f64;
        self.height = height as f64;
        self.word = WORDS.choose(&mut rng).copied().unwrap_or(WORDS[0]);

        let cx = self.width / 2.0;
        let cy = self.height / 2.0;

        let letters = self.word.chars().count() as f64;
        let left = cx - (letters - 1.0) / 2.0;
        for (i, ch) in self.word.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let from = (cx + rng.gen_range(-10.0..10.0), cy + rng.gen_range(-4.0..4.0));
            let to = (left + i as f64, cy - 1.0);
            self.sparks.push(Spark::letter(from, to, ch, rng.gen_range(0..6)));
        }

        for _ in 0..24 {
            let x = cx + rng.gen_range(-12.0..12.0);
            let y = cy + rng.gen_range(-6.0..6.0);
            self.sparks.push(Spark::loose(x, y, &mut rng));
        }
    }

    /// Advance by `dt` seconds, dropping expired and off-screen sparks
    pub fn update(&mut self, dt: f64) {
        if !self.active {
            return;
        }

        self.elapsed += dt;
        if self.elapsed >= CELEBRATION_SECS {
            self.stop();
            return;
        }

        let (w, h) = (self.width, self.height);
        self.sparks.retain_mut(|spark| {
            let alive = spark.update(dt);
            if spark.is_text {
                return alive;
            }
            let margin = 3.0;
            let off_screen = spark.y > h + margin || spark.x < -margin || spark.x > w + margin;
            alive && !off_screen
        });
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.sparks.clear();
    }
}

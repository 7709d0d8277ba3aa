use rand::Rng;

use super::settings::Settings;

/// A pair of obstacle halves with a vertical gap between them.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    pub x: f64,
    /// Bottom edge of the top half.
    pub gap_center: f64,
    /// Where the top half's sprite starts (usually negative).
    pub top_bound: f64,
    /// Where the bottom half's sprite starts.
    pub bottom_bound: f64,
    pub passed: bool,
}

impl Obstacle {
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, x: f64, half_height: f64, settings: &Settings) -> Obstacle {
        let mut obstacle = Obstacle {
            x,
            gap_center: 0.,
            top_bound: 0.,
            bottom_bound: 0.,
            passed: false,
        };
        obstacle.select_height(rng, half_height, settings);
        obstacle
    }

    /// Draws the gap height independently of anything on the course.
    fn select_height<R: Rng + ?Sized>(&mut self, rng: &mut R, half_height: f64, settings: &Settings) {
        self.gap_center = rng.gen_range(settings.gap_min..settings.gap_max) as f64;
        self.top_bound = self.gap_center - half_height;
        self.bottom_bound = self.gap_center + settings.gap_size;
    }

    pub fn advance(&mut self, settings: &Settings) {
        self.x -= settings.scroll_velocity;
    }

    pub fn is_off_screen(&self, sprite_width: f64) -> bool {
        self.x + sprite_width < 0.
    }
}

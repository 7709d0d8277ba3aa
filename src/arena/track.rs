use std::ops::Index;

use rand::Rng;

use super::obstacle::Obstacle;
use super::settings::Settings;

/// Active obstacles, oldest first.
#[derive(Clone, Debug)]
pub struct ObstacleTrack {
    obstacles: Vec<Obstacle>,
    sprite_width: f64,
    half_height: f64,
}

impl ObstacleTrack {
    /// A track seeded with one obstacle at the spawn position.
    pub fn seeded<R: Rng + ?Sized>(rng: &mut R, sprite_width: f64, half_height: f64, settings: &Settings) -> ObstacleTrack {
        let mut track = ObstacleTrack {
            obstacles: Vec::new(),
            sprite_width,
            half_height,
        };
        track.spawn(rng, settings);
        track
    }

    pub fn from_obstacles(obstacles: Vec<Obstacle>, sprite_width: f64, half_height: f64) -> ObstacleTrack {
        ObstacleTrack { obstacles, sprite_width, half_height }
    }

    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R, settings: &Settings) {
        let obstacle = Obstacle::spawn(rng, settings.spawn_x, self.half_height, settings);
        log::debug!("spawned obstacle with gap at {}", obstacle.gap_center);
        self.obstacles.push(obstacle);
    }

    /// Returns how many obstacles left the front of the track.
    pub fn advance_and_cull(&mut self, settings: &Settings) -> usize {
        for obstacle in self.obstacles.iter_mut() {
            obstacle.advance(settings);
        }
        let width = self.sprite_width;
        let before = self.obstacles.len();
        self.obstacles.retain(|o| !o.is_off_screen(width));
        before - self.obstacles.len()
    }

    /// Marks the oldest unpassed obstacle as passed once `lead_x` is beyond
    /// its leading edge. Returns true on that transition only.
    pub fn mark_pass(&mut self, lead_x: f64) -> bool {
        match self.obstacles.iter_mut().find(|o| !o.passed) {
            Some(obstacle) if lead_x > obstacle.x => {
                obstacle.passed = true;
                true
            }
            _ => false,
        }
    }

    /// Index of the obstacle agents should be looking at: the second one once
    /// the lead agent is past the first one's trailing edge.
    pub fn reference_index(&self, lead_x: f64) -> usize {
        if self.obstacles.len() > 1 && lead_x > self.obstacles[0].x + self.sprite_width {
            1
        } else {
            0
        }
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Obstacle> {
        self.obstacles.iter()
    }

    pub fn sprite_width(&self) -> f64 {
        self.sprite_width
    }
}

impl Index<usize> for ObstacleTrack {
    type Output = Obstacle;
    fn index(&self, index: usize) -> &Self::Output {
        &self.obstacles[index]
    }
}

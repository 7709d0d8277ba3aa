use std::path::Path;

use image::{imageops, RgbaImage};
use itertools::Itertools;

use super::agent::{Agent, N_FRAMES};
use super::error::MaskError;
use super::obstacle::Obstacle;

/// Per-pixel opacity of a sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Mask {
    pub fn from_fn(width: usize, height: usize, opaque: impl Fn(usize, usize) -> bool) -> Mask {
        let bits = (0..height)
            .cartesian_product(0..width)
            .map(|(y, x)| opaque(x, y))
            .collect();
        Mask { width, height, bits }
    }

    /// A pixel is opaque when its alpha exceeds `threshold`.
    pub fn from_image(img: &RgbaImage, threshold: u8) -> Mask {
        Mask::from_fn(img.width() as usize, img.height() as usize, |x, y| {
            img.get_pixel(x as u32, y as u32)[3] > threshold
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn flip_vertical(&self) -> Mask {
        Mask::from_fn(self.width, self.height, |x, y| self.get(x, self.height - 1 - y))
    }

    /// Places `other` at `offset` relative to this mask's top-left corner and
    /// returns the first pixel (in this mask's coordinates) opaque in both.
    pub fn overlap(&self, other: &Mask, offset: (i64, i64)) -> Option<(usize, usize)> {
        let (dx, dy) = offset;
        let x0 = dx.max(0);
        let y0 = dy.max(0);
        let x1 = (dx + other.width as i64).min(self.width as i64);
        let y1 = (dy + other.height as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        (y0..y1)
            .cartesian_product(x0..x1)
            .find(|&(y, x)| {
                self.get(x as usize, y as usize) && other.get((x - dx) as usize, (y - dy) as usize)
            })
            .map(|(y, x)| (x as usize, y as usize))
    }
}

/// The collision shapes of every sprite on the course.
#[derive(Clone, Debug)]
pub struct SpriteMasks {
    pub agent_frames: [Mask; N_FRAMES],
    pub obstacle_top: Mask,
    pub obstacle_bottom: Mask,
}

impl SpriteMasks {
    /// Procedural stand-ins for the bird and pipe art, at on-screen scale.
    pub fn builtin() -> SpriteMasks {
        let wing_centers = [14., 26., 38.];
        let agent_frames = wing_centers.map(|wing_y| {
            Mask::from_fn(68, 48, |x, y| {
                let (x, y) = (x as f64, y as f64);
                let body = ((x - 34.) / 26.).powi(2) + ((y - 26.) / 18.).powi(2) <= 1.;
                let wing = ((x - 22.) / 10.).powi(2) + ((y - wing_y) / 6.).powi(2) <= 1.;
                body || wing
            })
        });

        let lip_height = 48;
        let shaft_inset = 6;
        let obstacle_bottom = Mask::from_fn(104, 640, |x, y| {
            y < lip_height || (x >= shaft_inset && x < 104 - shaft_inset)
        });
        let obstacle_top = obstacle_bottom.flip_vertical();

        SpriteMasks { agent_frames, obstacle_top, obstacle_bottom }
    }

    /// Loads `bird1.png`..`bird3.png` and `pipe.png` and doubles them to
    /// on-screen scale.
    pub fn load_dir(dir: impl AsRef<Path>, alpha_threshold: u8) -> Result<SpriteMasks, MaskError> {
        let dir = dir.as_ref();
        let load = |name: &str| -> Result<Mask, MaskError> {
            let path = dir.join(name);
            let img = image::open(&path)
                .map_err(|source| MaskError::Image { path: path.display().to_string(), source })?
                .to_rgba8();
            if img.width() == 0 || img.height() == 0 {
                return Err(MaskError::Empty(path.display().to_string()));
            }
            let scaled = imageops::resize(&img, img.width() * 2, img.height() * 2, imageops::FilterType::Nearest);
            Ok(Mask::from_image(&scaled, alpha_threshold))
        };

        let agent_frames = [load("bird1.png")?, load("bird2.png")?, load("bird3.png")?];
        let obstacle_bottom = load("pipe.png")?;
        let obstacle_top = obstacle_bottom.flip_vertical();
        Ok(SpriteMasks { agent_frames, obstacle_top, obstacle_bottom })
    }

    pub fn agent_height(&self) -> f64 {
        self.agent_frames[0].height() as f64
    }

    pub fn agent_width(&self) -> f64 {
        self.agent_frames[0].width() as f64
    }

    pub fn obstacle_width(&self) -> f64 {
        self.obstacle_bottom.width() as f64
    }

    pub fn obstacle_height(&self) -> f64 {
        self.obstacle_bottom.height() as f64
    }

    /// Exact-shape test of the agent's current frame against both halves.
    pub fn collides(&self, agent: &Agent, obstacle: &Obstacle) -> bool {
        let agent_mask = &self.agent_frames[agent.frame];
        let ax = agent.x.round() as i64;
        let ay = agent.y.round() as i64;
        let dx = obstacle.x.round() as i64 - ax;

        let top = agent_mask.overlap(&self.obstacle_top, (dx, obstacle.top_bound.round() as i64 - ay));
        let bottom = agent_mask.overlap(&self.obstacle_bottom, (dx, obstacle.bottom_bound.round() as i64 - ay));
        top.is_some() || bottom.is_some()
    }
}

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::error::SettingsError;

/// Every tunable of the obstacle course and its fitness accounting.
///
/// Units are play-field pixels and ticks. `standard()` reproduces the
/// classic course; a RON file can override any subset of fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub field_width: f64,
    pub field_height: f64,
    /// Top of the floor; an agent whose sprite bottom reaches it is out.
    pub floor_y: f64,
    pub floor_tile_width: f64,
    pub agent_start_x: f64,
    pub agent_start_y: f64,

    pub jump_velocity: f64,
    pub gravity: f64,
    pub terminal_displacement: f64,
    pub lift_bias: f64,

    pub max_tilt: f64,
    pub tilt_step: f64,
    pub nose_dive_tilt: f64,
    pub animation_ticks: u32,

    pub scroll_velocity: f64,
    pub gap_size: f64,
    pub gap_min: i64,
    pub gap_max: i64,
    pub spawn_x: f64,

    pub frame_rate: u32,
    pub jump_threshold: f64,
    pub survival_reward: f64,
    pub pass_reward: f64,
    pub collision_penalty: f64,

    pub alpha_threshold: u8,
    /// Ends a generation early; `None` runs until every agent is out.
    pub max_ticks: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::standard()
    }
}

impl Settings {
    pub fn standard() -> Settings {
        Settings {
            field_width: 500.,
            field_height: 800.,
            floor_y: 730.,
            floor_tile_width: 672.,
            agent_start_x: 230.,
            agent_start_y: 350.,
            jump_velocity: -10.5,
            gravity: 3.,
            terminal_displacement: 16.,
            lift_bias: 2.,
            max_tilt: 25.,
            tilt_step: 20.,
            nose_dive_tilt: -80.,
            animation_ticks: 5,
            scroll_velocity: 5.,
            gap_size: 200.,
            gap_min: 50,
            gap_max: 450,
            spawn_x: 600.,
            frame_rate: 60,
            jump_threshold: 0.5,
            survival_reward: 0.1,
            pass_reward: 5.,
            collision_penalty: 1.,
            alpha_threshold: 127,
            max_ticks: None,
        }
    }

    pub fn from_ron_file(path: impl AsRef<Path>) -> anyhow::Result<Settings> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = ron::from_str(&content)
            .with_context(|| format!("Failed to parse RON settings: {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("field_width", self.field_width),
            ("field_height", self.field_height),
            ("floor_y", self.floor_y),
            ("terminal_displacement", self.terminal_displacement),
            ("scroll_velocity", self.scroll_velocity),
            ("gap_size", self.gap_size),
        ];
        if let Some(&(name, _)) = positive.iter().find(|(_, v)| !(*v > 0.)) {
            return Err(SettingsError::NotPositive(name));
        }
        if self.gap_min >= self.gap_max {
            return Err(SettingsError::EmptyGapRange { min: self.gap_min, max: self.gap_max });
        }
        if !self.jump_threshold.is_finite() {
            return Err(SettingsError::NonFiniteThreshold);
        }
        if self.animation_ticks == 0 {
            return Err(SettingsError::NotPositive("animation_ticks"));
        }

        let finite = [
            ("gravity", self.gravity),
            ("jump_velocity", self.jump_velocity),
            ("lift_bias", self.lift_bias),
        ];
        if let Some(&(name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SettingsError::NonFinite(name));
        }
        if !(self.gravity > 0.) {
            return Err(SettingsError::NotPositive("gravity"));
        }

        // the agent must start ahead of the first obstacle and inside the field
        let in_range = [
            ("agent_start_x", self.agent_start_x, 0., self.spawn_x),
            ("agent_start_y", self.agent_start_y, 0., self.floor_y),
        ];
        if let Some(&(name, value, min, max)) = in_range.iter().find(|(_, v, min, max)| !(v >= min && v < max)) {
            return Err(SettingsError::OutOfRange { name, value, min, max });
        }
        Ok(())
    }
}

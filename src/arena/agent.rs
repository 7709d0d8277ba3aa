use super::settings::Settings;

/// Number of animation frames an agent sprite cycles through.
pub const N_FRAMES: usize = 3;

/// Kinematic state of one agent. `x` never changes; the course scrolls past it.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub x: f64,
    pub y: f64,
    pub vertical_velocity: f64,
    /// Ticks since the last jump (or since spawning).
    pub tick_count: u64,
    /// Height at which the last jump started.
    pub jump_height: f64,
    /// Presentation only: degrees, positive is nose-up.
    pub tilt: f64,
    pub frame: usize,
    frame_ticks: u32,
    pub alive: bool,
}

impl Agent {
    pub fn new(x: f64, y: f64) -> Agent {
        Agent {
            x,
            y,
            vertical_velocity: 0.,
            tick_count: 0,
            jump_height: y,
            tilt: 0.,
            frame: 0,
            frame_ticks: 0,
            alive: true,
        }
    }

    pub fn spawn(settings: &Settings) -> Agent {
        Agent::new(settings.agent_start_x, settings.agent_start_y)
    }

    pub fn jump(&mut self, settings: &Settings) {
        self.vertical_velocity = settings.jump_velocity;
        self.tick_count = 0;
        self.jump_height = self.y;
    }

    /// Advances the agent by one tick and returns the clamped displacement
    /// (before the lift bias is added to upward moves).
    pub fn step(&mut self, settings: &Settings) -> f64 {
        self.tick_count += 1;
        let t = self.tick_count as f64;

        let raw = self.vertical_velocity * t + 0.5 * settings.gravity * t * t;
        let displacement = raw.clamp(-settings.terminal_displacement, settings.terminal_displacement);
        let applied = if displacement < 0. {
            displacement - settings.lift_bias
        } else {
            displacement
        };
        self.y += applied;

        if applied < 0. || self.y < self.jump_height + 50. {
            if self.tilt < settings.max_tilt {
                self.tilt = settings.max_tilt;
            }
        } else if self.tilt > -90. {
            self.tilt -= settings.tilt_step;
        }

        displacement
    }

    /// Selects the animation frame for the next tick: 0,1,2,1 then back to 0,
    /// holding the mid frame while nose-diving.
    pub fn advance_animation(&mut self, settings: &Settings) {
        let a = settings.animation_ticks;
        self.frame_ticks += 1;

        if self.frame_ticks <= a {
            self.frame = 0;
        } else if self.frame_ticks <= a * 2 {
            self.frame = 1;
        } else if self.frame_ticks <= a * 3 {
            self.frame = 2;
        } else if self.frame_ticks <= a * 4 {
            self.frame = 1;
        } else {
            self.frame = 0;
            self.frame_ticks = 0;
        }

        if self.tilt <= settings.nose_dive_tilt {
            self.frame = 1;
            self.frame_ticks = a * 2;
        }
    }

    pub fn is_out_of_bounds(&self, sprite_height: f64, settings: &Settings) -> bool {
        self.y + sprite_height >= settings.floor_y || self.y < 0.
    }
}

pub mod terminal;

use crate::arena::agent::Agent;
use crate::arena::floor::Floor;
use crate::arena::settings::Settings;
use crate::arena::track::ObstacleTrack;

/// Read-only snapshot handed to a presentation sink at the end of every tick.
pub struct FrameView<'a> {
    pub agents: &'a [Agent],
    /// Indices into `agents` still on the course.
    pub active: &'a [usize],
    pub track: &'a ObstacleTrack,
    pub floor: &'a Floor,
    /// Index into `track` of the obstacle the agents observed this tick.
    pub reference: usize,
    pub score: usize,
    pub generation: usize,
    pub tick: u64,
    pub settings: &'a Settings,
}

impl<'a> FrameView<'a> {
    pub fn alive_agents(&self) -> impl Iterator<Item = &'a Agent> + 'a {
        let agents = self.agents;
        self.active.iter().map(move |&i| &agents[i])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub trait PresentationSink {
    fn present(&mut self, frame: &FrameView<'_>) -> std::io::Result<Flow>;
}

/// Runs as fast as possible and never asks to quit.
pub struct NullSink;

impl PresentationSink for NullSink {
    fn present(&mut self, _: &FrameView<'_>) -> std::io::Result<Flow> {
        Ok(Flow::Continue)
    }
}

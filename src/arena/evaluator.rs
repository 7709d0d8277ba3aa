use itertools::Itertools;
use rand::Rng;

use crate::display::{Flow, FrameView, PresentationSink};

use super::agent::Agent;
use super::error::{EvaluationError, PolicyError, SettingsError};
use super::floor::Floor;
use super::mask::SpriteMasks;
use super::settings::Settings;
use super::track::ObstacleTrack;

/// `(y, |y - gap_top|, |y - gap_bottom|)` against the reference obstacle.
pub type Observation = [f64; 3];

/// Maps an observation to an action; the first element of the action is
/// compared against the jump threshold.
pub trait DecisionPolicy {
    fn decide(&mut self, observation: &Observation) -> Result<Vec<f64>, PolicyError>;
}

/// A member of the population: a policy plus the fitness it is scored into.
pub trait Candidate: DecisionPolicy {
    fn fitness(&self) -> f64;
    fn fitness_mut(&mut self) -> &mut f64;
}

impl<P: DecisionPolicy> DecisionPolicy for (P, f64) {
    fn decide(&mut self, observation: &Observation) -> Result<Vec<f64>, PolicyError> {
        self.0.decide(observation)
    }
}

impl<P: DecisionPolicy> Candidate for (P, f64) {
    fn fitness(&self) -> f64 {
        self.1
    }

    fn fitness_mut(&mut self) -> &mut f64 {
        &mut self.1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every agent left the course.
    Extinct,
    /// The presentation layer asked to stop.
    Quit,
    TickLimit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationReport {
    pub generation: usize,
    pub ticks: u64,
    pub score: usize,
    pub outcome: Outcome,
}

/// Runs one generation at a time over a fresh course.
///
/// The generation counter lives here rather than in any global state; it is
/// bumped once per [`evaluate`](Self::evaluate) call and passed to the sink.
pub struct PopulationEvaluator<R: Rng> {
    settings: Settings,
    masks: SpriteMasks,
    rng: R,
    generation: usize,
}

impl<R: Rng> PopulationEvaluator<R> {
    pub fn new(settings: Settings, masks: SpriteMasks, rng: R) -> Result<PopulationEvaluator<R>, SettingsError> {
        settings.validate()?;
        Ok(PopulationEvaluator {
            settings,
            masks,
            rng,
            generation: 0,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn masks(&self) -> &SpriteMasks {
        &self.masks
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Scores every candidate on one run of the course. Fitness is reset to
    /// zero first, then accrued tick by tick until no agent is left.
    ///
    /// Agents hit by an obstacle are only marked dead during a tick; the
    /// active set is compacted once the tick's bookkeeping is done. Pass
    /// detection therefore uses the lead agent as it stood at the start of
    /// the tick, while the pass reward only goes to agents still alive.
    pub fn evaluate<C: Candidate>(
        &mut self,
        population: &mut [C],
        sink: &mut dyn PresentationSink,
    ) -> Result<GenerationReport, EvaluationError> {
        self.generation += 1;
        let settings = &self.settings;
        let masks = &self.masks;
        let agent_height = masks.agent_height();

        for candidate in population.iter_mut() {
            *candidate.fitness_mut() = 0.;
        }
        let mut agents = population.iter().map(|_| Agent::spawn(settings)).collect_vec();
        let mut active = (0..agents.len()).collect_vec();
        let mut track = ObstacleTrack::seeded(&mut self.rng, masks.obstacle_width(), masks.obstacle_height(), settings);
        let mut floor = Floor::new(settings.floor_y, settings.floor_tile_width);
        let mut score = 0;
        let mut tick = 0;

        log::info!("generation {} started with {} agents", self.generation, agents.len());

        let outcome = loop {
            if active.is_empty() {
                break Outcome::Extinct;
            }
            if settings.max_ticks.is_some_and(|max| tick >= max) {
                break Outcome::TickLimit;
            }
            tick += 1;

            let lead_x = agents[active[0]].x;
            let reference = track.reference_index(lead_x);
            assert!(reference < track.len(), "no obstacle to observe while agents are active");
            let (gap_top, gap_bottom) = (track[reference].gap_center, track[reference].bottom_bound);

            for &i in &active {
                let agent = &mut agents[i];
                let candidate = &mut population[i];
                agent.step(settings);
                *candidate.fitness_mut() += settings.survival_reward;

                let observation = [agent.y, (agent.y - gap_top).abs(), (agent.y - gap_bottom).abs()];
                let action = candidate
                    .decide(&observation)
                    .map_err(|source| EvaluationError::Policy { agent: i, source })?;
                let jump = match action.first().copied() {
                    Some(a) if a.is_finite() => a > settings.jump_threshold,
                    _ => return Err(EvaluationError::MalformedAction { agent: i, action }),
                };
                if jump {
                    agent.jump(settings);
                }
            }

            for obstacle in track.iter() {
                for &i in &active {
                    let agent = &mut agents[i];
                    if agent.alive && masks.collides(agent, obstacle) {
                        agent.alive = false;
                        *population[i].fitness_mut() -= settings.collision_penalty;
                        log::debug!("agent {} hit an obstacle at tick {}", i, tick);
                    }
                }
            }
            let passed = track.mark_pass(lead_x);

            let culled = track.advance_and_cull(settings);
            if passed {
                score += 1;
                track.spawn(&mut self.rng, settings);
                for &i in active.iter().filter(|&&i| agents[i].alive) {
                    *population[i].fitness_mut() += settings.pass_reward;
                }
                log::debug!("obstacle passed at tick {}, score {}", tick, score);
            }

            for &i in &active {
                let agent = &mut agents[i];
                if agent.alive && agent.is_out_of_bounds(agent_height, settings) {
                    agent.alive = false;
                    log::debug!("agent {} left the field at tick {}", i, tick);
                }
            }
            active.retain(|&i| agents[i].alive);

            floor.advance(settings.scroll_velocity);
            for &i in &active {
                agents[i].advance_animation(settings);
            }

            log::trace!("tick {}: {} alive, score {}", tick, active.len(), score);
            let frame = FrameView {
                agents: &agents,
                active: &active,
                track: &track,
                floor: &floor,
                reference: reference.saturating_sub(culled),
                score,
                generation: self.generation,
                tick,
                settings,
            };
            if sink.present(&frame).map_err(EvaluationError::Presentation)? == Flow::Quit {
                break Outcome::Quit;
            }
        };

        let best = population.iter().map(|c| c.fitness()).fold(f64::NEG_INFINITY, f64::max);
        log::info!(
            "generation {} ended ({:?}) after {} ticks: score {}, best fitness {:.2}",
            self.generation,
            outcome,
            tick,
            score,
            best
        );

        Ok(GenerationReport {
            generation: self.generation,
            ticks: tick,
            score,
            outcome,
        })
    }
}

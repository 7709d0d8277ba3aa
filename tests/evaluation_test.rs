extern crate flappy_neat;

#[cfg(test)]
mod test {
    use assert_approx_eq::assert_approx_eq;
    use flappy_neat::arena::agent::Agent;
    use flappy_neat::arena::error::{EvaluationError, PolicyError, SettingsError};
    use flappy_neat::arena::mask::Mask;
    use flappy_neat::arena::{Candidate, DecisionPolicy, Observation, Outcome, PopulationEvaluator, Settings, SpriteMasks};
    use flappy_neat::display::{Flow, FrameView, NullSink, PresentationSink};
    use flappy_neat::neat::organism::Organism;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    struct NeverJump;
    impl DecisionPolicy for NeverJump {
        fn decide(&mut self, _: &Observation) -> Result<Vec<f64>, PolicyError> {
            Ok(vec![0.])
        }
    }

    /// Jumps whenever it sinks below `floor`; with 400 it stays between 311 and 403.
    struct Hover {
        floor: f64,
    }
    impl DecisionPolicy for Hover {
        fn decide(&mut self, observation: &Observation) -> Result<Vec<f64>, PolicyError> {
            Ok(vec![if observation[0] > self.floor { 1. } else { 0. }])
        }
    }

    struct Fixed(Vec<f64>);
    impl DecisionPolicy for Fixed {
        fn decide(&mut self, _: &Observation) -> Result<Vec<f64>, PolicyError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;
    impl DecisionPolicy for Broken {
        fn decide(&mut self, _: &Observation) -> Result<Vec<f64>, PolicyError> {
            Err(PolicyError::Failed("network exploded".to_string()))
        }
    }

    /// Hovers like `Hover` and keeps every observation it was shown.
    struct Watcher {
        hover: Hover,
        seen: Vec<Observation>,
    }
    impl DecisionPolicy for Watcher {
        fn decide(&mut self, observation: &Observation) -> Result<Vec<f64>, PolicyError> {
            self.seen.push(*observation);
            self.hover.decide(observation)
        }
    }

    #[derive(Default)]
    struct Recorder {
        generations: Vec<usize>,
        alive: Vec<usize>,
        scores: Vec<usize>,
        /// Reference index and its (gap_center, bottom_bound) per tick.
        references: Vec<(usize, f64, f64)>,
        quit_after: Option<usize>,
    }
    impl PresentationSink for Recorder {
        fn present(&mut self, frame: &FrameView<'_>) -> std::io::Result<Flow> {
            self.generations.push(frame.generation);
            self.alive.push(frame.alive_agents().count());
            self.scores.push(frame.score);
            let observed = &frame.track[frame.reference];
            self.references.push((frame.reference, observed.gap_center, observed.bottom_bound));
            match self.quit_after {
                Some(n) if self.alive.len() >= n => Ok(Flow::Quit),
                _ => Ok(Flow::Continue),
            }
        }
    }

    fn evaluator(settings: Settings, masks: SpriteMasks, seed: u64) -> PopulationEvaluator<Xoshiro256PlusPlus> {
        PopulationEvaluator::new(settings, masks, Xoshiro256PlusPlus::seed_from_u64(seed)).unwrap()
    }

    fn transparent_obstacles() -> SpriteMasks {
        let mut masks = SpriteMasks::builtin();
        masks.obstacle_top = Mask::from_fn(104, 640, |_, _| false);
        masks.obstacle_bottom = Mask::from_fn(104, 640, |_, _| false);
        masks
    }

    /// Tick at which a never-jumping agent's sprite bottom reaches the floor.
    fn expected_fall_ticks(settings: &Settings, sprite_height: f64) -> u64 {
        let mut y = settings.agent_start_y;
        let mut t = 0u64;
        loop {
            t += 1;
            let raw = 0.5 * settings.gravity * (t * t) as f64;
            y += raw.min(settings.terminal_displacement);
            if y + sprite_height >= settings.floor_y {
                return t;
            }
        }
    }

    #[test]
    fn falling_agent_terminates_at_floor() {
        let settings = Settings::standard();
        let masks = SpriteMasks::builtin();
        let expected = expected_fall_ticks(&settings, masks.agent_height());
        // 350 -> 351.5 -> 357.5 -> 371 -> 387, then 16 per tick until y + 48 >= 730
        assert_eq!(expected, 23);

        let mut population = vec![(NeverJump, 0.)];
        let mut evaluator = evaluator(settings, masks, 1);
        let report = evaluator.evaluate(&mut population, &mut NullSink).unwrap();

        assert_eq!(report.outcome, Outcome::Extinct);
        assert_eq!(report.ticks, expected);
        assert_eq!(report.score, 0);
        assert_approx_eq!(population[0].fitness(), 0.1 * expected as f64);
    }

    #[test]
    fn always_jumping_agent_leaves_through_the_top() {
        let settings = Settings::standard();
        let mut agent = Agent::spawn(&settings);
        let mut expected = 0u64;
        loop {
            expected += 1;
            agent.step(&settings);
            if agent.y < 0. {
                break;
            }
            agent.jump(&settings);
        }
        // 350 -> 351.5, then 11 up per tick: 10.5 after tick 32, -0.5 after tick 33
        assert_eq!(expected, 33);

        let mut population = vec![(Fixed(vec![1.]), 0.)];
        let mut recorder = Recorder::default();
        let mut evaluator = evaluator(settings, SpriteMasks::builtin(), 3);
        let report = evaluator.evaluate(&mut population, &mut recorder).unwrap();

        assert_eq!(report.outcome, Outcome::Extinct);
        assert_eq!(report.ticks, expected);
        assert_eq!(report.score, 0);
        // left the field without touching an obstacle
        assert_approx_eq!(population[0].fitness(), 0.1 * expected as f64);
        assert_eq!(recorder.alive[expected as usize - 2], 1);
        assert_eq!(recorder.alive[expected as usize - 1], 0);
    }

    #[test]
    fn observation_follows_the_reference_obstacle() {
        let settings = Settings { max_ticks: Some(100), ..Settings::standard() };
        let mut population = vec![(Watcher { hover: Hover { floor: 400. }, seen: Vec::new() }, 0.)];
        let mut recorder = Recorder::default();
        let mut evaluator = evaluator(settings, transparent_obstacles(), 8);
        let report = evaluator.evaluate(&mut population, &mut recorder).unwrap();
        assert_eq!(report.outcome, Outcome::TickLimit);

        let seen = &population[0].0.seen;
        assert_eq!(seen.len(), 100);

        // the first obstacle starts at 600 and scrolls 5 per tick; at tick 96 its
        // trailing edge (125 + 104) is behind the agent at 230 for the first time
        let switch = recorder.references.iter().position(|r| r.0 == 1).unwrap();
        assert_eq!(switch + 1, 96);
        assert!(recorder.references[..switch].iter().all(|r| r.0 == 0));

        for tick in [switch - 1, switch] {
            let [y, to_gap, to_bottom] = seen[tick];
            let (_, gap_center, bottom_bound) = recorder.references[tick];
            assert_approx_eq!(to_gap, (y - gap_center).abs());
            assert_approx_eq!(to_bottom, (y - bottom_bound).abs());
            assert_approx_eq!(bottom_bound - gap_center, 200.);
        }
    }

    #[test]
    fn agent_behind_the_course_is_rejected() {
        let settings = Settings { agent_start_x: -300., max_ticks: Some(400), ..Settings::standard() };
        let rng = Xoshiro256PlusPlus::seed_from_u64(0);
        assert!(matches!(
            PopulationEvaluator::new(settings, SpriteMasks::builtin(), rng),
            Err(SettingsError::OutOfRange { name: "agent_start_x", .. })
        ));
    }

    #[test]
    fn surviving_agent_earns_exact_fitness() {
        let settings = Settings { max_ticks: Some(1000), ..Settings::standard() };
        let mut population = vec![(Hover { floor: 400. }, 0.)];
        let mut evaluator = evaluator(settings, transparent_obstacles(), 5);
        let report = evaluator.evaluate(&mut population, &mut NullSink).unwrap();

        assert_eq!(report.outcome, Outcome::TickLimit);
        assert_eq!(report.ticks, 1000);
        // a pass every 76 ticks: 76, 152, ..., 988
        assert_eq!(report.score, 13);
        assert_approx_eq!(population[0].fitness(), 0.1 * 1000. + 5. * report.score as f64);
    }

    #[test]
    fn fitness_is_reset_between_generations() {
        let settings = Settings::standard();
        let mut population = vec![(NeverJump, 123.)];
        let mut evaluator = evaluator(settings, SpriteMasks::builtin(), 1);
        evaluator.evaluate(&mut population, &mut NullSink).unwrap();
        let first = population[0].fitness();
        evaluator.evaluate(&mut population, &mut NullSink).unwrap();
        assert_approx_eq!(first, 2.3);
        assert_approx_eq!(population[0].fitness(), first);
    }

    /// Agents are 12x1 with a single opaque pixel at column 5; obstacles are
    /// opaque only in column 10. They first touch when the obstacle sits at
    /// x = 225, the same tick the lead agent passes it.
    fn same_tick_masks() -> SpriteMasks {
        let agent = Mask::from_fn(12, 1, |x, _| x == 5);
        let half = Mask::from_fn(20, 2000, |x, _| x == 10);
        SpriteMasks {
            agent_frames: [agent.clone(), agent.clone(), agent],
            obstacle_top: half.clone(),
            obstacle_bottom: half,
        }
    }

    #[test]
    fn collision_on_pass_tick_forfeits_pass_reward() {
        let settings = Settings { gap_min: 0, gap_max: 1, gap_size: 10., ..Settings::standard() };
        let mut population = vec![(Hover { floor: 400. }, 0.), (Hover { floor: 400. }, 0.)];
        let mut recorder = Recorder::default();
        let mut evaluator = evaluator(settings, same_tick_masks(), 9);
        let report = evaluator.evaluate(&mut population, &mut recorder).unwrap();

        assert_eq!(report.outcome, Outcome::Extinct);
        assert_eq!(report.ticks, 76);
        // the pass still counts, it was triggered by the lead agent at tick start
        assert_eq!(report.score, 1);
        for candidate in &population {
            assert_approx_eq!(candidate.fitness(), 0.1 * 76. - 1.);
        }
        assert_eq!(recorder.alive[74], 2);
        assert_eq!(recorder.alive[75], 0);
    }

    #[test]
    fn collided_agent_is_penalised_once() {
        // gap pinned at the very top so the hovering agent runs into the bottom half
        let settings = Settings { gap_min: 0, gap_max: 1, ..Settings::standard() };
        let mut population = vec![(Hover { floor: 400. }, 0.)];
        let mut evaluator = evaluator(settings, SpriteMasks::builtin(), 2);
        let report = evaluator.evaluate(&mut population, &mut NullSink).unwrap();

        assert_eq!(report.outcome, Outcome::Extinct);
        assert_eq!(report.score, 0);
        assert!(report.ticks < 76);
        assert_approx_eq!(population[0].fitness(), 0.1 * report.ticks as f64 - 1.);
    }

    #[test]
    fn alive_count_never_grows() {
        let settings = Settings { max_ticks: Some(5000), ..Settings::standard() };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let mut population: Vec<Organism> = (0..30).map(|_| Organism::init(&mut rng, 4, 1)).collect();
        let mut recorder = Recorder::default();
        let mut evaluator = evaluator(settings, SpriteMasks::builtin(), 11);
        let report = evaluator.evaluate(&mut population, &mut recorder).unwrap();

        assert_eq!(recorder.alive.len() as u64, report.ticks);
        assert!(recorder.alive.windows(2).all(|w| w[1] <= w[0]));
        assert!(recorder.scores.windows(2).all(|w| w[1] == w[0] || w[1] == w[0] + 1));
        assert_ne!(report.outcome, Outcome::Quit);
    }

    #[test]
    fn same_seed_same_generation() {
        let run = || {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(21);
            let mut population: Vec<Organism> = (0..20).map(|_| Organism::init(&mut rng, 4, 1)).collect();
            let settings = Settings { max_ticks: Some(5000), ..Settings::standard() };
            let mut evaluator = evaluator(settings, SpriteMasks::builtin(), 21);
            let report = evaluator.evaluate(&mut population, &mut NullSink).unwrap();
            let fitness: Vec<u64> = population.iter().map(|o| o.fitness.to_bits()).collect();
            (report, fitness)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn generation_counter_advances_per_call() {
        let mut population = vec![(NeverJump, 0.)];
        let mut recorder = Recorder::default();
        let mut evaluator = evaluator(Settings::standard(), SpriteMasks::builtin(), 4);
        assert_eq!(evaluator.generation(), 0);
        let first = evaluator.evaluate(&mut population, &mut recorder).unwrap();
        let second = evaluator.evaluate(&mut population, &mut recorder).unwrap();
        assert_eq!((first.generation, second.generation), (1, 2));
        assert_eq!(recorder.generations.first(), Some(&1));
        assert_eq!(recorder.generations.last(), Some(&2));
    }

    #[test]
    fn quit_signal_stops_the_generation() {
        let mut population = vec![(Hover { floor: 400. }, 0.)];
        let mut recorder = Recorder { quit_after: Some(3), ..Recorder::default() };
        let mut evaluator = evaluator(Settings::standard(), SpriteMasks::builtin(), 4);
        let report = evaluator.evaluate(&mut population, &mut recorder).unwrap();
        assert_eq!(report.outcome, Outcome::Quit);
        assert_eq!(report.ticks, 3);
    }

    #[test]
    fn empty_population_terminates_immediately() {
        let mut population: Vec<(NeverJump, f64)> = Vec::new();
        let mut evaluator = evaluator(Settings::standard(), SpriteMasks::builtin(), 4);
        let report = evaluator.evaluate(&mut population, &mut NullSink).unwrap();
        assert_eq!(report.outcome, Outcome::Extinct);
        assert_eq!(report.ticks, 0);
    }

    #[test]
    fn malformed_actions_are_fatal() {
        for action in [vec![], vec![f64::NAN]] {
            let mut population = vec![(Fixed(vec![0.]), 0.), (Fixed(action), 0.)];
            let mut evaluator = evaluator(Settings::standard(), SpriteMasks::builtin(), 4);
            let err = evaluator.evaluate(&mut population, &mut NullSink).unwrap_err();
            assert!(matches!(err, EvaluationError::MalformedAction { agent: 1, .. }));
        }
    }

    #[test]
    fn policy_failure_is_propagated() {
        let mut population = vec![(Broken, 0.)];
        let mut evaluator = evaluator(Settings::standard(), SpriteMasks::builtin(), 4);
        let err = evaluator.evaluate(&mut population, &mut NullSink).unwrap_err();
        assert!(matches!(err, EvaluationError::Policy { agent: 0, source: PolicyError::Failed(_) }));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = Settings { gap_min: 10, gap_max: 5, ..Settings::standard() };
        let rng = Xoshiro256PlusPlus::seed_from_u64(0);
        assert!(PopulationEvaluator::new(settings, SpriteMasks::builtin(), rng).is_err());
    }

    #[test]
    fn jump_schedule_is_reproducible() {
        let settings = Settings::standard();
        let trajectory = || {
            let mut agent = Agent::spawn(&settings);
            (0..200)
                .map(|t| {
                    if t % 7 == 0 {
                        agent.jump(&settings);
                    }
                    agent.step(&settings);
                    agent.y.to_bits()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(trajectory(), trajectory());
    }

    #[test]
    fn displacement_never_exceeds_terminal_velocity() {
        let settings = Settings::standard();
        let mut agent = Agent::spawn(&settings);
        for t in 0..500u64 {
            if t % 11 == 0 || t % 13 == 0 {
                agent.jump(&settings);
            }
            let before = agent.y;
            let displacement = agent.step(&settings);
            assert!(displacement.abs() <= settings.terminal_displacement);
            let moved = agent.y - before;
            assert!(moved <= settings.terminal_displacement);
            assert!(moved >= -(settings.terminal_displacement + settings.lift_bias));
        }
    }
}

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use flappy_neat::arena::{Candidate, Outcome, PopulationEvaluator, Settings, SpriteMasks};
use flappy_neat::display::terminal::TerminalSink;
use flappy_neat::display::{NullSink, PresentationSink};
use flappy_neat::neat::organism::Organism;
use itertools::Itertools;
use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Observation size plus the bias node.
const N_SENSOR_NODES: usize = 4;
const N_OUTPUT_NODES: usize = 1;

#[derive(Parser, Debug)]
#[command(author, version, about = "Evolve agents through a scrolling obstacle course", long_about = None)]
struct Args {
    /// Number of generations to run
    #[arg(long, default_value_t = 50)]
    generations: usize,

    /// Organisms per generation
    #[arg(long, default_value_t = 50)]
    population: usize,

    /// Seed for both the course and the breeding; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// RON file overriding course settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory with bird1.png, bird2.png, bird3.png and pipe.png
    #[arg(long)]
    sprites: Option<PathBuf>,

    /// Draw the course in the terminal at the configured frame rate
    #[arg(long)]
    render: bool,

    /// Stop a generation after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,
}

/// Keeps the top fifth and refills the rest with perturbed copies of them.
fn next_generation<R: RngCore>(rng: &mut R, population: &mut [Organism]) -> anyhow::Result<()> {
    population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    let n_elites = ((population.len() as f64 * 0.2).ceil() as usize).max(1);
    for i in n_elites..population.len() {
        let mut child = population[rng.gen_range(0..n_elites)].clone();
        child.mutate_weights(rng, 0.8, 0.5).context("Failed to mutate weights")?;
        population[i] = child;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.population == 0 {
        bail!("population must contain at least one organism");
    }

    let mut settings = match &args.config {
        Some(path) => Settings::from_ron_file(path)?,
        None => Settings::standard(),
    };
    if args.max_ticks.is_some() {
        settings.max_ticks = args.max_ticks;
    }

    let masks = match &args.sprites {
        Some(dir) => SpriteMasks::load_dir(dir, settings.alpha_threshold)
            .with_context(|| format!("Failed to load sprites from {}", dir.display()))?,
        None => SpriteMasks::builtin(),
    };

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    log::info!("using seed {}", seed);
    let mut breeder_rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let course_rng = Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(1));

    let mut population = (0..args.population)
        .map(|_| Organism::init(&mut breeder_rng, N_SENSOR_NODES, N_OUTPUT_NODES))
        .collect_vec();

    let agent_size = (masks.agent_width(), masks.agent_height());
    let frame_rate = settings.frame_rate;
    let mut evaluator = PopulationEvaluator::new(settings, masks, course_rng)?;

    let mut sink: Box<dyn PresentationSink> = if args.render {
        Box::new(TerminalSink::new(frame_rate, agent_size).context("Failed to set up the terminal")?)
    } else {
        Box::new(NullSink)
    };

    let mut best_ever = f64::NEG_INFINITY;
    for _ in 0..args.generations {
        let report = evaluator.evaluate(&mut population, sink.as_mut())?;
        let best = population.iter().map(|o| o.fitness()).fold(f64::NEG_INFINITY, f64::max);
        best_ever = best_ever.max(best);
        log::info!(
            "gen: {}; score: {}; ticks: {}; best fitness: {:.2}",
            report.generation,
            report.score,
            report.ticks,
            best
        );

        if report.outcome == Outcome::Quit {
            break;
        }
        next_generation(&mut breeder_rng, &mut population)?;
    }

    drop(sink);
    println!(
        "ran {} generations, best fitness {:.2}",
        evaluator.generation(),
        best_ever
    );
    Ok(())
}

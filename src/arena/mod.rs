pub mod agent;
pub mod error;
pub mod evaluator;
pub mod floor;
pub mod mask;
pub mod obstacle;
pub mod settings;
pub mod track;

pub use evaluator::{Candidate, DecisionPolicy, GenerationReport, Observation, Outcome, PopulationEvaluator};
pub use mask::SpriteMasks;
pub use settings::Settings;

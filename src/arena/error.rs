use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("setting `{0}` must be positive")]
    NotPositive(&'static str),
    #[error("gap range {min}..{max} is empty")]
    EmptyGapRange { min: i64, max: i64 },
    #[error("jump threshold must be finite")]
    NonFiniteThreshold,
    #[error("setting `{0}` must be finite")]
    NonFinite(&'static str),
    #[error("setting `{name}` = {value} must lie in {min}..{max}")]
    OutOfRange { name: &'static str, value: f64, min: f64, max: f64 },
}

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("failed to load sprite {path}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("sprite {0} has zero width or height")]
    Empty(String),
}

/// Raised by a decision policy that cannot produce an action.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("expected {expected} inputs, got {actual}")]
    InputSize { expected: usize, actual: usize },
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("policy of agent {agent} failed")]
    Policy {
        agent: usize,
        #[source]
        source: PolicyError,
    },
    #[error("policy of agent {agent} returned a malformed action {action:?}")]
    MalformedAction { agent: usize, action: Vec<f64> },
    #[error("presentation failed")]
    Presentation(#[source] std::io::Error),
}

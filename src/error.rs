use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PaletteError {
    #[error("palette capacity must be at least 1")]
    ZeroCapacity,

    #[error("no tolerance band covers value {0}")]
    UncoveredValue(f64),

    #[error("tolerance table has no bands")]
    EmptyTolerances,

    #[error("tolerance band {index}: threshold {name} = {threshold} is outside [0, 1]")]
    ThresholdOutOfRange {
        index: usize,
        name: &'static str,
        threshold: f64,
    },

    #[error("tolerance band {index}: min_value {min} must be below max_value {max}")]
    EmptyBand { index: usize, min: f64, max: f64 },

    #[error("tolerance bands leave value range [{from}, {to}) uncovered")]
    Gap { from: f64, to: f64 },

    #[error("tolerance bands overlap at value {0}")]
    Overlap(f64),
}

//! Model-order and hyperparameter search for the factorization step.

pub mod matching;
pub mod stability;

pub use matching::{match_components, ComponentMatching, MatchedPair};
pub use stability::{stability, sweep, sweep_with_progress, StabilityScore, SweepCell, SweepReport};

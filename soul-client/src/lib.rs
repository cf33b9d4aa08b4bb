//! Native client for the gesture-driven particle visualization.
//!
//! Glue around `soul-core`: camera capture and the landmark-estimator
//! boundary ([`estimator`]), the cancellable vision pipeline feeding
//! control-signal snapshots to the render loop ([`pipeline`]), and a
//! software point-cloud preview ([`preview`]).

pub mod estimator;
pub mod pipeline;
pub mod preview;

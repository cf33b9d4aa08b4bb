#![cfg_attr(not(feature = "std"), no_std)]

//! Core of the gesture-driven particle visualization.
//!
//! Three pieces compose into a feed-forward pipeline: the
//! [`GestureInterpreter`] turns raw hand landmarks into smoothed control
//! signals, [`shapes`] samples target point clouds, and the
//! [`ParticleSystem`] eases tens of thousands of particles between the
//! selected shape and a dispersed chaotic state every render frame.
//!
//! The interpreter is pure math and works without `std`; shape sampling and
//! the particle buffers need an RNG and heap allocation, so they are gated
//! behind the `std` feature.

pub mod gesture;
mod math;
#[cfg(feature = "std")]
pub mod shapes;
#[cfg(feature = "std")]
pub mod simulator;

pub use gesture::GestureInterpreter;
#[cfg(feature = "std")]
pub use simulator::ParticleSystem;

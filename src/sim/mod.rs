//! Simulated servo and ranger, so the scanner runs on a host.

pub mod pins;
pub mod world;

pub use pins::{SimEcho, SimServo, SimTrigger};
pub use world::{Acoustics, Target, World, blackboard, snapshot};

//! The assignment loop: matches READY commands against eligible render
//! nodes under pool quota, licence and requirement constraints.

pub mod licence;
pub mod strategy;
pub mod tick;

pub use licence::LicenceRegistry;
pub use strategy::order_candidates;
pub use tick::{AssignmentOutcome, AssignmentTick};

#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
// The ultimate strictness: catches things like missing documentation or overflow risks
#![warn(clippy::restriction)]
pub mod core;

pub use crate::core::catalog::Catalog;
pub use crate::core::simulation::{shots_to_kill, simulate, SimulationError, Simulator, Target};
pub use crate::core::state::AppState;

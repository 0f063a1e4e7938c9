//! Annual inter-row shading model for single-axis solar trackers.
//!
//! [`simulate_year`] samples the year on a coarse day/hour grid and returns
//! irradiance-weighted loss metrics together with a ground shadow density
//! map. [`instantaneous_state`] gives the sun and tracker state for a single
//! moment.

pub mod constants;
pub mod raster_io;
pub mod report;
pub mod shadow_engine;
pub mod simulation;
pub mod sun_position;
pub mod tracker;
pub mod types;

pub use simulation::{instantaneous_state, simulate_year, sweep_row_spacing, AnnualSimulation};
pub use types::*;

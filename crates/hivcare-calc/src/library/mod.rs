//! Clinical rule library

pub mod anchored;
pub mod art;
pub mod viral_load;

pub use anchored::{BmiAtArtStartCalculation, ObsAtAnchorCalculation};
pub use art::{InitialArtStartDateCalculation, OnArtCalculation};
pub use viral_load::NeedsViralLoadTestCalculation;

#![forbid(unsafe_code)]

//! Health impacts attributable to ambient air pollution exposure.
//!
//! This crate provides:
//! - Exposure-response models (Nasari, log-linear, linear)
//! - Underlying incidence back-calculation (single location and regional)
//! - Attributable outcome counts and concentration scenarios
//! - Location table input and configuration

pub mod error;
pub mod model;
pub mod incidence;
pub mod assessment;
pub mod data;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use model::{ExposureResponse, Linear, LogLinear, ModelSpec, Nasari, Transform, NASARI_ACS};
pub use incidence::{outcome, underlying_incidence, underlying_incidence_regional};
pub use assessment::{Assessment, IncidenceMethod, Location, LocationImpact, ScenarioSummary};
pub use data::load_locations;
pub use config::Config;

//! District-level heat-risk assessment: heat index, feature assembly, risk
//! classification, climate scenarios and live single-point checks.

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod heat_index;
pub mod live;
pub mod model;
pub mod names;
pub mod replay;
pub mod risk;
pub mod scenario;
pub mod session;

pub use error::{Error, Result};

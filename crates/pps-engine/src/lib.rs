//! Academic eligibility evaluation and candidate selection for supervised professional
//! practicums (PPS).

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

pub mod advisor;
pub mod analysis;
pub mod config;
pub mod error;
pub mod logging;
pub mod records;

pub mod analysis;
pub mod artifacts;
pub mod config;
pub mod data;
pub mod display;
pub mod error;

//! Core infrastructure shared by every component

pub mod config;
pub mod error_handling;
pub mod logging;
pub mod shutdown;
pub mod validation;

pub mod app;
pub mod core;
pub mod notifications;
pub mod remote;
pub mod scheduler;
pub mod targets;

include!(concat!(env!("OUT_DIR"), "/version.rs"));

//! Route handlers, one module per resource

pub mod config;
pub mod downtimes;
pub mod health;
pub mod info;
pub mod stats;
pub mod status;

pub mod api;
pub mod config;
pub mod driver;
pub mod engine;
pub mod metrics;
pub mod producer;
pub mod service;
pub mod sink;

pub mod error;

pub mod cli;
pub mod config;
pub mod configurator;
pub mod error;
pub mod export;
pub mod languages;
pub mod logging;
pub mod paths;
pub mod properties;

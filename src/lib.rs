pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod layout;
pub mod rng;
pub mod types;
pub mod world;

pub mod cli;
pub mod commands;

pub use playground_core::{app, config, history, model_registry, utils};

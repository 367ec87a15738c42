// Core playground compare functionality without UI dependencies

pub mod app;
pub mod config;
pub mod error;
pub mod history;
pub mod model_registry;
pub mod test_utils;
pub mod utils;

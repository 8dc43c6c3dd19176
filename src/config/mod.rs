pub mod loader;
pub mod models;
pub mod types;

pub use loader::InitResult;
pub use types::{AnsiColor, ColorScheme, Config, DisplayConfig, InputData, ModelInfo};

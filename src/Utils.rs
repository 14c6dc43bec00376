//! different utility modules used throughout the project
/// terminal and file logging set up from the settings
pub mod logger;
/// TOML settings: history/undo limits, logging, symbol catalog location
pub mod settings;

// Shared constants used across the engine, config and CLI layers
pub mod constants;

mod settings;

pub use settings::{Config, TomlConfig, DEFAULT_HOST, DEFAULT_PORT};

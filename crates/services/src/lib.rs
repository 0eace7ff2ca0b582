pub mod services;

pub use services::config::{
    BoardConfig, ConfigError, ConfigService, NamedColor, StatusEntry,
};

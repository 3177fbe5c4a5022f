mod config;
mod load;

pub use config::{Config, Search, Weights};
pub use load::{get, init, load_time, ConfigError, ConfigRef};

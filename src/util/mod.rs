pub mod simple_logger;

pub use simple_logger::{init_from_env, set_log_level, LogLevel};

pub mod config;
mod responses;
pub mod session;
mod telemetry;
pub mod validation;

pub use self::config::AppConfig;
pub use responses::*;
pub use telemetry::*;

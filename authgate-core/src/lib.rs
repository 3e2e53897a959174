pub mod provider;
pub mod session;
pub mod config;
pub mod error;
pub mod logging;
pub mod bootstrap;

pub use config::Config;
pub use error::{Error, Result};
pub use bootstrap::{bootstrap, AppContext, StartupError};

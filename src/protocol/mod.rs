//! Wire formats for La Marzocco Bluetooth machines.

mod auth;
mod command;
mod config;
mod hardware_enums;

pub use auth::*;
pub use command::*;
pub use config::*;
pub use hardware_enums::*;

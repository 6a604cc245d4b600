//! Control La Marzocco espresso machines over Bluetooth.
//!
//! Marzocco is an API and command-line application that talks to the Bluetooth Low Energy interface of
//! La Marzocco home machines (Linea Micra, Linea Mini, GS3). It can find a machine nearby, authenticate
//! with the machine's account credentials, and switch power, steam and boiler temperatures.
//!
//! # Examples
//!
//! Find nearby machines:
//! ```text
//! $ marzocco scan
//! MICRA_123456  AA:BB:CC:DD:EE:FF
//! ```
//!
//! Turn a machine on:
//! ```text
//! $ marzocco power on --username me@example.com --serial MR012345 --token (token)
//! ```
//!
//! Set the coffee boiler target:
//! ```text
//! $ marzocco temp --boiler coffee --value 93.5 --model micra --username ...
//! ```

pub mod bluetooth;
pub mod logging;
pub mod operations;
mod prelude;
pub mod protocol;

//! Bluetooth session handling: discovery, authentication and framed writes.

use thiserror::Error;
use uuid::Uuid;

use crate::protocol::BluetoothConfig;

mod btle;
mod client;
mod driver;

pub use btle::{BtleDriver, BtleScanner};
pub use client::LmBluetoothClient;
pub use driver::{Advertisement, LmDriver, LmScanner};

#[cfg(test)]
pub(crate) use driver::test;

/// Failures raised by the underlying BLE transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    BTError(#[from] btleplug::Error),
    #[error("timed out")]
    Timeout,
    #[error("no Bluetooth adapter found")]
    NoAdapter,
    #[error("peripheral {0} not found")]
    PeripheralNotFound(String),
    #[error("characteristic {0} not found")]
    CharacteristicNotFound(Uuid),
    #[error("not connected")]
    Disconnected,
}

#[derive(Error, Debug)]
pub enum LmError {
    #[error("couldn't find a machine")]
    DeviceNotFound,
    #[error("failed to connect to machine with Bluetooth: {0}")]
    ConnectionFailed(#[source] TransportError),
    #[error("Bluetooth client not initialized")]
    NotInitialized,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Returns every advertiser whose name matches one of the configured model prefixes, in scan order.
pub async fn scan(
    scanner: &dyn LmScanner,
    config: &BluetoothConfig,
) -> Result<Vec<Advertisement>, LmError> {
    Ok(scanner
        .discover()
        .await?
        .into_iter()
        .filter(|advertisement| advertisement.matches(config))
        .collect())
}

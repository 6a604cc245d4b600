use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time;
use uuid::Uuid;

use super::driver::{Advertisement, LmDriver, LmScanner};
use super::TransportError;
use crate::prelude::*;
use crate::protocol::BluetoothConfig;

/// Bluetooth implementation of [`LmScanner`], running on top of [`btleplug`] with the first adapter found.
pub struct BtleScanner {
    adapter: Adapter,
    scan_duration: Duration,
    connect_timeout: Duration,
}

impl BtleScanner {
    pub async fn new(config: &BluetoothConfig) -> Result<Self, TransportError> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(TransportError::NoAdapter)?;
        Ok(BtleScanner {
            adapter,
            scan_duration: config.scan_duration,
            connect_timeout: config.connect_timeout,
        })
    }

    async fn scan_peripherals(&self) -> Result<Vec<Advertisement>, TransportError> {
        trace_packet!("Starting scan on {}...", self.adapter.adapter_info().await?);
        self.adapter.start_scan(ScanFilter::default()).await?;
        let found = async {
            time::sleep(self.scan_duration).await;
            let mut readings = vec![];
            for peripheral in self.adapter.peripherals().await? {
                let name = peripheral
                    .properties()
                    .await
                    .map(|properties| properties.and_then(|properties| properties.local_name));
                readings.push((peripheral.address().to_string(), name.map_err(Into::into)));
            }
            Ok::<_, TransportError>(advertisements(readings))
        }
        .await;
        finish_scan(found, self.adapter.stop_scan().await.map_err(Into::into))
    }

    async fn find_peripheral(&self, address: &str) -> Result<Option<Peripheral>, TransportError> {
        for peripheral in self.adapter.peripherals().await? {
            if peripheral.address().to_string().eq_ignore_ascii_case(address) {
                return Ok(Some(peripheral));
            }
        }
        Ok(None)
    }

    /// Looks up a known peripheral, scanning once if the adapter hasn't seen it yet.
    async fn peripheral(&self, address: &str) -> Result<Peripheral, TransportError> {
        if let Some(peripheral) = self.find_peripheral(address).await? {
            return Ok(peripheral);
        }
        self.scan_peripherals().await?;
        self.find_peripheral(address)
            .await?
            .ok_or_else(|| TransportError::PeripheralNotFound(address.to_owned()))
    }
}

impl LmScanner for BtleScanner {
    fn discover<'a>(&'a self) -> AsyncFuture<'a, Vec<Advertisement>> {
        Box::pin(self.scan_peripherals())
    }

    fn open<'a>(&'a self, address: &'a str) -> AsyncFuture<'a, Box<dyn LmDriver>> {
        Box::pin(async move {
            let peripheral = self.peripheral(address).await?;
            Ok(Box::new(BtleDriver::new(peripheral, self.connect_timeout)) as Box<dyn LmDriver>)
        })
    }
}

/// Peripherals whose properties can't be read are skipped.
fn advertisements(
    readings: Vec<(String, Result<Option<String>, TransportError>)>,
) -> Vec<Advertisement> {
    let mut found = vec![];
    for (address, name) in readings {
        match name {
            Ok(name) => {
                trace_packet!("Found peripheral {:?}, address = {}", name, address);
                found.push(Advertisement { name, address });
            }
            Err(e) => trace_packet!("Skipping peripheral {}: {}", address, e),
        }
    }
    found
}

/// The scan result wins over a failure to stop the scan.
fn finish_scan<T>(
    found: Result<T, TransportError>,
    stopped: Result<(), TransportError>,
) -> Result<T, TransportError> {
    let found = found?;
    stopped?;
    Ok(found)
}

/// [`LmDriver`] over a single [`btleplug`] peripheral.
#[derive(Clone)]
pub struct BtleDriver {
    peripheral: Peripheral,
    connect_timeout: Duration,
}

impl BtleDriver {
    pub fn new(peripheral: Peripheral, connect_timeout: Duration) -> Self {
        BtleDriver {
            peripheral,
            connect_timeout,
        }
    }

    async fn connect_peripheral(&self) -> Result<(), TransportError> {
        time::timeout(self.connect_timeout, self.peripheral.connect())
            .await
            .map_err(|_| TransportError::Timeout)??;
        self.peripheral.discover_services().await?;
        Ok(())
    }

    async fn write_characteristic(&self, uuid: Uuid, data: Vec<u8>) -> Result<(), TransportError> {
        let characteristic = self
            .peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(TransportError::CharacteristicNotFound(uuid))?;
        self.peripheral
            .write(&characteristic, &data, WriteType::WithResponse)
            .await?;
        Ok(())
    }
}

impl LmDriver for BtleDriver {
    fn address(&self) -> String {
        self.peripheral.address().to_string()
    }

    fn connect<'a>(&'a self) -> AsyncFuture<'a, ()> {
        Box::pin(self.connect_peripheral())
    }

    fn disconnect<'a>(&'a self) -> AsyncFuture<'a, ()> {
        Box::pin(async move { Ok(self.peripheral.disconnect().await?) })
    }

    fn is_connected<'a>(&'a self) -> AsyncFuture<'a, bool> {
        Box::pin(async move { Ok(self.peripheral.is_connected().await?) })
    }

    fn write<'a>(&'a self, characteristic: Uuid, data: Vec<u8>) -> AsyncFuture<'a, ()> {
        Box::pin(self.write_characteristic(characteristic, data))
    }
}

use crate::bluetooth::{LmBluetoothClient, LmError};
use crate::prelude::*;
use crate::protocol::*;

use super::check_temperature;

/// A machine of a known model, controlled over a [`LmBluetoothClient`].
pub struct LmMachine {
    model: MachineModel,
    client: LmBluetoothClient,
}

impl LmMachine {
    pub fn new(model: MachineModel, client: LmBluetoothClient) -> Self {
        LmMachine { model, client }
    }

    pub fn model(&self) -> MachineModel {
        self.model
    }

    pub fn serial_number(&self) -> &str {
        self.client.credentials().serial_number()
    }

    pub fn client(&self) -> &LmBluetoothClient {
        &self.client
    }

    pub fn into_client(self) -> LmBluetoothClient {
        self.client
    }

    pub async fn set_power(&mut self, enabled: bool) -> Result<(), LmError> {
        trace_packet!("Setting power of {} to {}", self.serial_number(), enabled);
        self.client.set_power(enabled).await
    }

    pub async fn set_steam(&mut self, enabled: bool) -> Result<(), LmError> {
        trace_packet!("Setting steam boiler of {} to {}", self.serial_number(), enabled);
        self.client.set_steam(enabled).await
    }

    /// Validates the target for this model before sending it.
    pub async fn set_temp(&mut self, boiler: BoilerType, celsius: f64) -> Result<(), LmError> {
        let celsius = check_temperature(self.model, boiler, celsius)?;
        self.client.set_temp(boiler, celsius).await
    }

    pub async fn set_steam_level(&mut self, level: SteamLevel) -> Result<(), LmError> {
        self.set_temp(BoilerType::Steam, level.celsius()).await
    }
}

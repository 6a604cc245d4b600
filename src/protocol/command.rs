use serde::{Serialize, Serializer};

use super::hardware_enums::{BoilerType, MachineMode};

/// A command sent to the settings characteristic, serialized as `{"name":...,"parameter":{...}}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "name", content = "parameter")]
pub enum Command {
    MachineChangeMode {
        mode: MachineMode,
    },
    SettingBoilerEnable {
        identifier: BoilerType,
        state: bool,
    },
    SettingBoilerTarget {
        identifier: BoilerType,
        value: Temperature,
    },
}

impl Command {
    pub fn power(on: bool) -> Self {
        Command::MachineChangeMode { mode: on.into() }
    }

    pub fn steam(on: bool) -> Self {
        Command::SettingBoilerEnable {
            identifier: BoilerType::Steam,
            state: on,
        }
    }

    pub fn boiler_target(boiler: BoilerType, celsius: f64) -> Self {
        Command::SettingBoilerTarget {
            identifier: boiler,
            value: Temperature(celsius),
        }
    }

    /// Compact JSON, with no whitespace between tokens.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A temperature in degrees Celsius. Whole degrees go over the wire as JSON integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Temperature(pub f64);

impl Serialize for Temperature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0.abs() < i64::MAX as f64 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

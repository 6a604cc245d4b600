use std::time::Duration;

use uuid::Uuid;

/// Characteristic that receives the authentication string.
pub const AUTH_CHARACTERISTIC: Uuid = Uuid::from_u128(0x090b7847_e12b_09a8_b04b_8e0922a9abab);
/// Characteristic that receives JSON commands.
pub const SETTINGS_CHARACTERISTIC: Uuid = Uuid::from_u128(0x050b7847_e12b_09a8_b04b_8e0922a9abab);
/// Advertised-name prefixes of supported machines.
pub const MODEL_PREFIXES: [&str; 3] = ["MICRA", "MINI", "GS3"];

pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Protocol endpoints and discovery settings for a Bluetooth session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BluetoothConfig {
    pub auth_characteristic: Uuid,
    pub settings_characteristic: Uuid,
    pub model_prefixes: Vec<String>,
    /// How long a scan listens for advertisements.
    pub scan_duration: Duration,
    /// Upper bound the btleplug driver puts on a single connect attempt.
    pub connect_timeout: Duration,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        BluetoothConfig {
            auth_characteristic: AUTH_CHARACTERISTIC,
            settings_characteristic: SETTINGS_CHARACTERISTIC,
            model_prefixes: MODEL_PREFIXES.iter().map(|s| s.to_string()).collect(),
            scan_duration: DEFAULT_SCAN_DURATION,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl BluetoothConfig {
    /// Does this advertised name belong to a supported machine?
    pub fn matches_model(&self, name: &str) -> bool {
        self.model_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }
}

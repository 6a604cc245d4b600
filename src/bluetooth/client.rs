use uuid::Uuid;

use super::driver::{Advertisement, LmDriver, LmScanner};
use super::{LmError, TransportError};
use crate::prelude::*;
use crate::protocol::{BluetoothConfig, BoilerType, Command, Credentials};

/// A Bluetooth session with one machine.
///
/// The link is opened and authenticated lazily by the first write, and then reused until the
/// machine or the transport drops it. Authentication is repeated on every fresh link.
///
/// Commands take `&mut self`: a session runs one operation at a time. Callers that share a session
/// between tasks must serialize access themselves (for example with a `tokio::sync::Mutex`).
pub struct LmBluetoothClient {
    credentials: Credentials,
    config: BluetoothConfig,
    address: Option<String>,
    driver: Option<Box<dyn LmDriver>>,
}

impl LmBluetoothClient {
    /// An unbound session. Needs [`Self::discover_device`] or [`Self::new_client_from_device`] before use.
    pub fn new(credentials: Credentials, config: BluetoothConfig) -> Self {
        LmBluetoothClient {
            credentials,
            config,
            address: None,
            driver: None,
        }
    }

    /// A session bound to an externally discovered device. Connects on the first write.
    pub fn from_device(
        credentials: Credentials,
        driver: Box<dyn LmDriver>,
        config: BluetoothConfig,
    ) -> Self {
        LmBluetoothClient {
            credentials,
            config,
            address: Some(driver.address()),
            driver: Some(driver),
        }
    }

    /// Scans for the first supported machine. With `init_client` a transport is built for it
    /// (but not connected).
    pub async fn create(
        credentials: Credentials,
        scanner: &dyn LmScanner,
        init_client: bool,
        config: BluetoothConfig,
    ) -> Result<Self, LmError> {
        let mut client = Self::new(credentials, config);
        client.discover_device(scanner).await?;

        if init_client {
            let address = client.address()?.to_owned();
            let driver = scanner
                .open(&address)
                .await
                .map_err(LmError::ConnectionFailed)?;
            client.driver = Some(driver);
        }
        Ok(client)
    }

    /// The transport address of the machine.
    pub fn address(&self) -> Result<&str, LmError> {
        self.address.as_deref().ok_or(LmError::NotInitialized)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn config(&self) -> &BluetoothConfig {
        &self.config
    }

    /// Whether the transport currently reports an open link.
    pub async fn connected(&self) -> bool {
        match &self.driver {
            Some(driver) => driver.is_connected().await.unwrap_or_default(),
            None => false,
        }
    }

    /// Selects the first advertiser whose name carries a supported model prefix.
    pub async fn discover_device(&mut self, scanner: &dyn LmScanner) -> Result<(), LmError> {
        let advertisements = scanner.discover().await?;
        let machine = select_machine(&advertisements, &self.config).ok_or(LmError::DeviceNotFound)?;
        trace_packet!("Found machine {:?} at {}", machine.name, machine.address);

        if let Some(address) = &self.address {
            if *address != machine.address {
                warning!(
                    "Session already bound to {}, ignoring {}",
                    address,
                    machine.address
                );
            }
        } else {
            self.address = Some(machine.address.clone());
        }
        Ok(())
    }

    /// Replaces the transport with `driver`, then connects and authenticates right away.
    pub async fn new_client_from_device(&mut self, driver: Box<dyn LmDriver>) -> Result<(), LmError> {
        let device_address = driver.address();
        if let Some(address) = &self.address {
            if *address != device_address {
                warning!(
                    "Session already bound to {}, keeping it for device {}",
                    address,
                    device_address
                );
            }
        } else {
            self.address = Some(device_address);
        }
        self.driver = Some(driver);
        self.connect_and_authenticate().await
    }

    /// Switches the machine between brewing mode and standby.
    pub async fn set_power(&mut self, on: bool) -> Result<(), LmError> {
        self.send_command(&Command::power(on)).await
    }

    /// Enables or disables the steam boiler.
    pub async fn set_steam(&mut self, on: bool) -> Result<(), LmError> {
        self.send_command(&Command::steam(on)).await
    }

    /// Sets a boiler target temperature, in degrees Celsius. Finite values are sent as-is.
    pub async fn set_temp(&mut self, boiler: BoilerType, celsius: f64) -> Result<(), LmError> {
        if !celsius.is_finite() {
            return Err(LmError::InvalidArgument(format!(
                "Temperature must be a finite number, got {}",
                celsius
            )));
        }
        self.send_command(&Command::boiler_target(boiler, celsius))
            .await
    }

    async fn send_command(&mut self, command: &Command) -> Result<(), LmError> {
        let characteristic = self.config.settings_characteristic;
        self.write_json_message(command, characteristic).await
    }

    /// Serializes `command` as compact JSON and writes it to `characteristic`.
    pub async fn write_json_message(
        &mut self,
        command: &Command,
        characteristic: Uuid,
    ) -> Result<(), LmError> {
        let message = command.to_json()?;
        self.write_message(characteristic, message).await
    }

    /// Writes a raw payload, connecting and authenticating first if the link is down.
    ///
    /// Payloads for the settings characteristic get a trailing NUL byte.
    pub async fn write_message(
        &mut self,
        characteristic: Uuid,
        message: impl Into<Vec<u8>>,
    ) -> Result<(), LmError> {
        let driver = self.driver()?;
        if !driver.is_connected().await.unwrap_or_default() {
            self.connect_and_authenticate().await?;
        }

        let mut data = message.into();
        if characteristic == self.config.settings_characteristic {
            data.push(0);
        }
        Ok(write(self.driver()?, characteristic, data).await?)
    }

    fn driver(&self) -> Result<&dyn LmDriver, LmError> {
        self.driver.as_deref().ok_or(LmError::NotInitialized)
    }

    async fn connect_and_authenticate(&self) -> Result<(), LmError> {
        let driver = self.driver()?;
        trace_packet!("Connecting to {}...", driver.address());
        driver.connect().await.map_err(LmError::ConnectionFailed)?;

        if let Err(e) = self.authenticate(driver).await {
            if let Err(disconnect_error) = driver.disconnect().await {
                warning!(
                    "Failed to disconnect after authentication failure: {}",
                    disconnect_error
                );
            }
            return Err(LmError::ConnectionFailed(e));
        }
        Ok(())
    }

    async fn authenticate(&self, driver: &dyn LmDriver) -> Result<(), TransportError> {
        let payload = self.credentials.auth_payload();
        write(driver, self.config.auth_characteristic, payload).await
    }
}

async fn write(driver: &dyn LmDriver, characteristic: Uuid, data: Vec<u8>) -> Result<(), TransportError> {
    trace_packet!("{{host->device}} {} {}", characteristic, hex::encode(&data));
    driver.write(characteristic, data).await
}

fn select_machine<'a>(
    advertisements: &'a [Advertisement],
    config: &BluetoothConfig,
) -> Option<&'a Advertisement> {
    advertisements.iter().find(|a| a.matches(config))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bluetooth::test::{DriverEvent, FixedScanner, RecordingDriver};
    use crate::protocol::{AUTH_CHARACTERISTIC, SETTINGS_CHARACTERISTIC};

    const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

    fn credentials() -> Credentials {
        Credentials::new("u", "s", "t")
    }

    fn client(driver: &RecordingDriver) -> LmBluetoothClient {
        LmBluetoothClient::from_device(
            credentials(),
            Box::new(driver.clone()),
            BluetoothConfig::default(),
        )
    }

    fn auth_write() -> DriverEvent {
        DriverEvent::Write(AUTH_CHARACTERISTIC, b"dTpz@dA==".to_vec())
    }

    fn settings_write(json: &str) -> DriverEvent {
        let mut data = json.as_bytes().to_vec();
        data.push(0);
        DriverEvent::Write(SETTINGS_CHARACTERISTIC, data)
    }

    #[tokio::test]
    async fn create_selects_matching_advertiser() -> Result<(), LmError> {
        let scanner = FixedScanner::new(vec![
            Advertisement::new(Some("Headphones"), "11:11:11:11:11:11"),
            Advertisement::new(Some("MICRA_123456"), ADDRESS),
        ]);
        let client =
            LmBluetoothClient::create(credentials(), &scanner, true, BluetoothConfig::default())
                .await?;
        assert_eq!(ADDRESS, client.address()?);
        assert_eq!(vec![ADDRESS.to_owned()], *scanner.opened.lock().unwrap());
        assert!(!client.connected().await);
        assert!(scanner.driver.events().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn create_without_client_does_not_open() -> Result<(), LmError> {
        let scanner = FixedScanner::new(vec![Advertisement::new(Some("GS3_1"), ADDRESS)]);
        let mut client =
            LmBluetoothClient::create(credentials(), &scanner, false, BluetoothConfig::default())
                .await?;
        assert_eq!(ADDRESS, client.address()?);
        assert!(scanner.opened.lock().unwrap().is_empty());
        assert!(matches!(
            client.set_power(true).await,
            Err(LmError::NotInitialized)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn create_without_match_fails() {
        let scanner = FixedScanner::new(vec![
            Advertisement::new(Some("Headphones"), "11:11:11:11:11:11"),
            Advertisement::new(None, ADDRESS),
        ]);
        let result =
            LmBluetoothClient::create(credentials(), &scanner, true, BluetoothConfig::default())
                .await;
        assert!(matches!(result, Err(LmError::DeviceNotFound)));
    }

    #[tokio::test]
    async fn first_match_wins() -> Result<(), LmError> {
        let scanner = FixedScanner::new(vec![
            Advertisement::new(Some("MINI_1"), "00:00:00:00:00:01"),
            Advertisement::new(Some("MICRA_2"), "00:00:00:00:00:02"),
        ]);
        let mut client = LmBluetoothClient::new(credentials(), BluetoothConfig::default());
        client.discover_device(&scanner).await?;
        assert_eq!("00:00:00:00:00:01", client.address()?);
        Ok(())
    }

    #[tokio::test]
    async fn discovery_never_rebinds_address() -> Result<(), LmError> {
        let driver = RecordingDriver::new(ADDRESS);
        let mut client = client(&driver);
        let scanner = FixedScanner::new(vec![Advertisement::new(
            Some("MICRA_2"),
            "00:00:00:00:00:02",
        )]);
        client.discover_device(&scanner).await?;
        assert_eq!(ADDRESS, client.address()?);
        Ok(())
    }

    #[tokio::test]
    async fn custom_prefixes() -> Result<(), LmError> {
        let config = BluetoothConfig {
            model_prefixes: vec!["LM_".to_owned()],
            ..Default::default()
        };
        let scanner = FixedScanner::new(vec![
            Advertisement::new(Some("MICRA_1"), "00:00:00:00:00:01"),
            Advertisement::new(Some("LM_9"), "00:00:00:00:00:09"),
        ]);
        let client = LmBluetoothClient::create(credentials(), &scanner, false, config).await?;
        assert_eq!("00:00:00:00:00:09", client.address()?);
        Ok(())
    }

    #[tokio::test]
    async fn uninitialized_session() {
        let mut client = LmBluetoothClient::new(credentials(), BluetoothConfig::default());
        assert!(matches!(client.address(), Err(LmError::NotInitialized)));
        assert!(!client.connected().await);
        assert!(matches!(
            client.set_steam(true).await,
            Err(LmError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn set_power_connects_authenticates_then_writes() -> Result<(), LmError> {
        let driver = RecordingDriver::new(ADDRESS);
        let mut client = client(&driver);
        assert!(!client.connected().await);

        client.set_power(true).await?;
        assert_eq!(
            vec![
                DriverEvent::Connect,
                auth_write(),
                settings_write(r#"{"name":"MachineChangeMode","parameter":{"mode":"BrewingMode"}}"#),
            ],
            driver.events()
        );
        assert!(client.connected().await);
        Ok(())
    }

    #[tokio::test]
    async fn open_link_is_reused() -> Result<(), LmError> {
        let driver = RecordingDriver::new(ADDRESS);
        let mut client = client(&driver);
        client.set_power(true).await?;
        driver.clear_events();

        client.set_power(false).await?;
        client.set_steam(true).await?;
        assert_eq!(
            vec![
                settings_write(r#"{"name":"MachineChangeMode","parameter":{"mode":"StandBy"}}"#),
                settings_write(
                    r#"{"name":"SettingBoilerEnable","parameter":{"identifier":"SteamBoiler","state":true}}"#
                ),
            ],
            driver.events()
        );
        Ok(())
    }

    #[tokio::test]
    async fn reconnect_reauthenticates() -> Result<(), LmError> {
        let driver = RecordingDriver::new(ADDRESS);
        let mut client = client(&driver);
        client.set_steam(false).await?;
        driver.drop_link();
        assert!(!client.connected().await);
        driver.clear_events();

        client
            .set_temp(BoilerType::Coffee, 93.5)
            .await?;
        assert_eq!(
            vec![
                DriverEvent::Connect,
                auth_write(),
                settings_write(
                    r#"{"name":"SettingBoilerTarget","parameter":{"identifier":"CoffeeBoiler1","value":93.5}}"#
                ),
            ],
            driver.events()
        );
        Ok(())
    }

    #[tokio::test]
    async fn connect_failure_skips_write() {
        let driver = RecordingDriver::new(ADDRESS).failing_connect();
        let mut client = client(&driver);
        let result = client.set_power(true).await;
        assert!(matches!(
            result,
            Err(LmError::ConnectionFailed(TransportError::Timeout))
        ));
        assert_eq!(vec![DriverEvent::Connect], driver.events());
        assert!(!client.connected().await);
    }

    #[tokio::test]
    async fn auth_failure_leaves_session_disconnected() {
        let driver = RecordingDriver::new(ADDRESS).failing_writes_to(AUTH_CHARACTERISTIC);
        let mut client = client(&driver);
        let result = client.set_power(true).await;
        assert!(matches!(result, Err(LmError::ConnectionFailed(_))));
        assert_eq!(
            vec![DriverEvent::Connect, DriverEvent::Disconnect],
            driver.events()
        );
        assert!(!client.connected().await);
    }

    #[tokio::test]
    async fn settings_write_failure_is_a_transport_error() {
        let driver = RecordingDriver::new(ADDRESS).failing_writes_to(SETTINGS_CHARACTERISTIC);
        let mut client = client(&driver);
        let result = client.set_power(true).await;
        assert!(matches!(result, Err(LmError::Transport(_))));
        assert!(client.connected().await);
    }

    #[tokio::test]
    async fn other_characteristics_are_not_terminated() -> Result<(), LmError> {
        let driver = RecordingDriver::new(ADDRESS);
        let mut client = client(&driver);
        let other = Uuid::from_u128(0x1234);
        client.write_message(other, "raw").await?;
        client
            .write_message(SETTINGS_CHARACTERISTIC, b"{}".to_vec())
            .await?;
        assert_eq!(
            vec![
                DriverEvent::Connect,
                auth_write(),
                DriverEvent::Write(other, b"raw".to_vec()),
                DriverEvent::Write(SETTINGS_CHARACTERISTIC, b"{}\0".to_vec()),
            ],
            driver.events()
        );
        Ok(())
    }

    #[tokio::test]
    async fn manual_binding_connects_immediately() -> Result<(), LmError> {
        let driver = RecordingDriver::new(ADDRESS);
        let mut client = LmBluetoothClient::new(credentials(), BluetoothConfig::default());
        client
            .new_client_from_device(Box::new(driver.clone()))
            .await?;
        assert_eq!(vec![DriverEvent::Connect, auth_write()], driver.events());
        assert!(client.connected().await);
        assert_eq!(ADDRESS, client.address()?);

        client.set_power(false).await?;
        assert_eq!(3, driver.events().len());
        Ok(())
    }

    #[tokio::test]
    async fn manual_binding_failure() {
        let driver = RecordingDriver::new(ADDRESS).failing_connect();
        let mut client = LmBluetoothClient::new(credentials(), BluetoothConfig::default());
        let result = client.new_client_from_device(Box::new(driver)).await;
        assert!(matches!(result, Err(LmError::ConnectionFailed(_))));
        assert!(!client.connected().await);
    }

    #[tokio::test]
    async fn create_open_failure_is_a_connection_failure() {
        let scanner =
            FixedScanner::new(vec![Advertisement::new(Some("MICRA_1"), ADDRESS)]).failing_open();
        let result =
            LmBluetoothClient::create(credentials(), &scanner, true, BluetoothConfig::default())
                .await;
        assert!(matches!(
            result,
            Err(LmError::ConnectionFailed(TransportError::PeripheralNotFound(_)))
        ));
        assert_eq!(vec![ADDRESS.to_owned()], *scanner.opened.lock().unwrap());
    }

    #[tokio::test]
    async fn link_state_error_means_disconnected() -> Result<(), LmError> {
        let driver = RecordingDriver::new(ADDRESS).failing_is_connected();
        let mut client = client(&driver);
        client.set_power(true).await?;
        assert!(!client.connected().await);
        driver.clear_events();

        client.set_steam(true).await?;
        assert_eq!(
            vec![
                DriverEvent::Connect,
                auth_write(),
                settings_write(
                    r#"{"name":"SettingBoilerEnable","parameter":{"identifier":"SteamBoiler","state":true}}"#
                ),
            ],
            driver.events()
        );
        Ok(())
    }

    #[tokio::test]
    async fn disconnect_error_after_auth_failure_is_ignored() {
        let driver = RecordingDriver::new(ADDRESS)
            .failing_writes_to(AUTH_CHARACTERISTIC)
            .failing_disconnect();
        let mut client = client(&driver);
        let result = client.set_power(true).await;
        assert!(matches!(
            result,
            Err(LmError::ConnectionFailed(TransportError::Timeout))
        ));
        assert_eq!(
            vec![DriverEvent::Connect, DriverEvent::Disconnect],
            driver.events()
        );
    }

    #[tokio::test]
    async fn non_finite_temperatures_are_never_sent() {
        let driver = RecordingDriver::new(ADDRESS);
        let mut client = client(&driver);
        for celsius in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                client.set_temp(BoilerType::Steam, celsius).await,
                Err(LmError::InvalidArgument(_))
            ));
        }
        assert!(driver.events().is_empty());
    }

    #[tokio::test]
    async fn manual_binding_keeps_existing_address() -> Result<(), LmError> {
        let first = RecordingDriver::new(ADDRESS);
        let mut client = client(&first);
        let second = RecordingDriver::new("00:00:00:00:00:02");
        client
            .new_client_from_device(Box::new(second.clone()))
            .await?;
        assert_eq!(ADDRESS, client.address()?);
        assert_eq!(vec![DriverEvent::Connect, auth_write()], second.events());
        assert!(first.events().is_empty());
        Ok(())
    }
}

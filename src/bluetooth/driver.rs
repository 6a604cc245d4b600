use crate::prelude::*;
use crate::protocol::BluetoothConfig;

use uuid::Uuid;

/// A device seen during a scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advertisement {
    pub name: Option<String>,
    pub address: String,
}

impl Advertisement {
    pub fn new(name: Option<&str>, address: &str) -> Self {
        Advertisement {
            name: name.map(str::to_owned),
            address: address.to_owned(),
        }
    }

    /// Unnamed advertisers never match.
    pub fn matches(&self, config: &BluetoothConfig) -> bool {
        self.name
            .as_deref()
            .map_or(false, |name| config.matches_model(name))
    }
}

/// A transport bound to a single device. See https://smallcultfollowing.com/babysteps/blog/2019/10/26/async-fn-in-traits-are-hard/
/// for why these return boxed futures.
pub trait LmDriver: Send + Sync {
    /// Transport-level address of the device.
    fn address(&self) -> String;

    /// Open the link.
    fn connect<'a>(&'a self) -> AsyncFuture<'a, ()>;

    /// Close the link.
    fn disconnect<'a>(&'a self) -> AsyncFuture<'a, ()>;

    /// Current link state.
    fn is_connected<'a>(&'a self) -> AsyncFuture<'a, bool>;

    /// Write one value to a characteristic. No response is read back.
    fn write<'a>(&'a self, characteristic: Uuid, data: Vec<u8>) -> AsyncFuture<'a, ()>;
}

/// Discovers devices and builds unconnected transports for them.
pub trait LmScanner: Send + Sync {
    /// Listen for advertisements and return everything seen, in scan order.
    fn discover<'a>(&'a self) -> AsyncFuture<'a, Vec<Advertisement>>;

    /// Build a transport for the device at `address`. Does not connect.
    fn open<'a>(&'a self, address: &'a str) -> AsyncFuture<'a, Box<dyn LmDriver>>;
}

//! Universal imports for this crate.

use crate::bluetooth::TransportError;

pub use std::future::Future;
pub use std::{pin::Pin, time::Duration};

pub use crate::{info, trace_packet, warning};

pub type AsyncFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

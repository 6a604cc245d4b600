//! Lightweight logging macros. Tracing output is off until [`enable_tracing`] is called.

use std::sync::atomic::{AtomicBool, Ordering};

#[doc(hidden)]
pub static TRACE_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable_tracing() {
    TRACE_ENABLED.store(true, Ordering::Relaxed);
}

pub fn is_tracing() -> bool {
    TRACE_ENABLED.load(Ordering::Relaxed)
}

/// Traces protocol-level traffic to stderr when tracing is enabled.
#[macro_export]
macro_rules! trace_packet {
    ($($arg:tt)*) => {{
        if $crate::logging::TRACE_ENABLED.load(std::sync::atomic::Ordering::Relaxed) {
            eprintln!("[TRACE] {}", std::format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => {{
        eprintln!("[WARNING] {}", std::format!($($arg)*));
    }};
}

/// User-facing output.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        println!("{}", std::format!($($arg)*));
    }};
}

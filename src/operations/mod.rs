//! Machine-level operations: model-aware power, steam and temperature control.

mod boiler;
mod machine;

pub use boiler::*;
pub use machine::*;

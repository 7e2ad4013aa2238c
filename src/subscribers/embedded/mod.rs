//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders runtime events through `tracing` (demo/debug).

mod log;

pub use log::LogWriter;

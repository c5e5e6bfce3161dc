//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (SheetReader, OptionStore)
//! but are themselves concrete structs, not traits.

mod import;

pub use import::{ImportOutcome, ImportService, PreparedSheet};

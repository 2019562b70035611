//! Core library for the CFS simulation engine: Ordered Set, Run Queue,
//! Event Tree, CPU Pool, and the Simulation Engine that weaves them
//! together. The loader, printer, and CLI wiring live alongside the engine
//! so the binary and the test suite can both drive it, but the engine
//! itself only depends on the modules below it in this list.

pub mod config;
pub mod cpu;
pub mod engine;
pub mod error;
pub mod event;
pub mod loader;
pub mod ordered_set;
pub mod printer;
pub mod process;
pub mod run_queue;
pub mod trace;

pub use engine::Engine;
pub use error::{SimError, SimResult};
pub use process::Process;
pub use trace::TraceRecord;

//! Application Layer
//!
//! Orchestrates the domain and the simulation engine:
//!
//! - **Ports**: interfaces to market data, strategy selection and event publication
//! - **Controller**: command dispatch over the analyzer and the engine
//! - **Live**: queue-fed decision loop driven by the ports

pub mod controller;
pub mod live;
pub mod ports;

pub use controller::{Command, CommandOutput, Controller, PortfolioSummary};
pub use live::{LiveOutcome, LiveSession, LiveSettings};
pub use ports::*;

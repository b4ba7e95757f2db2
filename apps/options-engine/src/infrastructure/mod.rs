//! Infrastructure Layer
//!
//! Adapters implementing the application ports:
//!
//! - `marketdata/`: date-keyed replay feed
//! - `selector/`: scripted and rule-based strategy selectors

pub mod marketdata;
pub mod selector;

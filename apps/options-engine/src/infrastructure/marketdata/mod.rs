//! Market data adapters.

mod replay;

pub use replay::ReplayMarketData;

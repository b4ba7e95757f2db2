//! Application Ports (Driven)
//!
//! Interfaces to the collaborators that live outside the decision loop:
//! market data, strategy selection and lifecycle event publication.

mod event_publisher_port;
mod market_data_port;
mod strategy_selector_port;

pub use event_publisher_port::{
    EventPublishError, EventPublisherPort, NoOpEventPublisher, TracingEventPublisher,
};
pub use market_data_port::{MarketDataError, MarketDataPort};
pub use strategy_selector_port::{SelectorError, StrategySelectorPort};

//! Yell relay core: registry, formatting, rate limiting and delivery.

pub mod formatter;
pub mod governor;
pub mod queue;
pub mod registry;
pub mod sink;

pub use governor::RateLimitGovernor;
pub use queue::{DeliverySettings, YellQueue};
pub use registry::ChannelRegistry;

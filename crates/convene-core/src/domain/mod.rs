//! Shared value types used across the aggregation layer.

mod timestamp;

pub use timestamp::UtcDateTime;

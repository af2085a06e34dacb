//! General-purpose helpers shared by the office modules
//!
//! - `dates`: formatting, tolerant parsing, ranges and calendar arithmetic
//! - `text`: similarity, case conversion, split/join
//! - `collections`: keyed maps, distribution, chunking
//! - `throttle`: run-at-most-once-per-interval guard

pub mod collections;
pub mod dates;
pub mod text;
pub mod throttle;

pub use dates::{DateField, DateUnit};
pub use throttle::Throttle;

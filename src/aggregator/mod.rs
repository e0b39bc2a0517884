//! Cross-thread aggregation of per-thread event profiles.
//!
//! This module turns a document's per-thread short-name aggregates into:
//! - A dense `[node, context, thread, event, metric]` array per flavor
//! - Sum, max, min, population standard deviation and mean over threads

pub mod array;
pub mod view;

// Re-export main types
pub use array::{DenseArray, Reduction, Statistic};
pub use view::AggregateView;

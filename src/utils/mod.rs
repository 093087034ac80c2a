//! Tensor helpers shared by layers and containers.

mod scatter;

pub use scatter::{add_self_loops, degree, scatter, Aggregation};

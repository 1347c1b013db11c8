//! Gradient-boosted decision tree engine
//!
//! Second-order boosting over quantile-binned features, with three growth
//! policies matching the registered model families:
//!
//! - depth-wise trees, split level by level up to `max_depth`
//! - leaf-wise trees, always splitting the leaf with the largest gain
//! - oblivious trees, where every node of a level shares one split
//!
//! Split selection is fully deterministic: equal gains are resolved by
//! (feature, bin, node id), and row/column subsampling uses the seeded
//! [`LcgRng`](crate::deterministic::LcgRng).
//!
//! # Model Format
//!
//! Fitted models serialize as plain JSON; trees are flat node arrays:
//!
//! ```json
//! {"nodes":[
//!   {"id":0,"left":1,"right":2,"feature_idx":3,"threshold":12.5,"leaf":null},
//!   {"id":1,"left":-1,"right":-1,"feature_idx":-1,"threshold":0.0,"leaf":-0.21},
//!   {"id":2,"left":-1,"right":-1,"feature_idx":-1,"threshold":0.0,"leaf":0.37}
//! ]}
//! ```

pub mod binning;
mod grower;
pub mod model;
pub mod objective;
pub mod params;
pub mod tree;

pub use model::GbdtModel;
pub use objective::Objective;
pub use params::{BoostParams, GrowthPolicy};
pub use tree::{Node, Tree};

//! Hardware hierarchy: tree storage, hazard-rate rollup and similar-item
//! analysis.

pub mod rollup;
pub mod similar_item;
pub mod tree;

pub use rollup::{availability, rollup, RollupSummary};
pub use similar_item::{similar_item, SimilarItemInputs, SimilarItemResult};
pub use tree::{FailureRateType, HardwareNode, HardwareTree, NodeOutputs};

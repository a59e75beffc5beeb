//! Tree Engine Operations
//!
//! Store-independent algorithms behind the theory tree:
//!
//! - [`materialize`] - breadth-first assembly of a skill's forest
//! - [`reorder`] - move planning and sibling renumbering
//! - [`ordering`] - insertion policy and contiguity checks
//!
//! These functions only see rows that were already loaded. `TheoryService`
//! drives them against a `TheoryStore` and owns transaction boundaries.

pub mod materialize;
pub mod ordering;
pub mod reorder;

pub use materialize::{assemble, flatten, TreeAssembler};
pub use ordering::{contiguity_violations, next_order_index, GroupViolation};
pub use reorder::{clamp_index, plan_gap_close, plan_move, MovePlan, Placement};

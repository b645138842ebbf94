//! HTTP handler modules for boxsight-api.

pub mod analysis;
pub mod meta;

pub use analysis::{count_boxes, count_boxes_base64, count_boxes_simple};
pub use meta::{health_check, root};

pub mod estimate;
pub mod paginate;

pub use estimate::estimate_lines;
pub use paginate::{group_cost, paginate, Page};

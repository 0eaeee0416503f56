pub mod fallback;
pub mod grid_index;
pub mod point;
pub mod query;

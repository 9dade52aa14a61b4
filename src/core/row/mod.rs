//! 行布局与行数组操作

pub mod layout;
mod name_cache;
pub mod ops;

pub use layout::RowLayout;
pub use ops::OVER_ALLOCATE_SIZE;

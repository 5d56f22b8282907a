//! Weekly timetable engine: per-topic tables, the topics a user may see, and
//! the overlay of many tables into one filtered week.

pub use department::{available_topics, query_table, DepartmentTable, DepartmentTopics, TopicEntry};
pub use error::{Error, Result};
pub use grid::Grid;
pub use query::{Choice, InvalidChoice, Merged, Query, TimetableMerger};
pub use store::{MemoryStore, Store};
pub use table::TopicTable;
pub use update::update_topics;

/// Rows of a grid, day 0 is Monday.
pub const DAYS: usize = 7;
/// Columns of a grid.
pub const PERIODS: usize = 6;

mod department;
mod error;
mod grid;
mod legacy;
pub mod model;
mod query;
mod store;
mod table;
mod update;

/// Weekday of a grid row.
pub fn weekday(day: usize) -> Option<time::Weekday> {
  (day < DAYS).then(|| time::Weekday::Monday.nth_next(day as u8))
}

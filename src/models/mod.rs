pub mod bucket;
pub mod day_content;
pub mod group;
pub mod todo;

pub use bucket::{Bucket, DateKey};
pub use day_content::DayContent;
pub use group::{filter_groups, DateSummary, Group, Theme, ViewMode, VisibilityMode, WindowBounds};
pub use todo::{TodoItem, DEFAULT_TIMER_MINUTES};

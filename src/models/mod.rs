pub mod config;
pub mod page;
pub mod schedule;

pub use config::{AppConfig, LayoutOptions, PosterDefaults, RenderOptions, ThemeConfig};
pub use page::{PosterSize, RenderedPage};
pub use schedule::{group_by_day, validate_entries, DayGroup, ScheduleEntry, Weekday};

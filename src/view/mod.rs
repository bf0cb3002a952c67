pub mod render;
pub mod trip_list;

pub use render::{render, TripRow};
pub use trip_list::{mark_completed, TripListView};

pub mod jobs;
pub mod uploads;
pub mod videos;

pub mod time_window;
pub mod video_id;

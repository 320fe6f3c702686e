//! Background tasks.

pub mod session_reaper;

pub use session_reaper::{run_sweep, start_session_reaper, ReaperConfig};

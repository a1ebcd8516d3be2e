pub mod config;
pub mod logging;
pub mod time;

pub use config::Config;
pub use logging::init_logging;
pub use time::DaySchedule;

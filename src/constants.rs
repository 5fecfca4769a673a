pub const NO_DB_MSG: &str = "Please pick a restaurant first: /restaurant";
pub const DEFAULT_DB: &str = "qrmenu.sqlite";

pub const DEFAULT_CURRENCY: &str = "THB";
pub const DEFAULT_POPULAR_LIMIT: i64 = 10;

pub const MAX_ENTRIES_IN_MSG: usize = 25;
// telegram rejects messages above 4096 chars
pub const MAX_MSG_CHARS: usize = 4000;
pub const MAX_SUBTITLE_CHARS: usize = 200;

pub const API_TIMEOUT_SECS: u64 = 10;
// registrations and the menu cache share one file
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 5;
pub const RESTAURANT_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_REFRESH_MINUTES: u64 = 30;

pub const TASK_SCHED_TARGET: &str = "qrmenu_telegram_rs::TaskSched";

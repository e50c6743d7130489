//! Parsers that turn chat input into deadlines, option sets and order quantities.
pub mod deadline;
pub mod fuzzy;
pub mod order_lines;
pub mod window_args;

pub use deadline::{parse_deadline, DeadlineError, DEFAULT_WINDOW_DURATION};
pub use fuzzy::match_option;
pub use order_lines::parse_order_lines;
pub use window_args::{parse_window_args, WindowArgs, DEFAULT_OPTIONS, DEFAULT_WINDOW_NAME};

pub mod errors;
mod open_windows;
pub mod summary;
pub mod window_flow_api;
pub mod window_objects;

pub mod acquisition;
pub mod collector;
pub mod history;
pub mod platform;
pub mod sensors;
pub mod snapshot;

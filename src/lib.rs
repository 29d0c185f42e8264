pub mod bridge;
pub mod config;
pub mod format;
pub mod poller;
pub mod synthetic;
pub mod system;

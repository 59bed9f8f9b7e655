pub mod clipboard;
pub mod config;
pub mod contract;
pub mod core_service;
pub mod decorator;
pub mod history;
pub mod history_store;
pub mod logging;
pub mod merger;
pub mod model;
pub mod overlay_state;
pub mod runtime;
pub mod scheduler;
pub mod search;
pub mod session_log;
pub mod settings;
pub mod shortcuts;
pub mod sorter;

pub mod bible;
pub mod chapters;
pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod picker;
pub mod session;
pub mod settings;
pub mod state;
pub mod tracker;
pub mod ui;
pub mod viewport;

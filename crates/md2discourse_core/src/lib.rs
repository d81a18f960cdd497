pub mod api;
pub mod config;
pub mod import;
pub mod markdown;
pub mod site;

pub mod catalog;
pub mod config;
pub mod executors;
pub mod models;
pub mod normalize;
pub mod session;
pub mod shell;

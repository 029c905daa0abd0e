pub mod commands;
pub mod config;
pub mod identity;
pub mod render;
pub mod repl;

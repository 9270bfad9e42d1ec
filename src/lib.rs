#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod document;
pub mod error;
pub mod logging;
pub mod patcher;
pub mod records;
pub mod settings;
pub mod utils;

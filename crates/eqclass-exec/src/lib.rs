pub mod config;
pub mod implementation;
pub mod process;
pub mod result;

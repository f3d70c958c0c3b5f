//! Side-effecting operations: files on disk and external processes.

pub mod compat;
pub mod config;
pub mod database;
pub mod harness;
pub mod logs;

//! Query and reporting toolkit for model-evaluation results.
//!
//! - **[`core`]**: Pure logic over in-memory records: the filter/sort query
//!   pipeline, typed comparison values, view state, and chart aggregation.
//! - **[`io`]**: Side-effecting operations (database and log files, config,
//!   the external benchmark CLI).
//!
//! [`cli`] wires both together behind the `benchci` subcommands and
//! [`render`] turns a view into text, JSON, or HTML.

pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod render;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

//! Pure logic over in-memory records. No I/O.

pub mod chart;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod value;
pub mod view;

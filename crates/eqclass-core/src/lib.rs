pub mod error;
pub mod executor;
pub mod limits;
pub mod log;
pub mod manifest;
pub mod pipeline;
pub mod report;
pub mod verdict;

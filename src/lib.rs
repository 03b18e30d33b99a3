pub mod aggregate;
pub mod cli;
pub mod config;
pub mod engine;
pub mod pipeline;
pub mod postprocess;
pub mod process;
pub mod report;
pub mod sample;
pub mod util;

pub mod analyzers;
pub mod chart;
pub mod config;
pub mod document;
pub mod fetch;
pub mod output;
pub mod parser;

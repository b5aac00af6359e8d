pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod markup;
pub mod pipeline;
pub mod report;
pub mod search;
pub mod tokens;

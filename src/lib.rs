pub mod assistant;
pub mod config;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod presentation;
pub mod prompt;
pub mod seed;
pub mod store;

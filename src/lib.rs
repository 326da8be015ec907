pub mod app;
pub mod assembler;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod fuzzy;
pub mod ingest;
pub mod output;
pub mod resolver;
pub mod source;
pub mod tui;

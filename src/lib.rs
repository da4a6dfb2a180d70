pub mod api;
pub mod config;
pub mod humanize;
pub mod observability;
pub mod outputs;
pub mod uploader;

pub mod analytics;
pub mod api;
pub mod config;
pub mod content;
pub mod editorial;
pub mod error;
pub mod i18n;
pub mod models;
pub mod pagebuilder;
pub mod retry;
pub mod richtext;
pub mod scheduler;
pub mod security;
pub mod settings;
pub mod social;
pub mod store;
pub mod validation;

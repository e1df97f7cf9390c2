pub mod catalog;
pub mod client;
pub mod config;
pub mod controller;
pub mod cookie;
pub mod datasource;
pub mod errors;
pub mod query;
pub mod rules;
pub mod session;
pub mod widgets;

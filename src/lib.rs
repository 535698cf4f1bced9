pub mod commands;
pub mod discovery;
pub mod http;
pub mod model;
pub mod platform;
pub mod source;

pub mod admin;
pub mod billing;
pub mod chat;
pub mod project;
pub mod settings;
pub mod user;

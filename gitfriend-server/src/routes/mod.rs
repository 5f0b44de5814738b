pub mod chat;
pub mod github;
pub mod history;

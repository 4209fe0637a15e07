pub mod messages;
pub mod transcript;

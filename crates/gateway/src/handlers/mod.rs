//! API handlers module

pub mod articles;
pub mod dialogs;
pub mod export;
pub mod health;
pub mod messages;
pub mod processing;
pub mod search;
pub mod uploads;

mod multipart;

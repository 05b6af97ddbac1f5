pub mod auth;
pub mod comment;
pub mod history;
pub mod shared;
pub mod video;

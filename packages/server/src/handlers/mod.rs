pub mod auth;
mod catalog;
pub mod category;
pub mod comment;
pub mod genre;
pub mod review;
pub mod title;
pub mod user;

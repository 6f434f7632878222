mod common;

mod auth;
mod catalog;
mod comments;
mod reviews;

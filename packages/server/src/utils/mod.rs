pub mod confirmation;
pub mod jwt;
pub mod mail;

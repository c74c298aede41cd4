pub mod auth;
pub mod media;
pub mod resource;

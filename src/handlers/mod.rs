pub mod auth;
pub mod gallery;
pub mod image;
pub mod manage;

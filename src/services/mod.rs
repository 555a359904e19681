pub mod auth;
pub mod gallery;
pub mod image;
pub mod oauth;
pub mod session;

#[cfg(test)]
pub mod testing;

pub use auth::AuthService;
pub use gallery::GalleryService;
pub use image::ImageService;
pub use oauth::{GoogleOAuth, OAuthProvider};
pub use session::{AuthEvent, ConsoleMode, SessionController};

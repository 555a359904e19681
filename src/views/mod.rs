pub mod console;
pub mod gallery;
pub mod html;

pub use console::{render_console, render_image_list, ConsoleView};
pub use gallery::render_gallery;

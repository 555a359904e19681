pub mod local;
pub mod provider;

pub use local::*;
pub use provider::*;

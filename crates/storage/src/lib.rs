mod debounce;
mod error;
pub mod fs;
mod store;

pub use debounce::*;
pub use error::*;
pub use store::*;

pub mod signals;
pub mod context;
pub mod errors;

pub use signals::*;
pub use context::*;
pub use errors::*;

mod compress;
pub use compress::*;
mod hash;
pub use hash::*;
mod json;
pub use json::*;
#[cfg(feature = "request")]
mod request;
#[cfg(feature = "request")]
pub use request::*;

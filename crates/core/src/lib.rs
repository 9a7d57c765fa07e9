pub mod error;
pub mod logging;
pub mod preference;
pub mod router;

pub use error::Result;
pub use router::Router;

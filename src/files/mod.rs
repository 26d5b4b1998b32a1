//! Static file resolution and zero-copy transmission.

pub mod resolver;
pub mod transmit;

pub use resolver::{DEFAULT_DOCUMENT, OpenFile, Resolver, Target};
pub use transmit::send_file;

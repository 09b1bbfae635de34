mod error;
mod interface;
mod keyspace;
mod memory;

pub use error::*;
pub use interface::*;
pub use keyspace::*;
pub use memory::*;

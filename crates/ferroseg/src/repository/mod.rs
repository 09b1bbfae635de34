mod interface;
mod store;

pub use interface::*;
pub use store::*;

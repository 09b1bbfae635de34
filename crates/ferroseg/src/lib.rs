#![doc = include_str!("../README.md")]

mod error;
mod repository;
mod rule;
mod segment;
mod status;
mod store;

pub use crate::error::*;
pub use crate::repository::*;
pub use crate::rule::*;
pub use crate::segment::*;
pub use crate::status::*;
pub use crate::store::*;

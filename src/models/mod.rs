//! Data models

mod certificate;
pub mod pson;

pub use certificate::*;

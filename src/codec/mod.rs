pub mod file;
pub mod web;

pub use file::*;
pub use web::*;

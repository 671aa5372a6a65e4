pub mod catalog;
pub mod path;
pub mod spec;

pub use catalog::*;
pub use path::*;
pub use spec::*;

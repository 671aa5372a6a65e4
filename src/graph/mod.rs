pub mod dataflow;
pub mod node;

pub use dataflow::*;
pub use node::*;

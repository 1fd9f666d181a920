pub mod context;
pub mod records;
pub mod stat;

pub use context::*;
pub use records::*;
pub use stat::*;

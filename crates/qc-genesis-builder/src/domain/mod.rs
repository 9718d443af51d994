pub mod builder;
pub mod contracts;
pub mod fake;
pub mod transactions;

pub use builder::*;
pub use contracts::*;
pub use fake::*;
pub use transactions::*;

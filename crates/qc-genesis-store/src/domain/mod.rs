pub mod cancel;
pub mod container;
pub mod dump;
pub mod spill;
pub mod writer;

pub use cancel::*;
pub use container::*;
pub use dump::*;
pub use spill::*;
pub use writer::*;

pub mod native_processor;

pub use native_processor::*;

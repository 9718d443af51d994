pub mod memory_kv;

pub use memory_kv::*;

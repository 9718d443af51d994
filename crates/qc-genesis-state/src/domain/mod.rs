pub mod errors;
pub mod keys;
pub mod state_db;

pub use errors::*;
pub use keys::*;
pub use state_db::*;

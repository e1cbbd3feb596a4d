pub mod config_io;
pub mod documents;
pub mod fs_store;
pub mod memory_store;
pub mod store;
pub mod sync;

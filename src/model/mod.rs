pub mod task;
pub mod taxonomy;
pub mod view;
pub mod config;

pub use task::*;
pub use taxonomy::*;
pub use view::*;
pub use config::*;

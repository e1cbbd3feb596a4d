pub mod board;
pub mod task_ops;
pub mod taxonomy_ops;
pub mod view;

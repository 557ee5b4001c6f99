pub mod context;
pub mod persistence;
pub mod task_store;
mod task_store_tests;
pub mod theme_store;
pub mod view;

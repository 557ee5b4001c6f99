pub mod storage;
pub mod task;
pub mod theme;

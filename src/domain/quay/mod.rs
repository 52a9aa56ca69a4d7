pub mod barrier;
pub mod coordinator;
pub mod crane;
pub mod station;

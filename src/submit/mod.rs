pub mod coordinator;
pub mod session;
pub mod sink;

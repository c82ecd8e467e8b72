pub mod flow;
pub mod view;
pub mod wizard;

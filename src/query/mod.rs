pub mod handlers;
pub mod sort;

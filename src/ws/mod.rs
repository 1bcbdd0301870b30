pub mod author;
pub mod viewer;

pub mod page;
pub mod spotify;

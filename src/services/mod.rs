pub mod extractor;
pub mod resolver;
pub mod spotify;
pub mod sync;

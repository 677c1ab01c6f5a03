//! CALINE3 input decks

mod reader;

pub use reader::JobReader;

pub mod documents;

pub use documents::{read_document, write_document, Edit};

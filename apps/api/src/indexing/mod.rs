// Index build: candidate blocks and auxiliary corpora, chunked and handed to
// the vector store.

pub mod builder;
pub mod handlers;
pub mod splitter;

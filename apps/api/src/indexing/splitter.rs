//! Fixed-size character chunking over `text-splitter`.
//!
//! Chunks never exceed `chunk_size` characters and consecutive chunks of one
//! block share up to `chunk_overlap` characters. Splits prefer paragraph,
//! then line, sentence and word boundaries before falling back to characters.

use text_splitter::{ChunkConfig, ChunkConfigError, TextSplitter};

use crate::models::chunk::TextBlock;

pub struct BlockSplitter(TextSplitter<text_splitter::Characters>);

impl BlockSplitter {
    /// Fails when `chunk_overlap` is not smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkConfigError> {
        let config = ChunkConfig::new(chunk_size).with_overlap(chunk_overlap)?;
        Ok(Self(TextSplitter::new(config)))
    }

    /// Splits every block, each chunk inheriting its block's metadata. Block order is kept.
    pub fn split_blocks(&self, blocks: &[TextBlock]) -> Vec<TextBlock> {
        blocks
            .iter()
            .flat_map(|block| {
                self.0
                    .chunks(&block.content)
                    .map(|chunk| TextBlock::new(chunk, block.metadata.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

// Candidate records: normalization, derived qualification signals, and the
// text blocks handed to the index builder.

pub mod blocks;
pub mod loader;
pub mod payload;
pub mod record;
pub mod rules;

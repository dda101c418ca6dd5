//! Text-Block Builder: turns a normalized candidate into ordered text blocks.
//!
//! Order is significant: header, skills, derived keywords, raw dump. The
//! splitter chunks blocks contiguously, so reordering moves chunk boundaries.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::candidates::record::CandidateRecord;
use crate::candidates::rules::{
    BACKEND_HINT, BACKEND_TITLE_KEYWORDS, FRONTEND_HINT, FRONTEND_TITLE_KEYWORDS, TECH_KEYWORDS,
};
use crate::models::chunk::{Metadata, TextBlock, META_TYPE, TYPE_CANDIDATE};

impl CandidateRecord {
    /// Block contents in index order. Never empty: the raw dump is always last.
    pub fn text_blocks(&self) -> Vec<String> {
        let mut blocks = Vec::with_capacity(4);

        blocks.push(format!(
            "[Candidate] {} {}\nSummary:\n{}",
            self.candidate_id,
            self.title_hint(),
            self.summary
        ));

        if !self.skills.is_empty() {
            let names: Vec<&str> = self.skills.iter().map(|s| s.name.as_str()).collect();
            blocks.push(format!("Skills: {}", names.join(", ")));
        }

        let keywords = self.derived_keywords();
        if !keywords.is_empty() {
            let keywords: Vec<&str> = keywords.into_iter().collect();
            blocks.push(format!("DerivedKeywords: {}", keywords.join(", ")));
        }

        blocks.push(self.raw.to_single_line());
        blocks
    }

    /// Text blocks tagged with the candidate metadata used for retrieval filters.
    pub fn to_text_blocks(&self) -> Vec<TextBlock> {
        let metadata = self.block_metadata();
        self.text_blocks()
            .into_iter()
            .map(|content| TextBlock::new(content, metadata.clone()))
            .collect()
    }

    pub fn block_metadata(&self) -> Metadata {
        let level = self.english_level();
        let mut metadata = Metadata::new();
        metadata.insert("candidate_id".into(), json!(self.candidate_id));
        metadata.insert("prepared".into(), json!(self.prepared()));
        metadata.insert("english_level".into(), json!(level.as_str()));
        metadata.insert("english_level_num".into(), json!(level.rank()));
        metadata.insert(META_TYPE.into(), Value::from(TYPE_CANDIDATE));
        metadata
    }

    /// Backend hint wins over frontend when both match.
    pub fn title_hint(&self) -> &'static str {
        let titles = format!(
            "{} {}",
            self.raw.str_at(&["GeneralInfo", "TitleDetected"]),
            self.raw.str_at(&["GeneralInfo", "TitlePredicted"])
        )
        .to_lowercase();

        if BACKEND_TITLE_KEYWORDS.iter().any(|kw| titles.contains(kw)) {
            BACKEND_HINT
        } else if FRONTEND_TITLE_KEYWORDS.iter().any(|kw| titles.contains(kw)) {
            FRONTEND_HINT
        } else {
            ""
        }
    }

    /// Technology labels found in resume body + summary, sorted by label.
    pub fn derived_keywords(&self) -> BTreeSet<&'static str> {
        let text = format!("{} {}", self.resume_text(), self.summary);
        TECH_KEYWORDS
            .iter()
            .filter(|(pattern, _)| pattern.is_match(&text))
            .map(|(_, label)| *label)
            .collect()
    }
}

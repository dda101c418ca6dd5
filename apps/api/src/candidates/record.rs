//! Candidate Record Normalizer: typed view over a raw candidate document
//! plus the derived qualification attributes (`prepared`, `english_level`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::candidates::payload::{number_or_zero, scalar_text, Payload};
use crate::candidates::rules::{
    CEFR_CODE, ENGLISH_LANGUAGE_NAMES, MIN_PREPARED_SCORE, SENIORITY_KEYWORDS,
};

/// CEFR English proficiency, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnglishLevel {
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl EnglishLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EnglishLevel::Unknown => "UNKNOWN",
            EnglishLevel::A1 => "A1",
            EnglishLevel::A2 => "A2",
            EnglishLevel::B1 => "B1",
            EnglishLevel::B2 => "B2",
            EnglishLevel::C1 => "C1",
            EnglishLevel::C2 => "C2",
        }
    }

    /// Numeric rank stored as `english_level_num`: A1=1 .. C2=6, UNKNOWN=0.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Parses a CEFR code such as `"b2"`. Anything else (including `"UNKNOWN"`) is `None`.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "A1" => Some(EnglishLevel::A1),
            "A2" => Some(EnglishLevel::A2),
            "B1" => Some(EnglishLevel::B1),
            "B2" => Some(EnglishLevel::B2),
            "C1" => Some(EnglishLevel::C1),
            "C2" => Some(EnglishLevel::C2),
            _ => None,
        }
    }
}

impl std::fmt::Display for EnglishLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `SkillMatrix` entry: the skill name plus whatever else the source carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    pub attributes: Map<String, Value>,
}

/// One `Languages` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: String,
    pub proficiency: String,
}

/// A candidate document normalized once at index-build time and never mutated.
/// `prepared` and `english_level` are recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub candidate_id: String,
    pub raw: Payload,
    pub summary: String,
    pub skills: Vec<SkillEntry>,
    pub languages: Vec<LanguageEntry>,
    pub scores: Map<String, Value>,
}

impl CandidateRecord {
    /// Builds a record from a parsed document. `fallback_id` (normally the
    /// source file stem) is used when `GeneralInfo.CandidateId` is absent or empty.
    pub fn from_payload(raw: Value, fallback_id: &str) -> Self {
        let raw = Payload::new(raw);

        let candidate_id = match raw.str_at(&["GeneralInfo", "CandidateId"]) {
            "" => fallback_id.to_string(),
            id => id.to_string(),
        };

        let skills = raw
            .array_at(&["SkillMatrix"])
            .iter()
            .filter_map(Value::as_object)
            .map(|entry| SkillEntry {
                name: entry
                    .get("SkillName")
                    .and_then(scalar_text)
                    .unwrap_or_default(),
                attributes: entry.clone(),
            })
            .collect();

        let languages = raw
            .array_at(&["Languages"])
            .iter()
            .filter_map(Value::as_object)
            .map(|entry| LanguageEntry {
                language: entry
                    .get("Language")
                    .and_then(scalar_text)
                    .unwrap_or_default(),
                proficiency: entry
                    .get("Proficiency")
                    .and_then(scalar_text)
                    .unwrap_or_default(),
            })
            .collect();

        let scores = raw
            .value_at(&["Scores"])
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        CandidateRecord {
            candidate_id,
            summary: raw.str_at(&["Summary"]).to_string(),
            skills,
            languages,
            scores,
            raw,
        }
    }

    /// Free-text resume body (`CleanedResumeText`), or `""`.
    pub fn resume_text(&self) -> &str {
        self.raw.str_at(&["CleanedResumeText"])
    }

    pub fn general_score(&self) -> f64 {
        self.scores
            .get("GeneralScore")
            .map(number_or_zero)
            .unwrap_or(0.0)
    }

    /// Score ≥ 60, or a seniority level naming mid/senior/lead/staff/principal.
    pub fn prepared(&self) -> bool {
        let seniority = self
            .raw
            .str_at(&["GeneralInfo", "SeniorityLevel"])
            .to_lowercase();
        self.general_score() >= MIN_PREPARED_SCORE
            || SENIORITY_KEYWORDS.iter().any(|kw| seniority.contains(kw))
    }

    /// Best English level found across language entries, `GeneralInfo.EnglishLevel`
    /// and the resume body.
    pub fn english_level(&self) -> EnglishLevel {
        self.english_sources()
            .iter()
            .fold(EnglishLevel::Unknown, |best, source| {
                best.max(level_in_text(source, best))
            })
    }

    fn english_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self
            .languages
            .iter()
            .filter(|l| {
                let name = l.language.trim().to_lowercase();
                ENGLISH_LANGUAGE_NAMES.contains(&name.as_str())
            })
            .map(|l| l.proficiency.clone())
            .collect();

        if let Some(level) = self
            .raw
            .text_at(&["GeneralInfo", "EnglishLevel"])
            .filter(|s| !s.is_empty())
        {
            sources.push(level);
        }

        let resume = self.resume_text();
        if !resume.is_empty() {
            sources.push(resume.to_string());
        }

        sources
    }
}

/// Applies every level rule to one source text, starting from the running best.
///
/// `intermediate` only lifts to B1 while the running best is still below B2,
/// so it is evaluated after the CEFR, `advanced` and `upper` rules.
pub fn level_in_text(text: &str, running_best: EnglishLevel) -> EnglishLevel {
    let text = text.to_lowercase();
    let mut best = running_best;

    for caps in CEFR_CODE.captures_iter(&text) {
        if let Some(level) = caps.get(1).and_then(|m| EnglishLevel::parse(m.as_str())) {
            best = best.max(level);
        }
    }
    if text.contains("advanced") {
        best = best.max(EnglishLevel::C1);
    }
    if text.contains("upper") {
        best = best.max(EnglishLevel::B2);
    }
    if text.contains("intermediate") && best < EnglishLevel::B2 {
        best = best.max(EnglishLevel::B1);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(raw: Value) -> CandidateRecord {
        CandidateRecord::from_payload(raw, "fallback")
    }

    #[test]
    fn test_candidate_id_falls_back_to_file_stem() {
        assert_eq!(record(json!({})).candidate_id, "fallback");
        assert_eq!(
            record(json!({ "GeneralInfo": { "CandidateId": "" } })).candidate_id,
            "fallback"
        );
        assert_eq!(
            record(json!({ "GeneralInfo": { "CandidateId": "c-42" } })).candidate_id,
            "c-42"
        );
    }

    #[test]
    fn test_from_payload_reads_sections() {
        let r = record(json!({
            "Summary": "Backend engineer",
            "SkillMatrix": [{ "SkillName": "C#", "Years": 5 }, { "Years": 1 }],
            "Languages": [{ "Language": "English", "Proficiency": "B2" }],
            "Scores": { "GeneralScore": 55 }
        }));
        assert_eq!(r.summary, "Backend engineer");
        assert_eq!(r.skills.len(), 2);
        assert_eq!(r.skills[0].name, "C#");
        assert_eq!(r.skills[0].attributes.get("Years"), Some(&json!(5)));
        assert_eq!(r.skills[1].name, "");
        assert_eq!(r.languages[0].proficiency, "B2");
        assert_eq!(r.general_score(), 55.0);
    }

    #[test]
    fn test_missing_sections_default_without_error() {
        let r = record(json!({ "SkillMatrix": null, "Languages": "oops", "Scores": [] }));
        assert!(r.skills.is_empty());
        assert!(r.languages.is_empty());
        assert!(r.scores.is_empty());
        assert_eq!(r.summary, "");
        assert!(!r.prepared());
        assert_eq!(r.english_level(), EnglishLevel::Unknown);
    }

    #[test]
    fn test_prepared_by_score_regardless_of_seniority() {
        for seniority in ["", "junior", "Trainee"] {
            let r = record(json!({
                "GeneralInfo": { "SeniorityLevel": seniority },
                "Scores": { "GeneralScore": 60 }
            }));
            assert!(r.prepared(), "score 60 with seniority {seniority:?}");
        }
    }

    #[test]
    fn test_prepared_by_seniority_below_threshold() {
        let r = record(json!({
            "GeneralInfo": { "SeniorityLevel": "Senior Engineer" },
            "Scores": { "GeneralScore": 12 }
        }));
        assert!(r.prepared());

        let r = record(json!({
            "GeneralInfo": { "SeniorityLevel": "Junior" },
            "Scores": { "GeneralScore": 59.9 }
        }));
        assert!(!r.prepared());
    }

    #[test]
    fn test_english_max_across_rules_not_first_match() {
        assert_eq!(
            level_in_text("C1 certified, also upper-intermediate elsewhere", EnglishLevel::Unknown),
            EnglishLevel::C1
        );
    }

    #[test]
    fn test_english_empty_is_unknown() {
        assert_eq!(level_in_text("", EnglishLevel::Unknown), EnglishLevel::Unknown);
        assert_eq!(record(json!({})).english_level(), EnglishLevel::Unknown);
    }

    #[test]
    fn test_intermediate_only_lifts_below_b2() {
        assert_eq!(level_in_text("intermediate", EnglishLevel::A2), EnglishLevel::B1);
        assert_eq!(level_in_text("intermediate", EnglishLevel::B2), EnglishLevel::B2);
        // upper fires first, so intermediate is skipped
        assert_eq!(level_in_text("upper intermediate", EnglishLevel::Unknown), EnglishLevel::B2);
    }

    #[test]
    fn test_advanced_floors_at_c1() {
        assert_eq!(level_in_text("Advanced", EnglishLevel::Unknown), EnglishLevel::C1);
        assert_eq!(level_in_text("advanced, C2 exam", EnglishLevel::Unknown), EnglishLevel::C2);
    }

    #[test]
    fn test_english_level_aggregates_all_sources() {
        let r = record(json!({
            "GeneralInfo": { "EnglishLevel": "A2" },
            "Languages": [
                { "Language": "Spanish", "Proficiency": "C2" },
                { "Language": "Inglés", "Proficiency": "intermediate" },
                { "Language": "EN", "Proficiency": "" }
            ],
            "CleanedResumeText": "Worked with teams in the US, B2 certificate."
        }));
        // Spanish C2 must be ignored; best English evidence is B2 from the resume body.
        assert_eq!(r.english_level(), EnglishLevel::B2);
    }

    #[test]
    fn test_english_level_from_general_info_only() {
        let r = record(json!({ "GeneralInfo": { "EnglishLevel": "c2" } }));
        assert_eq!(r.english_level(), EnglishLevel::C2);
        assert_eq!(r.english_level().rank(), 6);
    }

    #[test]
    fn test_english_level_rank_and_parse() {
        assert_eq!(EnglishLevel::Unknown.rank(), 0);
        assert_eq!(EnglishLevel::A1.rank(), 1);
        assert_eq!(EnglishLevel::parse(" b2 "), Some(EnglishLevel::B2));
        assert_eq!(EnglishLevel::parse("UNKNOWN"), None);
        assert_eq!(
            serde_json::to_string(&EnglishLevel::Unknown).unwrap(),
            r#""UNKNOWN""#
        );
    }
}

//! Keyword tables and patterns behind the derived candidate attributes.
//!
//! These heuristics are matched verbatim by downstream consumers of the index.
//! Changing a table changes which candidates are retrieved for a question.

use std::sync::LazyLock;

use regex::Regex;

/// `GeneralScore` at or above this marks a candidate as prepared.
pub const MIN_PREPARED_SCORE: f64 = 60.0;

/// Seniority substrings that mark a candidate as prepared regardless of score.
pub const SENIORITY_KEYWORDS: [&str; 5] = ["mid", "senior", "lead", "staff", "principal"];

/// Language names (lowercased) whose proficiency counts as English.
pub const ENGLISH_LANGUAGE_NAMES: [&str; 3] = ["english", "inglés", "en"];

pub const BACKEND_TITLE_KEYWORDS: [&str; 4] = ["backend", ".net", "c#", "asp.net"];
pub const FRONTEND_TITLE_KEYWORDS: [&str; 2] = ["frontend", "react"];

pub const BACKEND_HINT: &str = "[HINT] backend-dotnet";
pub const FRONTEND_HINT: &str = "[HINT] frontend";

/// Standalone CEFR code, e.g. `c1` or `B2`.
pub static CEFR_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([abc][12])\b").expect("CEFR pattern is valid"));

/// Technology keywords detected in resume text, as (pattern, label).
///
/// `.NET` must not fire inside `ASP.NET` or `VB.NET`, so its left edge rejects
/// word characters and dots instead of relying on `\b`.
pub static TECH_KEYWORDS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)(?:^|[^\w.])\.net\b", ".NET"),
        (r"(?i)\bc#(?:[^\w#]|$)", "C#"),
        (r"(?i)\basp\.net\b", "ASP.NET"),
        (r"(?i)\bentity framework\b", "Entity Framework"),
        (r"(?i)\bsql server\b", "SQL Server"),
        (r"(?i)\bazure\b", "Azure"),
    ]
    .into_iter()
    .map(|(pattern, label)| {
        (
            Regex::new(pattern).expect("technology keyword pattern is valid"),
            label,
        )
    })
    .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    fn labels_in(text: &str) -> Vec<&'static str> {
        TECH_KEYWORDS
            .iter()
            .filter(|(re, _)| re.is_match(text))
            .map(|(_, label)| *label)
            .collect()
    }

    #[test]
    fn test_dotnet_does_not_fire_inside_aspnet() {
        assert_eq!(labels_in("Built APIs with ASP.NET"), vec!["ASP.NET"]);
        assert_eq!(labels_in("Legacy VB.NET code"), Vec::<&str>::new());
    }

    #[test]
    fn test_dotnet_standalone() {
        assert_eq!(labels_in(".NET 8 services"), vec![".NET"]);
        assert_eq!(labels_in("worked on .net core"), vec![".NET"]);
    }

    #[test]
    fn test_csharp_followed_by_space_or_end() {
        assert_eq!(labels_in("C# developer"), vec!["C#"]);
        assert_eq!(labels_in("languages: c#"), vec!["C#"]);
        assert!(labels_in("abc# tag").is_empty());
    }

    #[test]
    fn test_multiword_keywords_case_insensitive() {
        assert_eq!(
            labels_in("ENTITY FRAMEWORK on sql server hosted in AZURE"),
            vec!["Entity Framework", "SQL Server", "Azure"]
        );
    }

    #[test]
    fn test_cefr_code_needs_word_boundaries() {
        assert!(CEFR_CODE.is_match("level c1 certified"));
        assert!(CEFR_CODE.is_match("B2"));
        assert!(!CEFR_CODE.is_match("b2b sales"));
        assert!(!CEFR_CODE.is_match("c3"));
    }
}

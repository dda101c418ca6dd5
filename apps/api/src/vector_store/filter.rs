use serde::{Deserialize, Serialize};
#[cfg(test)]
use serde_json::Value;

use crate::candidates::record::EnglishLevel;
use crate::errors::AppError;
#[cfg(test)]
use crate::models::chunk::{Metadata, META_TYPE};

/// Structured filters accepted alongside a question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub prepared: Option<bool>,
    /// Minimum CEFR level, e.g. `"B2"`.
    #[serde(default)]
    pub english_min: Option<String>,
}

/// Metadata filter applied by the vector store before ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    /// Allowed record types. Empty means any type.
    pub types: Vec<String>,
    pub prepared: Option<bool>,
    pub english_min: Option<EnglishLevel>,
}

impl MetadataFilter {
    /// Resolves request filters, using `default_types` when none are given.
    pub fn from_request(
        filters: Option<&QueryFilters>,
        default_types: &[String],
    ) -> Result<Self, AppError> {
        let Some(filters) = filters else {
            return Ok(Self {
                types: default_types.to_vec(),
                ..Self::default()
            });
        };

        let types: Vec<String> = filters
            .types
            .iter()
            .flatten()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let english_min = match filters.english_min.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(EnglishLevel::parse(code).ok_or_else(|| {
                AppError::Validation(format!(
                    "english_min must be one of A1, A2, B1, B2, C1, C2 (got '{code}')"
                ))
            })?),
        };

        Ok(Self {
            types: if types.is_empty() {
                default_types.to_vec()
            } else {
                types
            },
            prepared: filters.prepared,
            english_min,
        })
    }

    /// In-process evaluation of the same predicate the SQL query applies.
    #[cfg(test)]
    pub fn matches(&self, metadata: &Metadata) -> bool {
        if !self.types.is_empty() {
            let record_type = metadata.get(META_TYPE).and_then(Value::as_str);
            if !record_type.is_some_and(|t| self.types.iter().any(|allowed| allowed == t)) {
                return false;
            }
        }
        if let Some(prepared) = self.prepared {
            if metadata.get("prepared").and_then(Value::as_bool) != Some(prepared) {
                return false;
            }
        }
        if let Some(min) = self.english_min {
            let rank = metadata
                .get("english_level_num")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            if rank < u64::from(min.rank()) {
                return false;
            }
        }
        true
    }
}

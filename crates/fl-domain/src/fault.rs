//! Fault configuration and the canonical signature used for memory lookup.

use fl_core::event::ErrorKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultMode {
    Once,
    PerAttempt,
    Persistent,
    StatefulConflict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultConfig {
    pub fault_id: String,
    pub step_idx: usize,
    pub kind: ErrorKind,
    pub probability: f64,
    pub mode: FaultMode,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub force_first_attempt: bool,
    #[serde(default)]
    pub layer_override: Option<fl_core::event::Layer>,
}

/// Canonical key identifying "this kind of failure here" for memory lookup:
/// `tool|kind|step|state_prefix|kw1,...,kwK` (K <= 5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultSignature {
    pub tool_name: String,
    pub error_kind: ErrorKind,
    pub step_name: String,
    pub state_prefix: String,
    pub keywords: Vec<String>,
}

impl FaultSignature {
    pub fn canonical_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.tool_name,
            self.error_kind.as_str(),
            self.step_name,
            self.state_prefix,
            self.keywords.join(","),
        )
    }

    /// Extracts up to `k` lowercase alphanumeric keywords from `text`,
    /// ranked by descending frequency with a deterministic alphabetical
    /// tie-break, matching the signature's reproducibility requirement.
    pub fn extract_keywords(text: &str, k: usize) -> Vec<String> {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for raw in text.split(|c: char| !c.is_alphanumeric()) {
            if raw.is_empty() {
                continue;
            }
            let w = raw.to_lowercase();
            if w.len() < 3 {
                continue;
            }
            *counts.entry(w).or_insert(0) += 1;
        }
        let mut pairs: Vec<(String, usize)> = counts.into_iter().collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs.into_iter().take(k).map(|(w, _)| w).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_extraction_is_deterministic_and_ranked() {
        let kws = FaultSignature::extract_keywords("timeout timeout request request request", 2);
        assert_eq!(kws, vec!["request".to_string(), "timeout".to_string()]);
    }

    #[test]
    fn canonical_key_format() {
        let sig = FaultSignature {
            tool_name: "update_record".into(),
            error_kind: ErrorKind::Conflict,
            step_name: "apply_update".into(),
            state_prefix: "abcd1234".into(),
            keywords: vec!["conflict".into(), "detected".into()],
        };
        assert_eq!(sig.canonical_key(), "update_record|conflict|apply_update|abcd1234|conflict,detected");
    }
}

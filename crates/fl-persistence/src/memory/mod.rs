//! File-backed memory bank: fault-signature -> best-action store with a
//! similarity-scored query and outcome-weighted confidence. The only shared
//! mutable resource in the engine, see the module-level lock discussion in
//! [`MemoryBank`].

use crate::error::PersistenceError;
use fl_core::event::Action;
use fl_domain::fault::FaultSignature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const MAX_EXAMPLES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub success: u64,
    pub total: u64,
}

impl MemoryStats {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.success as f64 / self.total as f64 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub signature: FaultSignature,
    pub action: Action,
    pub stats: MemoryStats,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryMatch {
    pub action: Action,
    pub confidence: f64,
    pub matched_key: String,
}

/// `std::sync::Mutex` around the in-memory map plus write-then-rename on
/// persistence gives every `upsert` atomicity with respect to concurrent
/// `query`s: a reader sees either the pre- or post-upsert entry, and the
/// file on disk is always a valid serialisation of the current map.
pub struct MemoryBank {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, MemoryEntry>>,
}

impl MemoryBank {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let data = std::fs::read_to_string(&path)
                .map_err(|e| PersistenceError::Io { path: path.display().to_string(), source: e })?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&data)
                    .map_err(|e| PersistenceError::Json { path: path.display().to_string(), source: e })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn upsert(&self, signature: &FaultSignature, action: Action, success: bool, example: String) -> Result<(), PersistenceError> {
        {
            let mut guard = self.entries.lock().expect("memory bank lock poisoned");
            let key = signature.canonical_key();
            let entry = guard.entry(key).or_insert_with(|| MemoryEntry {
                signature: signature.clone(),
                action,
                stats: MemoryStats { success: 0, total: 0 },
                examples: Vec::new(),
            });
            entry.action = action;
            entry.stats.total += 1;
            if success {
                entry.stats.success += 1;
            }
            entry.examples.push(example);
            if entry.examples.len() > MAX_EXAMPLES {
                entry.examples.remove(0);
            }
        }
        self.persist()
    }

    pub fn query(&self, signature: &FaultSignature) -> Option<MemoryMatch> {
        let guard = self.entries.lock().expect("memory bank lock poisoned");
        let mut best: Option<(f64, &MemoryEntry, &String)> = None;
        for (key, entry) in guard.iter() {
            let score = similarity(signature, &entry.signature);
            if best.as_ref().map(|(s, _, _)| score > *s).unwrap_or(true) {
                best = Some((score, entry, key));
            }
        }
        best.map(|(score, entry, key)| MemoryMatch {
            action: entry.action,
            confidence: (0.7 * score + 0.3 * entry.stats.success_rate()).clamp(0.0, 1.0),
            matched_key: key.clone(),
        })
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        let guard = self.entries.lock().expect("memory bank lock poisoned");
        let data = serde_json::to_string_pretty(&*guard)
            .map_err(|e| PersistenceError::Json { path: self.path.display().to_string(), source: e })?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, data).map_err(|e| PersistenceError::Io { path: tmp.display().to_string(), source: e })?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| PersistenceError::Io { path: self.path.display().to_string(), source: e })?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("memory bank lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn jaccard(a: &[String], b: &[String]) -> f64 {
    use std::collections::HashSet;
    let sa: HashSet<&String> = a.iter().collect();
    let sb: HashSet<&String> = b.iter().collect();
    if sa.is_empty() && sb.is_empty() {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count() as f64;
    let union = sa.union(&sb).count() as f64;
    if union == 0.0 { 0.0 } else { inter / union }
}

fn similarity(query: &FaultSignature, candidate: &FaultSignature) -> f64 {
    let tool = if query.tool_name == candidate.tool_name { 1.0 } else { 0.0 };
    let kind = if query.error_kind.as_str() == candidate.error_kind.as_str() { 1.0 } else { 0.0 };
    let step = if query.step_name == candidate.step_name { 1.0 } else { 0.0 };
    let kw = jaccard(&query.keywords, &candidate.keywords);
    let state = if query.state_prefix == candidate.state_prefix { 1.0 } else { 0.0 };
    0.3 * tool + 0.3 * kind + 0.2 * step + 0.2 * kw + 0.1 * state
}

#[cfg(test)]
mod tests {
    use super::*;
    use fl_core::event::ErrorKind;

    fn sig(tool: &str, step: &str) -> FaultSignature {
        FaultSignature {
            tool_name: tool.into(),
            error_kind: ErrorKind::Conflict,
            step_name: step.into(),
            state_prefix: "abcd1234".into(),
            keywords: vec!["conflict".into(), "detected".into()],
        }
    }

    #[test]
    fn upsert_then_query_finds_exact_match() {
        let dir = tempfile::tempdir().unwrap();
        let bank = MemoryBank::load(dir.path().join("mem.json")).unwrap();
        let s = sig("update_record", "apply_update");
        bank.upsert(&s, Action::Rollback, true, "example".into()).unwrap();
        let hit = bank.query(&s).unwrap();
        assert_eq!(hit.action, Action::Rollback);
        assert!(hit.confidence >= 0.8);
    }

    #[test]
    fn examples_capped_at_five() {
        let dir = tempfile::tempdir().unwrap();
        let bank = MemoryBank::load(dir.path().join("mem.json")).unwrap();
        let s = sig("update_record", "apply_update");
        for i in 0..8 {
            bank.upsert(&s, Action::Rollback, true, format!("ex{i}")).unwrap();
        }
        let guard = bank.entries.lock().unwrap();
        let entry = guard.values().next().unwrap();
        assert_eq!(entry.examples.len(), 5);
        assert_eq!(entry.stats.total, 8);
    }

    #[test]
    fn persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mem.json");
        {
            let bank = MemoryBank::load(&path).unwrap();
            bank.upsert(&sig("update_record", "apply_update"), Action::Rollback, true, "ex".into()).unwrap();
        }
        let reloaded = MemoryBank::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn failed_upsert_increments_total_not_success() {
        let dir = tempfile::tempdir().unwrap();
        let bank = MemoryBank::load(dir.path().join("mem.json")).unwrap();
        let s = sig("update_record", "apply_update");
        bank.upsert(&s, Action::Rollback, false, "ex".into()).unwrap();
        let guard = bank.entries.lock().unwrap();
        let entry = guard.values().next().unwrap();
        assert_eq!(entry.stats.total, 1);
        assert_eq!(entry.stats.success, 0);
    }
}

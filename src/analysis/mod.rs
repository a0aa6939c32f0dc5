//! Page analysis: pattern matching, LLM merge, NVD enrichment

pub mod nvd;
pub mod patterns;

use crate::models::Finding;

/// Merges pattern and LLM findings, deduplicating on (category, evidence).
///
/// A duplicate LLM finding does not produce a second entry; its fix
/// suggestion enriches the pattern finding instead, since the pattern match
/// has the more precise location.
pub fn merge_findings(pattern: Vec<Finding>, llm: Vec<Finding>) -> Vec<Finding> {
    let mut merged = pattern;

    for candidate in llm {
        let duplicate = merged.iter_mut().find(|existing| {
            existing.category.eq_ignore_ascii_case(&candidate.category)
                && overlapping_evidence(&existing.evidence, &candidate.evidence)
        });

        match duplicate {
            Some(existing) => {
                if existing.fix.is_none() {
                    existing.fix = candidate.fix;
                }
            }
            None => merged.push(candidate),
        }
    }

    merged
}

/// Two evidence snippets describe the same spot when one contains the
/// other's trimmed text. Pattern evidence includes context lines, LLM
/// evidence is usually the bare snippet.
fn overlapping_evidence(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a)
}

//! Skill tokens and the case-insensitive set view used for comparison.

use indexmap::IndexMap;

/// Comparison key for a skill token: trimmed and lower-cased.
pub fn normalize_skill(skill: &str) -> String {
    skill.trim().to_lowercase()
}

/// A set view over a participant's skill list.
///
/// Keys are normalized tokens; values keep the first-seen original casing
/// (trimmed) so results can be shown the way the participant wrote them.
/// Insertion order is preserved.
#[derive(Debug, Clone, Default)]
pub struct SkillSet<'a> {
    entries: IndexMap<String, &'a str>,
}

impl<'a> SkillSet<'a> {
    pub fn from_skills(skills: &'a [String]) -> Self {
        let mut entries = IndexMap::with_capacity(skills.len());
        for skill in skills {
            let display = skill.trim();
            if display.is_empty() {
                continue;
            }
            entries.entry(normalize_skill(display)).or_insert(display);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.entries.contains_key(&normalize_skill(skill))
    }

    /// Number of normalized tokens present in both sets.
    pub fn overlap_count(&self, other: &SkillSet<'_>) -> usize {
        self.entries
            .keys()
            .filter(|key| other.entries.contains_key(*key))
            .count()
    }

    /// Skills shared with `other`, in this set's order and casing.
    pub fn common_with(&self, other: &SkillSet<'_>) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(key, _)| other.entries.contains_key(*key))
            .map(|(_, display)| display.to_string())
            .collect()
    }
}

/// Unions `incoming` into `existing`.
///
/// Tokens are trimmed, blanks dropped, and duplicates removed under
/// case-insensitive comparison. The first-seen casing wins and the order of
/// first appearance is kept, so existing skills always precede new ones.
pub fn merge_skills(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut merged: IndexMap<String, String> = IndexMap::new();
    for skill in existing.iter().chain(incoming) {
        let display = skill.trim();
        if display.is_empty() {
            continue;
        }
        merged
            .entry(normalize_skill(display))
            .or_insert_with(|| display.to_string());
    }
    merged.into_values().collect()
}

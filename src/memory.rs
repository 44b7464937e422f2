//! Per-agent memory stream: bounded log, scored retrieval, reflection.
//!
//! All timestamps are simulated minutes from the world clock, never wall
//! time, so retrieval and reflection replay identically for a given seed.

use std::collections::VecDeque;

use serde::Serialize;

use crate::grid::Point;

/// Hard cap on records per agent. Oldest records are dropped first.
pub const MEMORY_CAP: usize = 50;

/// How many trailing observation/conversation records reflection looks at.
const REFLECTION_WINDOW: usize = 10;
const REFLECTION_MIN_RECORDS: usize = 3;
const REFLECTION_INTERVAL_MIN: f64 = 5.0;
const REFLECTION_IMPORTANCE: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Observation,
    Reflection,
    Plan,
    Conversation,
}

/// One record in an agent's memory stream. Importance is assigned at
/// creation and never recomputed.
#[derive(Debug, Clone, Serialize)]
pub struct Memory {
    pub description: String,
    pub kind: MemoryKind,
    pub importance: u8,
    /// Names of other agents involved in the event.
    pub related: Vec<String>,
    pub location: Point,
    pub created_min: f64,
    pub last_accessed_min: f64,
}

impl Memory {
    pub fn new(
        description: impl Into<String>,
        kind: MemoryKind,
        importance: u8,
        related: Vec<String>,
        location: Point,
        now_min: f64,
    ) -> Self {
        Self {
            description: description.into(),
            kind,
            importance,
            related,
            location,
            created_min: now_min,
            last_accessed_min: now_min,
        }
    }
}

/// Bounded chronological log of one agent's experiences.
#[derive(Debug, Default)]
pub struct MemoryStream {
    entries: VecDeque<Memory>,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Memory> {
        self.entries.iter()
    }

    /// Appends a record, evicting the oldest once past [`MEMORY_CAP`].
    pub fn record(&mut self, memory: Memory) {
        self.entries.push_back(memory);
        while self.entries.len() > MEMORY_CAP {
            self.entries.pop_front();
        }
    }

    /// Most recent conversation record, if any.
    pub fn last_conversation(&self) -> Option<&Memory> {
        self.entries
            .iter()
            .rev()
            .find(|m| m.kind == MemoryKind::Conversation)
    }

    /// Scores every record as relevance + recency + importance and returns
    /// the top `limit` clones, stable on ties.
    ///
    /// Retrieval is a side-effecting read: it refreshes `last_accessed_min`
    /// on every scored record, not only the returned ones.
    pub fn retrieve(&mut self, query: &str, limit: usize, now_min: f64) -> Vec<Memory> {
        let query_words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_owned)
            .collect();

        let mut scored: Vec<(usize, f64)> = self
            .entries
            .iter_mut()
            .enumerate()
            .map(|(i, memory)| {
                let text = memory.description.to_lowercase();
                let memory_words: Vec<&str> = text.split_whitespace().collect();
                let mut relevance = 0.0;
                for word in &query_words {
                    if memory_words.iter().any(|w| w.contains(word.as_str())) {
                        relevance += 2.0;
                    }
                }
                let hours_idle = (now_min - memory.last_accessed_min).max(0.0) / 60.0;
                let recency = (10.0 - hours_idle).max(0.0);
                let score = relevance + recency + memory.importance as f64;
                memory.last_accessed_min = now_min;
                (i, score)
            })
            .collect();

        // Vec::sort_by is stable, so equal scores keep stream order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(limit)
            .map(|(i, _)| self.entries[i].clone())
            .collect()
    }

    /// Synthesizes up to two theme statements from the trailing window of
    /// observation/conversation records. Returns an empty list when too few
    /// records exist or the previous reflection is under five simulated
    /// minutes old.
    pub fn reflect(&self, role: &str, now_min: f64, last_reflection_min: f64) -> Vec<String> {
        if now_min - last_reflection_min <= REFLECTION_INTERVAL_MIN {
            return Vec::new();
        }
        let recent: Vec<&Memory> = self
            .entries
            .iter()
            .filter(|m| matches!(m.kind, MemoryKind::Observation | MemoryKind::Conversation))
            .collect();
        let recent: Vec<&Memory> = recent
            .into_iter()
            .rev()
            .take(REFLECTION_WINDOW)
            .collect();
        if recent.len() < REFLECTION_MIN_RECORDS {
            return Vec::new();
        }

        let mut themes = Vec::new();

        let role_lower = role.to_lowercase();
        let work_count = recent
            .iter()
            .filter(|m| {
                let text = m.description.to_lowercase();
                text.contains("work") || text.contains(&role_lower)
            })
            .count();
        if work_count >= 3 {
            themes.push(format!("I've been very focused on my {role} duties lately"));
        }

        let social: Vec<&&Memory> = recent.iter().filter(|m| !m.related.is_empty()).collect();
        if social.len() >= 2 {
            let mut names: Vec<String> = Vec::new();
            for memory in &social {
                for name in &memory.related {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
            themes.push(format!(
                "I've been interacting frequently with {}",
                names.join(", ")
            ));
        }

        themes
    }

    /// Records each theme as an importance-7 reflection.
    pub fn record_reflections(&mut self, themes: Vec<String>, location: Point, now_min: f64) {
        for theme in themes {
            self.record(Memory::new(
                format!("Reflection: {theme}"),
                MemoryKind::Reflection,
                REFLECTION_IMPORTANCE,
                Vec::new(),
                location,
                now_min,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(description: &str, importance: u8, now: f64) -> Memory {
        Memory::new(
            description,
            MemoryKind::Observation,
            importance,
            Vec::new(),
            Point::new(0.0, 0.0),
            now,
        )
    }

    #[test]
    fn stream_caps_at_fifty_fifo() {
        let mut stream = MemoryStream::new();
        for i in 0..60 {
            stream.record(obs(&format!("event {i}"), 5, i as f64));
        }
        assert_eq!(stream.len(), MEMORY_CAP);
        let first = stream.iter().next().unwrap();
        assert_eq!(first.description, "event 10");
        let last = stream.iter().last().unwrap();
        assert_eq!(last.description, "event 59");
    }

    #[test]
    fn retrieve_honors_limit_and_importance() {
        let mut stream = MemoryStream::new();
        stream.record(obs("saw the wheat field", 2, 0.0));
        stream.record(obs("repaired the clinic door", 9, 0.0));
        stream.record(obs("rested at home", 2, 0.0));

        let results = stream.retrieve("clinic repairs", 2, 0.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].description, "repaired the clinic door");
    }

    #[test]
    fn retrieve_matches_query_substrings() {
        let mut stream = MemoryStream::new();
        stream.record(obs("watched the harvesting", 5, 0.0));
        stream.record(obs("chatted in the plaza", 5, 0.0));

        let results = stream.retrieve("harvest", 1, 0.0);
        assert_eq!(results[0].description, "watched the harvesting");
    }

    #[test]
    fn retrieve_refreshes_every_scored_record() {
        let mut stream = MemoryStream::new();
        stream.record(obs("one", 5, 0.0));
        stream.record(obs("two", 5, 0.0));

        let _ = stream.retrieve("one", 1, 120.0);
        for memory in stream.iter() {
            assert_eq!(memory.last_accessed_min, 120.0);
        }
    }

    #[test]
    fn retrieve_breaks_ties_by_stream_order() {
        let mut stream = MemoryStream::new();
        stream.record(obs("alpha", 5, 0.0));
        stream.record(obs("beta", 5, 0.0));
        stream.record(obs("gamma", 5, 0.0));

        let results = stream.retrieve("unrelated", 2, 0.0);
        assert_eq!(results[0].description, "alpha");
        assert_eq!(results[1].description, "beta");
    }

    #[test]
    fn retrieve_on_empty_stream_is_empty() {
        let mut stream = MemoryStream::new();
        assert!(stream.retrieve("anything", 5, 0.0).is_empty());
    }

    #[test]
    fn reflection_requires_enough_recent_records() {
        let mut stream = MemoryStream::new();
        stream.record(obs("did farmer work", 5, 0.0));
        stream.record(obs("more farmer work", 5, 0.0));
        assert!(stream.reflect("farmer", 10.0, 0.0).is_empty());
    }

    #[test]
    fn reflection_respects_interval() {
        let mut stream = MemoryStream::new();
        for _ in 0..3 {
            stream.record(obs("hard work at the field", 5, 0.0));
        }
        assert!(stream.reflect("farmer", 4.0, 0.0).is_empty());
        assert!(!stream.reflect("farmer", 6.0, 0.0).is_empty());
    }

    #[test]
    fn reflection_extracts_work_and_social_themes() {
        let mut stream = MemoryStream::new();
        for _ in 0..3 {
            stream.record(obs("busy with work at the forge", 5, 0.0));
        }
        let mut social = obs("I saw Bob at the town square", 4, 0.0);
        social.related = vec!["Bob".into()];
        stream.record(social.clone());
        stream.record(social);

        let themes = stream.reflect("toolsmith", 10.0, 0.0);
        assert_eq!(themes.len(), 2);
        assert!(themes[0].contains("toolsmith duties"));
        assert!(themes[1].contains("Bob"));
    }

    #[test]
    fn recorded_reflections_have_importance_seven() {
        let mut stream = MemoryStream::new();
        stream.record_reflections(
            vec!["a calm day".into()],
            Point::new(1.0, 2.0),
            30.0,
        );
        let memory = stream.iter().next().unwrap();
        assert_eq!(memory.kind, MemoryKind::Reflection);
        assert_eq!(memory.importance, 7);
        assert!(memory.description.starts_with("Reflection:"));
    }
}

use std::{cmp::Ordering, collections::HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    Updated,
}

/// Members ordered by score, ties broken by member name.
///
/// `scores` indexes members by name while `ordered` keeps them in rank order;
/// both always describe the same member set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    scores: HashMap<String, f64>,
    ordered: Vec<(f64, String)>,
}

fn compare(score: f64, member: &str, other_score: f64, other_member: &str) -> Ordering {
    score
        .total_cmp(&other_score)
        .then_with(|| member.cmp(other_member))
}

impl SortedSet {
    fn position(&self, score: f64, member: &str) -> usize {
        self.ordered
            .partition_point(|(s, m)| compare(*s, m, score, member) == Ordering::Less)
    }

    pub fn add(&mut self, member: &str, score: f64) -> AddOutcome {
        let outcome = match self.scores.get(member).copied() {
            Some(current) => {
                let index = self.position(current, member);
                self.ordered.remove(index);
                AddOutcome::Updated
            }
            None => AddOutcome::Inserted,
        };

        let index = self.position(score, member);
        self.ordered.insert(index, (score, member.to_string()));
        self.scores.insert(member.to_string(), score);

        outcome
    }

    /// Zero-based position of `member` in ascending order.
    pub fn rank(&self, member: &str) -> Option<usize> {
        let score = self.scores.get(member)?;
        Some(self.position(*score, member))
    }

    /// Members between `start` and `stop` inclusive. Negative indexes count
    /// from the end and out of range indexes are clamped.
    pub fn range(&self, start: i64, stop: i64) -> Vec<(&str, f64)> {
        let len = self.ordered.len() as i64;

        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

        if len == 0 || start > stop || start >= len || stop < 0 {
            return Vec::new();
        }

        self.ordered[start as usize..=stop as usize]
            .iter()
            .map(|(score, member)| (member.as_str(), *score))
            .collect()
    }

    pub fn remove(&mut self, member: &str) -> bool {
        let Some(score) = self.scores.remove(member) else {
            return false;
        };

        let index = self.position(score, member);
        self.ordered.remove(index);

        true
    }

    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ordered
            .iter()
            .map(|(score, member)| (member.as_str(), *score))
    }
}

//! Append-only, stage-ordered output bag.

use super::stage::StageId;
use crate::errors::BagOrderError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Outputs of the stages executed so far in one run.
///
/// The bag only accepts the next stage in [`StageId::ALL`] order, so it can
/// never hold an entry for a stage that has not run, and entries are never
/// overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBag {
    entries: Vec<(StageId, String)>,
}

impl ContextBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the output of `stage`.
    ///
    /// # Errors
    ///
    /// Returns `BagOrderError` unless `stage` is the next stage in order.
    pub fn record(&mut self, stage: StageId, output: String) -> Result<(), BagOrderError> {
        let expected = self.next_stage();
        if expected != Some(stage) {
            return Err(BagOrderError {
                attempted: stage,
                expected,
            });
        }
        self.entries.push((stage, output));
        Ok(())
    }

    /// Returns the output of `stage`, if it has run.
    #[must_use]
    pub fn get(&self, stage: StageId) -> Option<&str> {
        self.entries.get(stage.index()).map(|(_, output)| output.as_str())
    }

    /// Checks if `stage` has an entry.
    #[must_use]
    pub fn contains(&self, stage: StageId) -> bool {
        stage.index() < self.entries.len()
    }

    /// Returns the number of recorded stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no stage has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the only stage the bag accepts next.
    #[must_use]
    pub fn next_stage(&self) -> Option<StageId> {
        StageId::ALL.get(self.entries.len()).copied()
    }

    /// Returns true once every stage has been recorded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entries.len() == StageId::ALL.len()
    }

    /// Iterates entries in stage order.
    pub fn iter(&self) -> impl Iterator<Item = (StageId, &str)> {
        self.entries
            .iter()
            .map(|(stage, output)| (*stage, output.as_str()))
    }

    /// Returns the recorded stage ids in order.
    #[must_use]
    pub fn stages(&self) -> Vec<StageId> {
        self.entries.iter().map(|(stage, _)| *stage).collect()
    }

    /// Returns an owned copy of the entries.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(StageId, String)> {
        self.entries.clone()
    }

    /// Returns the final evaluation, once the judgment stage has run.
    #[must_use]
    pub fn evaluation(&self) -> Option<&str> {
        self.get(StageId::Judgment)
    }
}

impl Serialize for ContextBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (stage, output) in &self.entries {
            map.serialize_entry(stage.as_str(), output)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled(n: usize) -> ContextBag {
        let mut bag = ContextBag::new();
        for stage in StageId::ALL.into_iter().take(n) {
            bag.record(stage, format!("{stage} output")).unwrap();
        }
        bag
    }

    #[test]
    fn test_records_in_order() {
        let bag = filled(4);

        assert!(bag.is_complete());
        assert_eq!(bag.stages(), StageId::ALL.to_vec());
        assert_eq!(bag.evaluation(), Some("judgment output"));
        assert_eq!(bag.next_stage(), None);
    }

    #[test]
    fn test_rejects_skipped_stage() {
        let mut bag = filled(1);

        let err = bag
            .record(StageId::AltInquiry, "P2".to_string())
            .unwrap_err();

        assert_eq!(err.attempted, StageId::AltInquiry);
        assert_eq!(err.expected, Some(StageId::FirstInquiry));
        assert_eq!(bag.len(), 1);
        assert!(!bag.contains(StageId::AltInquiry));
    }

    #[test]
    fn test_rejects_overwrite() {
        let mut bag = filled(2);

        assert!(bag.record(StageId::TopicStage, "again".to_string()).is_err());
        assert_eq!(bag.get(StageId::TopicStage), Some("topic_stage output"));
    }

    #[test]
    fn test_rejects_after_complete() {
        let mut bag = filled(4);
        let err = bag.record(StageId::Judgment, "J2".to_string()).unwrap_err();
        assert_eq!(err.expected, None);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let bag = filled(2);
        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(
            json,
            r#"{"topic_stage":"topic_stage output","first_inquiry":"first_inquiry output"}"#
        );
    }
}

//! Quality ladder derived from an adaptive engine's representations

use serde::Serialize;

use crate::models::QualitySelection;

/// One adaptive-bitrate encoding tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Representation {
    pub id: String,
    pub height: u32,
    pub bandwidth: u64,
}

/// Narrow view of an adaptive engine's representation controls
pub trait RepresentationSource {
    fn list(&self) -> Vec<Representation>;
    fn enable(&mut self, id: &str, enabled: bool);
}

/// Quality level exposed to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityLevel {
    pub height: u32,
    pub bandwidth: u64,
}

/// Distinct heights, ascending
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityLadder {
    levels: Vec<QualityLevel>,
}

impl QualityLadder {
    /// First representation at a given height wins; height 0 is skipped
    pub fn from_representations(representations: &[Representation]) -> Self {
        let mut levels: Vec<QualityLevel> = Vec::new();

        for rep in representations.iter().filter(|r| r.height > 0) {
            if !levels.iter().any(|l| l.height == rep.height) {
                levels.push(QualityLevel {
                    height: rep.height,
                    bandwidth: rep.bandwidth,
                });
            }
        }

        levels.sort_by_key(|l| l.height);
        Self { levels }
    }

    pub fn levels(&self) -> &[QualityLevel] {
        &self.levels
    }

    pub fn heights(&self) -> Vec<u32> {
        self.levels.iter().map(|l| l.height).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Highest height not above `max_height`, else the lowest available
    pub fn data_saver_height(&self, max_height: u32) -> Option<u32> {
        self.levels
            .iter()
            .rev()
            .find(|l| l.height <= max_height)
            .or_else(|| self.levels.first())
            .map(|l| l.height)
    }
}

/// Enable the representations matching `selection`, disable the rest.
/// `Auto` enables everything. Returns how many are enabled.
pub fn apply_selection<S: RepresentationSource + ?Sized>(
    source: &mut S,
    selection: QualitySelection,
) -> usize {
    let mut enabled = 0;
    for rep in source.list() {
        let on = match selection {
            QualitySelection::Auto => true,
            QualitySelection::Height(height) => rep.height == height,
        };
        source.enable(&rep.id, on);
        if on {
            enabled += 1;
        }
    }
    enabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeRepresentations {
        reps: Vec<Representation>,
        enabled: HashMap<String, bool>,
    }

    impl FakeRepresentations {
        fn new(heights: &[u32]) -> Self {
            let reps = heights
                .iter()
                .enumerate()
                .map(|(i, h)| Representation {
                    id: format!("r{i}"),
                    height: *h,
                    bandwidth: 100_000 * (i as u64 + 1),
                })
                .collect();
            Self {
                reps,
                enabled: HashMap::new(),
            }
        }
    }

    impl RepresentationSource for FakeRepresentations {
        fn list(&self) -> Vec<Representation> {
            self.reps.clone()
        }

        fn enable(&mut self, id: &str, enabled: bool) {
            self.enabled.insert(id.to_string(), enabled);
        }
    }

    #[test]
    fn test_ladder_dedups_and_sorts() {
        let source = FakeRepresentations::new(&[720, 360, 1080, 720, 0]);
        let ladder = QualityLadder::from_representations(&source.list());

        assert_eq!(ladder.heights(), vec![360, 720, 1080]);
        // First 720 entry wins
        assert_eq!(ladder.levels()[1].bandwidth, 100_000);
    }

    #[test]
    fn test_data_saver_height() {
        let source = FakeRepresentations::new(&[360, 480, 720, 1080]);
        let ladder = QualityLadder::from_representations(&source.list());
        assert_eq!(ladder.data_saver_height(480), Some(480));

        let source = FakeRepresentations::new(&[1080, 720]);
        let ladder = QualityLadder::from_representations(&source.list());
        assert_eq!(ladder.data_saver_height(480), Some(720));

        assert_eq!(QualityLadder::default().data_saver_height(480), None);
    }

    #[test]
    fn test_apply_selection() {
        let mut source = FakeRepresentations::new(&[360, 720, 720, 1080]);

        assert_eq!(apply_selection(&mut source, QualitySelection::Height(720)), 2);
        assert!(!source.enabled["r0"]);
        assert!(source.enabled["r1"]);
        assert!(source.enabled["r2"]);
        assert!(!source.enabled["r3"]);

        assert_eq!(apply_selection(&mut source, QualitySelection::Auto), 4);
        assert!(source.enabled.values().all(|on| *on));
    }
}

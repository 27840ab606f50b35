//! Coarse progress inferred from output lines.
//!
//! The inference program has no structured progress protocol, so a fixed
//! table of substrings stands in. The percentages are placeholders.

use std::borrow::Cow;

/// Progress reported when the background task starts.
pub const INITIALIZING: (u8, &str) = (10, "Initializing model & pipeline");
/// Progress reported once the model environment is ready.
pub const LOADING_WEIGHTS: (u8, &str) = (30, "Loading model weights");
/// Progress reported right before completion.
pub const DONE: (u8, &str) = (100, "Done");

/// A substring that, when seen in an output line, reports `percent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub needle: Cow<'static, str>,
    pub percent: u8,
    pub message: Cow<'static, str>,
}

impl Milestone {
    pub const fn fixed(needle: &'static str, percent: u8, message: &'static str) -> Self {
        Self {
            needle: Cow::Borrowed(needle),
            percent,
            message: Cow::Borrowed(message),
        }
    }
}

/// Milestones recognized in InstantMesh output.
pub fn default_milestones() -> Vec<Milestone> {
    vec![
        Milestone::fixed("Imagining", 60, "Generating geometry"),
        Milestone::fixed("Mesh saved", 90, "Finalizing mesh"),
    ]
}

/// Fires each milestone at most once, with strictly increasing percentages.
#[derive(Debug)]
pub struct MilestoneTracker<'a> {
    table: &'a [Milestone],
    fired: Vec<bool>,
    last_percent: u8,
}

impl<'a> MilestoneTracker<'a> {
    /// Track `table`, ignoring anything at or below `floor`.
    pub fn new(table: &'a [Milestone], floor: u8) -> Self {
        Self {
            table,
            fired: vec![false; table.len()],
            last_percent: floor,
        }
    }

    /// The milestone `line` reaches, if any.
    pub fn observe(&mut self, line: &str) -> Option<&'a Milestone> {
        let table = self.table;
        let (index, milestone) = table.iter().enumerate().find(|(i, m)| {
            !self.fired[*i] && m.percent > self.last_percent && line.contains(m.needle.as_ref())
        })?;
        self.fired[index] = true;
        self.last_percent = milestone.percent;
        Some(milestone)
    }
}

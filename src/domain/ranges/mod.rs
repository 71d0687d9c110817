// Range model - Removal ranges of the open video with linear undo/redo

use std::collections::VecDeque;

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{RangeId, RemovalRange, TimeRange};

/// Narrowest range accepted by default, in seconds
pub const DEFAULT_MIN_RANGE_WIDTH: f64 = 0.1;

/// Undo depth kept by default
pub const DEFAULT_MAX_HISTORY: usize = 200;

/// Immutable ordered copy of a range set
pub type Snapshot = Vec<RemovalRange>;

/// Limits applied by the range model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeModelOptions {
    pub min_range_width: f64,
    pub max_history: usize,
}

impl Default for RangeModelOptions {
    fn default() -> Self {
        Self {
            min_range_width: DEFAULT_MIN_RANGE_WIDTH,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Undo and redo stacks of full snapshots
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
}

impl EditHistory {
    /// Record the state before a mutation; history never branches
    fn record(&mut self, before: Snapshot, max_depth: usize) {
        self.undo.push_back(before);
        while self.undo.len() > max_depth.max(1) {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}

/// Owner of the live removal range set for one video
///
/// The set is kept sorted by `start` and pairwise non-overlapping. Every
/// rejected call leaves both the set and the history untouched.
#[derive(Debug, Clone)]
pub struct RangeModel {
    duration: f64,
    ranges: Vec<RemovalRange>,
    history: EditHistory,
    selected: Option<RangeId>,
    next_id: u64,
    options: RangeModelOptions,
}

impl RangeModel {
    /// Create an empty model for a video of `duration` seconds
    pub fn new(duration: f64) -> Result<Self, DomainError> {
        Self::with_options(duration, RangeModelOptions::default())
    }

    pub fn with_options(duration: f64, options: RangeModelOptions) -> Result<Self, DomainError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(DomainError::ProbeUnavailable(format!(
                "unusable duration {}",
                duration
            )));
        }
        Ok(Self {
            duration,
            ranges: Vec::new(),
            history: EditHistory::default(),
            selected: None,
            next_id: 1,
            options,
        })
    }

    /// Build a model from plain ranges, validating each as an `add`.
    /// The resulting model has no history.
    pub fn from_ranges(
        duration: f64,
        ranges: &[TimeRange],
        options: RangeModelOptions,
    ) -> Result<Self, DomainError> {
        let mut model = Self::with_options(duration, options)?;
        for range in ranges {
            model.add(range.start, range.end)?;
        }
        model.history = EditHistory::default();
        Ok(model)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn ranges(&self) -> &[RemovalRange] {
        &self.ranges
    }

    /// Owned copy for handing to the planner
    pub fn snapshot(&self) -> Snapshot {
        self.ranges.clone()
    }

    pub fn get(&self, id: RangeId) -> Option<&RemovalRange> {
        self.ranges.iter().find(|r| r.id == id)
    }

    pub fn selected(&self) -> Option<RangeId> {
        self.selected
    }

    pub fn can_undo(&self) -> bool {
        self.history.undo_depth() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.history.redo_depth() > 0
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn removed_duration(&self) -> f64 {
        self.ranges.iter().map(RemovalRange::duration).sum()
    }

    pub fn kept_duration(&self) -> f64 {
        (self.duration - self.removed_duration()).max(0.0)
    }

    /// Add a new range and return its id
    pub fn add(&mut self, start: f64, end: f64) -> Result<RangeId, DomainError> {
        let (start, end) = self.normalize(start, end)?;
        self.check_overlap(start, end, None)?;

        let id = RangeId(self.next_id);
        self.next_id += 1;
        self.record();
        self.ranges.push(RemovalRange { id, start, end });
        self.sort();
        debug!("Added range {} ({:.3}s-{:.3}s)", id, start, end);
        Ok(id)
    }

    /// Move the bounds of an existing range, keeping its id
    pub fn update(&mut self, id: RangeId, start: f64, end: f64) -> Result<(), DomainError> {
        let index = self.index_of(id)?;
        let (start, end) = self.normalize(start, end)?;
        self.check_overlap(start, end, Some(id))?;

        self.record();
        self.ranges[index].start = start;
        self.ranges[index].end = end;
        self.sort();
        debug!("Updated range {} to {:.3}s-{:.3}s", id, start, end);
        Ok(())
    }

    pub fn remove(&mut self, id: RangeId) -> Result<RemovalRange, DomainError> {
        let index = self.index_of(id)?;
        self.record();
        let removed = self.ranges.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        debug!("Removed range {}", id);
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.record();
        self.ranges.clear();
        self.selected = None;
    }

    /// Restore the previous snapshot; returns false when there is none
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.ranges, previous);
        self.history.redo.push(current);
        self.selected = None;
        true
    }

    /// Reapply the most recently undone snapshot; returns false when there is none
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.ranges, next);
        self.history.undo.push_back(current);
        self.selected = None;
        true
    }

    pub fn select(&mut self, id: Option<RangeId>) -> Result<(), DomainError> {
        if let Some(id) = id {
            self.index_of(id)?;
        }
        self.selected = id;
        Ok(())
    }

    fn normalize(&self, start: f64, end: f64) -> Result<(f64, f64), DomainError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(DomainError::InvalidRange(format!(
                "bounds must be finite (got {}, {})",
                start, end
            )));
        }
        let (start, end) = if start > end { (end, start) } else { (start, end) };

        if start < 0.0 || end > self.duration {
            return Err(DomainError::InvalidRange(format!(
                "{:.3}s-{:.3}s lies outside 0s-{:.3}s",
                start, end, self.duration
            )));
        }
        if end - start < self.options.min_range_width {
            return Err(DomainError::InvalidRange(format!(
                "{:.3}s-{:.3}s is narrower than {:.3}s",
                start, end, self.options.min_range_width
            )));
        }
        Ok((start, end))
    }

    fn check_overlap(&self, start: f64, end: f64, ignore: Option<RangeId>) -> Result<(), DomainError> {
        match self
            .ranges
            .iter()
            .filter(|r| Some(r.id) != ignore)
            .find(|r| r.overlaps(start, end))
        {
            Some(existing) => Err(DomainError::OverlapRejected {
                start,
                end,
                existing: existing.id,
            }),
            None => Ok(()),
        }
    }

    fn index_of(&self, id: RangeId) -> Result<usize, DomainError> {
        self.ranges
            .iter()
            .position(|r| r.id == id)
            .ok_or(DomainError::RangeNotFound(id))
    }

    fn record(&mut self) {
        let before = self.ranges.clone();
        self.history.record(before, self.options.max_history);
    }

    fn sort(&mut self) {
        self.ranges.sort_by(|a, b| a.start.total_cmp(&b.start));
    }
}

// Inspect interactor - Probing a source and previewing segment plans

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::{CuttingMode, TimeRange, VideoInfo};
use crate::domain::ranges::{RangeModel, RangeModelOptions};
use crate::error::{TrimError, TrimResult};
use crate::planner::{SegmentPlan, SegmentPlanner};
use crate::ports::ProbePort;

/// Interactor for probing sources and planning trims without running them
pub struct InspectInteractor {
    probe_port: Arc<dyn ProbePort>,
    planner: SegmentPlanner,
    range_options: RangeModelOptions,
}

impl InspectInteractor {
    /// Create new inspect interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        planner: SegmentPlanner,
        range_options: RangeModelOptions,
    ) -> Self {
        Self {
            probe_port,
            planner,
            range_options,
        }
    }

    /// Probe `source`, failing with `InputNotFound` when it is not a file
    pub async fn inspect(&self, source: &Path) -> TrimResult<VideoInfo> {
        if !source.is_file() {
            return Err(TrimError::InputNotFound {
                path: source.to_path_buf(),
            });
        }
        let info = self.probe_port.probe(source).await?;
        info.validate()?;
        Ok(info)
    }

    /// Probe `source` and plan the removal of `ranges`.
    ///
    /// Ranges are validated the way the range editor validates them, so an
    /// inverted pair is swapped while a too-narrow, out-of-bounds or
    /// overlapping range is rejected.
    pub async fn plan(
        &self,
        source: &Path,
        ranges: &[TimeRange],
        mode: CuttingMode,
    ) -> TrimResult<(VideoInfo, SegmentPlan)> {
        if ranges.is_empty() {
            return Err(DomainError::InvalidRange(
                "at least one removal range is required".to_string(),
            )
            .into());
        }
        let info = self.inspect(source).await?;
        let model = RangeModel::from_ranges(info.duration, ranges, self.range_options)?;
        let removals: Vec<TimeRange> = model
            .ranges()
            .iter()
            .map(|r| r.as_time_range())
            .collect();

        let plan = self
            .planner
            .plan(info.duration, &removals, &info.keyframes, mode)?;
        info!(
            "Plan for {}: keep {:.3}s of {:.3}s in {} segment(s)",
            source.display(),
            plan.kept_duration(),
            info.duration,
            plan.segments.len()
        );
        Ok((info, plan))
    }
}

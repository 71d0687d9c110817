// Unit tests for domain models

#[cfg(test)]
mod tests {
    use crate::domain::model::*;

    #[test]
    fn test_time_spec_parse_seconds() {
        let time = TimeSpec::parse("123.456").unwrap();
        assert_eq!(time.seconds, 123.456);
    }

    #[test]
    fn test_time_spec_parse_mm_ss() {
        let time = TimeSpec::parse("01:30.5").unwrap();
        assert_eq!(time.seconds, 90.5);
    }

    #[test]
    fn test_time_spec_parse_hh_mm_ss() {
        let time = TimeSpec::parse("01:02:03.5").unwrap();
        assert_eq!(time.seconds, 3723.5);
    }

    #[test]
    fn test_time_spec_parse_invalid() {
        assert!(TimeSpec::parse("invalid").is_err());
        assert!(TimeSpec::parse("00:60").is_err());
        assert!(TimeSpec::parse("01:60:00").is_err());
        assert!(TimeSpec::parse("-10").is_err());
        assert!(TimeSpec::parse("NaN").is_err());
    }

    #[test]
    fn test_time_spec_display() {
        let time = TimeSpec::from_seconds(3723.456);
        assert_eq!(format!("{}", time), "01:02:03.456");

        let time_no_hours = TimeSpec::from_seconds(123.456);
        assert_eq!(format!("{}", time_no_hours), "02:03.456");
    }

    #[test]
    fn test_time_range_parse() {
        let range = TimeRange::parse("1:00-1:10.5").unwrap();
        assert_eq!(range.start, 60.0);
        assert_eq!(range.end, 70.5);

        assert!(TimeRange::parse("10").is_err());
        assert!(TimeRange::parse("a-b").is_err());
    }

    #[test]
    fn test_cutting_mode_parse() {
        assert_eq!(CuttingMode::parse("lossless").unwrap(), CuttingMode::Lossless);
        assert_eq!(
            CuttingMode::parse("Frame-Accurate").unwrap(),
            CuttingMode::FrameAccurate
        );
        assert!(CuttingMode::parse("hybrid").is_err());
    }

    #[test]
    fn test_cutting_mode_wire_names() {
        let json = serde_json::to_string(&CuttingMode::FrameAccurate).unwrap();
        assert_eq!(json, "\"frame_accurate\"");
        let mode: CuttingMode = serde_json::from_str("\"lossless\"").unwrap();
        assert_eq!(mode, CuttingMode::Lossless);
    }

    #[test]
    fn test_removal_range_overlap_is_strict() {
        let range = RemovalRange {
            id: RangeId(1),
            start: 10.0,
            end: 20.0,
        };
        assert!(range.overlaps(15.0, 25.0));
        assert!(range.overlaps(0.0, 30.0));
        assert!(!range.overlaps(20.0, 30.0));
        assert!(!range.overlaps(0.0, 10.0));
    }

    #[test]
    fn test_keyframe_set_normalizes_input() {
        let set = KeyframeSet::new(vec![10.0, 0.0, f64::NAN, 5.0, 5.0, -1.0]);
        assert_eq!(set.as_slice(), &[0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_keyframe_set_lookups() {
        let set = KeyframeSet::every(5.0, 0.0, 20.0);
        let tol = 1e-3;
        assert_eq!(set.as_slice(), &[0.0, 5.0, 10.0, 15.0, 20.0]);

        assert_eq!(set.floor(12.0, tol), Some(10.0));
        assert_eq!(set.floor(10.0, tol), Some(10.0));
        assert_eq!(set.ceil(12.0, tol), Some(15.0));
        assert_eq!(set.ceil(15.0, tol), Some(15.0));
        assert_eq!(set.ceil(21.0, tol), None);

        assert_eq!(set.next_after(10.0, tol), Some(15.0));
        assert_eq!(set.prev_before(10.0, tol), Some(5.0));
        assert_eq!(set.prev_before(0.0, tol), None);

        assert!(set.contains(10.0004, tol));
        assert!(!set.contains(10.01, tol));
        assert_eq!(set.average_gop(), Some(5.0));
    }

    #[test]
    fn test_keyframe_set_serializes_as_plain_list() {
        let set = KeyframeSet::new(vec![0.0, 2.5]);
        assert_eq!(serde_json::to_string(&set).unwrap(), "[0.0,2.5]");
        let back: KeyframeSet = serde_json::from_str("[2.5,0.0]").unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_video_info_validation() {
        let info = VideoInfo::new(120.0, 30.0, KeyframeSet::default());
        assert!(info.validate().is_ok());

        let broken = VideoInfo::new(0.0, 30.0, KeyframeSet::default());
        assert!(matches!(
            broken.validate(),
            Err(crate::domain::errors::DomainError::ProbeUnavailable(_))
        ));
    }

    #[test]
    fn test_job_lifecycle_transitions() {
        let mut job = TrimJob::new(JobId::from("job-1"), "out.mp4".into());
        assert_eq!(job.state, JobState::Queued);
        assert!(job.transition(JobState::Completed, "skip").is_err());

        job.transition(JobState::Running, "Running").unwrap();
        assert!(job.advance(40));
        assert!(!job.advance(30));
        assert_eq!(job.progress, 40);

        job.transition(JobState::Cancelled, "Job cancelled").unwrap();
        assert!(job.finished_at.is_some());
        assert_eq!(job.transition(JobState::Completed, "late"), Err(JobState::Cancelled));

        let event = job.event();
        assert_eq!(event.status, JobStatus::Cancelled);
        assert_eq!(event.progress, 40);
        assert!(event.output_path.is_none());
    }

    #[test]
    fn test_completed_event_carries_output_path() {
        let mut job = TrimJob::new(JobId::from("job-2"), "out.mkv".into());
        job.transition(JobState::Running, "Running").unwrap();
        job.transition(JobState::Completed, "Done").unwrap();

        let json = serde_json::to_value(job.event()).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["progress"], 100);
        assert_eq!(json["output_path"], "out.mkv");
    }

    #[test]
    fn test_processing_event_omits_output_path() {
        let event = ProgressEvent::processing(JobId::from("j"), 150, "Working");
        assert_eq!(event.progress, 100);
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("output_path").is_none());
        assert_eq!(json["status"], "processing");
    }

    #[test]
    fn test_trim_request_defaults() {
        let request: TrimRequest = serde_json::from_str(
            r#"{"source_path":"a.mp4","output_path":"b.mp4","removal_ranges":[{"start":1.0,"end":2.0}]}"#,
        )
        .unwrap();
        assert_eq!(request.cutting_mode, CuttingMode::Lossless);
        assert!(!request.overwrite);
        assert_eq!(request.removal_ranges, vec![TimeRange::new(1.0, 2.0)]);
    }
}

//! Command implementations

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::adapters::{ConsoleChannel, JsonLinesChannel};
use crate::app::{run_session, AppContainer, DefaultAppContainer};
use crate::cli::args::{InspectArgs, PlanArgs, SessionArgs, TrimArgs};
use crate::config::AppConfig;
use crate::domain::model::{JobState, TimeSpec, TrimRequest};
use crate::planner::SegmentPlan;
use crate::ports::ProgressChannel;
use crate::utils::{format_duration, format_file_size};

/// Execute the trim command
pub async fn trim(args: TrimArgs, mut config: AppConfig) -> Result<()> {
    args.apply_overrides(&mut config);
    config.validate().context("Invalid encoder settings")?;

    let request = TrimRequest {
        source_path: args.input.clone(),
        output_path: args.output_path(),
        removal_ranges: args.ranges.clone(),
        cutting_mode: args.mode,
        overwrite: args.overwrite,
    };
    info!("Input: {}", request.source_path.display());
    info!("Output: {}", request.output_path.display());
    info!("Mode: {}, {} range(s)", request.cutting_mode, request.removal_ranges.len());

    let channel: Arc<dyn ProgressChannel> = if args.json {
        Arc::new(JsonLinesChannel::stdout())
    } else {
        Arc::new(ConsoleChannel::new(true))
    };

    let container = DefaultAppContainer::new(&config);
    let orchestrator = container.trim_orchestrator();
    let handle = orchestrator
        .start("cli", request.clone(), channel)
        .await
        .context("Trim request rejected")?;
    let job_id = handle.job_id.clone();
    info!(
        "Job {}: keeping {} of {}",
        job_id,
        format_duration(Duration::from_secs_f64(handle.plan.kept_duration())),
        format_duration(Duration::from_secs_f64(handle.plan.duration))
    );

    let wait = handle.wait();
    tokio::pin!(wait);
    let job = tokio::select! {
        job = &mut wait => job,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling job {}", job_id);
            orchestrator.cancel(&job_id);
            wait.await
        }
    };

    match job.state {
        JobState::Completed => {
            let size = std::fs::metadata(&job.output_path).map(|m| m.len()).unwrap_or(0);
            info!(
                "Wrote {} ({}) in {}",
                job.output_path.display(),
                format_file_size(size),
                format_duration(job.elapsed().to_std().unwrap_or_default())
            );
            Ok(())
        }
        JobState::Cancelled => bail!("Trim cancelled; {} left untouched", request.output_path.display()),
        _ => bail!("Trim failed: {}", job.message),
    }
}

/// Execute the plan command
pub async fn plan(args: PlanArgs, config: AppConfig) -> Result<()> {
    let container = DefaultAppContainer::new(&config);
    let (_, plan) = container
        .inspect_interactor()
        .plan(&args.input, &args.ranges, args.mode)
        .await
        .with_context(|| format!("Failed to plan {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &SegmentPlan) {
    println!("Mode: {}", plan.mode);
    println!("Source duration: {}", TimeSpec::from_seconds(plan.duration));
    for range in &plan.removed {
        println!("  remove  {}", range);
    }
    for (index, segment) in plan.segments.iter().enumerate() {
        println!(
            "  keep #{:<3} {} - {}  {}",
            index,
            TimeSpec::from_seconds(segment.source_start),
            TimeSpec::from_seconds(segment.source_end),
            segment.mode
        );
    }
    println!(
        "Kept {:.3}s, removed {:.3}s, re-encoded {:.3}s in {} segment(s)",
        plan.kept_duration(),
        plan.removed_duration(),
        plan.reencode_duration(),
        plan.reencode_count()
    );
    if plan.is_empty() {
        println!("Nothing would be kept; a trim with these ranges is refused.");
    }
}

/// Execute the inspect command
pub async fn inspect(args: InspectArgs, config: AppConfig) -> Result<()> {
    let container = DefaultAppContainer::new(&config);
    let info = container
        .inspect_interactor()
        .inspect(&args.input)
        .await
        .with_context(|| format!("Failed to inspect {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", args.input.display());
    println!("Duration: {}", TimeSpec::from_seconds(info.duration));
    println!("Frame rate: {:.3} fps", info.fps);
    if let Some(codec) = &info.video_codec {
        println!("Video codec: {}", codec);
    }
    if let Some(container) = &info.container {
        println!("Container: {}", container);
    }
    println!("Audio tracks: {}", info.audio_tracks);
    println!("Subtitle tracks: {}", info.subtitle_tracks);
    match info.keyframes.average_gop() {
        Some(gop) => println!("Keyframes: {} (average GOP {:.2}s)", info.keyframes.len(), gop),
        None => println!("Keyframes: {}", info.keyframes.len()),
    }
    Ok(())
}

/// Execute the session command
pub async fn session(args: SessionArgs, config: AppConfig) -> Result<()> {
    let container = DefaultAppContainer::new(&config);
    let channel: Arc<dyn ProgressChannel> = Arc::new(JsonLinesChannel::stdout());
    run_session(
        container.trim_orchestrator(),
        &args.session_id,
        BufReader::new(tokio::io::stdin()),
        channel,
    )
    .await
    .context("Session ended with an error")?;
    Ok(())
}

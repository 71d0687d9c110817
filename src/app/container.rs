use std::sync::Arc;

use crate::adapters::{FfmpegExecAdapter, FfprobeAdapter};
use crate::app::{InspectInteractor, JobRegistry, TrimOrchestrator};
use crate::config::AppConfig;
use crate::engine::JobExecutor;
use crate::planner::SegmentPlanner;
use crate::ports::{ExecutePort, ProbePort};

pub trait AppContainer: Send + Sync {
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
    fn trim_orchestrator(&self) -> Arc<TrimOrchestrator>;
}

pub struct DefaultAppContainer {
    inspect_interactor: Arc<InspectInteractor>,
    trim_orchestrator: Arc<TrimOrchestrator>,
}

impl DefaultAppContainer {
    /// Wire the ffprobe and ffmpeg adapters named in `config`
    pub fn new(config: &AppConfig) -> Self {
        let probe_port = Arc::new(FfprobeAdapter::new(config.encoder.ffprobe.clone()));
        let execute_port = Arc::new(FfmpegExecAdapter::new(config.encoder.ffmpeg.clone()));
        Self::with_ports(config, probe_port, execute_port)
    }

    /// Wire the interactors around the given ports
    pub fn with_ports(
        config: &AppConfig,
        probe_port: Arc<dyn ProbePort>,
        execute_port: Arc<dyn ExecutePort>,
    ) -> Self {
        let inspect_interactor = Arc::new(InspectInteractor::new(
            Arc::clone(&probe_port),
            SegmentPlanner::new(config.planner),
            config.range_model_options(),
        ));

        let executor = Arc::new(JobExecutor::new(
            Arc::clone(&probe_port),
            Arc::clone(&execute_port),
            config.executor_config(),
        ));

        let trim_orchestrator = Arc::new(TrimOrchestrator::new(
            Arc::clone(&inspect_interactor),
            executor,
            JobRegistry::new(),
        ));

        Self {
            inspect_interactor,
            trim_orchestrator,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::clone(&self.inspect_interactor)
    }

    fn trim_orchestrator(&self) -> Arc<TrimOrchestrator> {
        Arc::clone(&self.trim_orchestrator)
    }
}

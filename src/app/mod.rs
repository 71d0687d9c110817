// Application layer - Use case interactors

pub mod container;
pub mod inspect_interactor;
pub mod registry;
pub mod session;
pub mod trim_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use inspect_interactor::InspectInteractor;
pub use registry::{AdmissionGuard, JobRegistry, SessionId};
pub use session::{run_session, SessionCommand};
pub use trim_interactor::{JobHandle, TrimOrchestrator};

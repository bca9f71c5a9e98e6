//! Credit-gated job orchestration core.
//!
//! This crate owns the only logic in the backend with real invariants:
//! - [`Ledger`]: atomic prepaid-credit accounting over an injected
//!   account store; balances never go negative or get double-spent.
//! - [`TrialManager`]: exactly-once settlement of lapsed trial grants.
//! - [`JobRegistry`]: the monotonic job state machine
//!   (pending -> generating -> completed | failed).
//! - [`Orchestrator`]: drives a submission through admission, credit
//!   reservation, synthesis, artifact storage, and failure settlement.
//!
//! External synthesis collaborators are abstracted behind the traits in
//! [`collaborators`]; HTTP implementations live in `scast-synth`.

pub mod collaborators;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod registry;
pub mod trial;

pub use collaborators::{CollaboratorError, ScriptEnhancer, SpeechSynthesizer, VideoRenderer};
pub use error::{PipelineError, PipelineResult, PipelineStage};
pub use ledger::Ledger;
pub use orchestrator::{JobStatusReport, Orchestrator, SubmitReceipt, SubmitRequest};
pub use registry::JobRegistry;
pub use trial::TrialManager;

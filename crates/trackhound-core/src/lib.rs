//! trackhound-core: find one audio track for a free-text query by trying
//! sources in a fixed order until one succeeds

pub mod config;
pub mod deliver;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod provider;
pub mod status;
pub mod temp;
pub mod validation;

pub use config::Config;
pub use error::{QueryError, Result, TrackhoundError};
pub use orchestrator::{Acquired, Acquisition, Orchestrator, NOWHERE};
pub use provider::{Provider, ProviderDescriptor, ProviderOutcome};
pub use status::{ChannelReporter, StatusEvent, StatusReporter};
pub use validation::Query;

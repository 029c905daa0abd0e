pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod traits;

pub use config::{BackendConfig, BackendKind, ClientFactory};
pub use error::{ClientError, Result};
pub use http::HttpBackend;
pub use memory::{MemoryBackend, ScriptedReply};
pub use traits::{Backend, HistoryClient, ProfileClient, QueryClient, QueryRequest};

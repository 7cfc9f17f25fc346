pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod sync;
pub mod transport;

pub use config::Config;
pub use error::{SyncError, SyncResult};
pub use models::{Property, PropertyDraft, PropertyPatch};
pub use session::{CredentialStore, FileTokenStore, MemoryTokenStore, Session};
pub use sync::{OperationKind, SyncCoordinator};
pub use transport::{HttpTransport, Transport};

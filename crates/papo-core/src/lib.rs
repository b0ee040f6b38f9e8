pub mod client;
pub mod config;
pub mod identity;
pub mod protocol;
pub mod state;
pub mod storage;
pub mod transport;

// Re-export main types for convenience
pub use client::{ChatClient, PendingExchange};
pub use config::Config;
pub use protocol::{ChatReply, ChatRequest, Outcome};
pub use state::{Entry, EntryId, Item, OptionSet, OptionSetId, Role, Transcript};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use transport::{HttpTransport, Transport, TransportError};

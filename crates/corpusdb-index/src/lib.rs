#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod context;
pub mod manager;
pub mod memory;
pub mod retriever;
pub mod retry;
pub mod upsert;

pub use context::{ContextAssembler, CONTEXT_SEPARATOR};
pub use manager::IndexManager;
pub use memory::InMemoryIndexProvider;
pub use retriever::Retriever;
pub use retry::{with_retry, RetryPolicy};
pub use upsert::{UpsertCoordinator, UpsertPolicy};

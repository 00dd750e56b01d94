pub mod catalog;
pub mod connection;
pub mod patch;
pub mod probe;
pub mod resolve;
pub mod workflow;

pub use catalog::{Catalog, CreatePayload};
pub use connection::{decode_connection, decode_tagged_connection, normalize_connection};
pub use patch::{apply_patch, patch_entity};
pub use probe::{ConnectionProber, ProbeOutcome, SqlxProber};
pub use resolve::{Ancestors, Resolver};
pub use workflow::WorkflowRunner;

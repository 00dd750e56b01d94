pub mod common;
pub mod connection;
pub mod database;
pub mod entity;
pub mod fqn;
pub mod patch;
pub mod schema;
pub mod service;
pub mod stored_procedure;
pub mod system;
pub mod table;
pub mod test_connection;
pub mod user_context;
pub mod workflow;

pub use common::*;
pub use connection::*;
pub use database::*;
pub use entity::*;
pub use patch::*;
pub use schema::*;
pub use service::*;
pub use stored_procedure::*;
pub use system::*;
pub use table::*;
pub use test_connection::*;
pub use user_context::*;
pub use workflow::*;

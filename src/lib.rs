pub mod config;
pub mod error;
pub mod model;
pub mod graph;
pub mod network;
pub mod extract;
pub mod export;
pub mod fetch;

pub use config::Config;
pub use error::{OwnergraphError, Result};
pub use model::{normalize_id, Entity, EntityKind, RelationType, Relationship};
pub use network::{assemble, AssembledNetwork, Network};

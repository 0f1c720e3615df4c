//! Command Model Module
//!
//! Represents one client or internal command as an ordered argument list plus
//! the routing metadata derived from it.
//!
//! ## Core Concepts
//! - **Routing table**: an explicit, immutable, case-insensitive mapping from
//!   command name to routing metadata, built once at startup and shared by
//!   reference. Unknown commands fall back to a default policy (key at
//!   argument 1, shardable).
//! - **Rewriting**: commands are value types that support in-place argument
//!   rewrites; replacing argument 0 (including prefix substitution) forces
//!   the routing metadata to be resolved again.
//!
//! ## Submodules
//! - **`table`**: The static routing-metadata table.
//! - **`model`**: The `Command` value type.
//! - **`types`**: Routing metadata records and flags.

pub mod model;
pub mod table;
pub mod types;

pub use model::Command;
pub use table::CommandTable;
pub use types::{CommandKind, KeyScope, RoutingInfo};

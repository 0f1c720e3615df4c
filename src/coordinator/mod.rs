//! Scatter-Gather Coordination Module
//!
//! Executes one logical client command as 1..N concurrent shard calls and
//! merges the collected replies into a single response.
//!
//! ## Architecture Overview
//! 1. **Registration**: every client command is registered with its dispatch
//!    recipe, coordination strategy, and reducer as plain data.
//! 2. **Routing**: the handler rewrites the command for the shard engine
//!    (prefix substitution, key tagging, paging rewrites) using the current
//!    topology snapshot.
//! 3. **Dispatch**: the engine spawns one task per target node, bounded by
//!    one shared deadline; failures and timeouts become positional entries
//!    instead of aborting the request.
//! 4. **Reduction**: the registered reducer runs exactly once over the
//!    ordered reply set and produces the only reply the client sees.
//!
//! ## Submodules
//! - **`engine`**: Concurrent dispatch and the exactly-once reduce barrier.
//! - **`transport`**: The boundary to the per-shard engine.
//! - **`handlers`**: Command registration table and the HTTP API surface.

pub mod engine;
pub mod handlers;
pub mod transport;

pub use engine::{CoordinationStrategy, Dispatch, ScatterGather};
pub use handlers::{AppState, HandlerRegistry};
pub use transport::{HttpShardTransport, ShardTransport};

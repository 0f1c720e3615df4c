//! Command Routing Table
//!
//! Maps command names (case-insensitive) to their static routing metadata.
//! The table is immutable after construction and passed by reference to
//! every `Command`; there is no hidden global state.

use std::collections::HashMap;

use super::types::{CommandKind, KeyScope, RoutingInfo};

use CommandKind::{Read, Write};
use KeyScope::{Coordination, MultiKey, NoKey, SingleKey};

/// Immutable lookup table from command name to routing metadata.
pub struct CommandTable {
    entries: HashMap<String, RoutingInfo>,
}

impl CommandTable {
    /// Creates an empty table. Mostly useful in tests; production code wants
    /// [`CommandTable::with_defaults`].
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Builds the full routing table for the search command set: the internal
    /// sharded forms (`_FT.*`), their coordinator-level counterparts
    /// (`FT.*`, never routed to a single shard), and plain system commands.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();

        // Internal document commands
        table.register("_FT.SEARCH", RoutingInfo::new(Read, SingleKey, 1, 1));
        table.register("_FT.DEL", RoutingInfo::new(Write, MultiKey, 1, 2));
        table.register("_FT.ADD", RoutingInfo::new(Write, MultiKey, 1, 2));
        table.register("_FT.ADDHASH", RoutingInfo::new(Write, MultiKey, 1, 2));
        table.register("_FT.MGET", RoutingInfo::new(Read, MultiKey, 1, 1));

        // Internal index commands
        table.register("_FT.CREATE", RoutingInfo::new(Write, SingleKey, 1, 1));
        table.register("_FT.ALTER", RoutingInfo::new(Write, SingleKey, 1, 1));
        table.register("_FT.DROP", RoutingInfo::new(Write, SingleKey, 1, 1));
        table.register("_FT.OPTIMIZE", RoutingInfo::new(Write, SingleKey, 1, 1));
        table.register("_FT.INFO", RoutingInfo::new(Read, SingleKey, 1, 1));
        table.register("_FT.EXPLAIN", RoutingInfo::new(Read, SingleKey, 1, 1));
        table.register("_FT.TAGVALS", RoutingInfo::new(Read, SingleKey, 1, 1));

        // Internal suggestion commands
        table.register("_FT.SUGADD", RoutingInfo::new(Write, SingleKey, 1, 1));
        table.register("_FT.SUGGET", RoutingInfo::new(Read, SingleKey, 1, 1));
        table.register("_FT.SUGLEN", RoutingInfo::new(Read, SingleKey, 1, 1));
        table.register("_FT.SUGDEL", RoutingInfo::new(Write, SingleKey, 1, 1));

        // Coordination entry points. Registered as reads so replicas can
        // trigger them; key_pos -1 keeps them off the single-shard path.
        table.register("FT.ADD", RoutingInfo::new(Read, Coordination, -1, 2));
        table.register("FT.ADDHASH", RoutingInfo::new(Read, Coordination, -1, 2));
        table.register("FT.DEL", RoutingInfo::new(Read, Coordination, -1, 2));
        table.register("FT.SEARCH", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.LSEARCH", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.FSEARCH", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.EXPLAIN", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.CREATE", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.ALTER", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.DROP", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.INFO", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.GET", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.MGET", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.TAGVALS", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.BROADCAST", RoutingInfo::new(Read, Coordination, -1, -1));
        table.register("FT.CLUSTERINFO", RoutingInfo::new(Read, Coordination, -1, -1));

        // Suggestion coordination entry points
        table.register("FT.SUGADD", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.SUGGET", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.SUGDEL", RoutingInfo::new(Read, Coordination, -1, 1));
        table.register("FT.SUGLEN", RoutingInfo::new(Read, Coordination, -1, 1));

        // System commands with no routing key
        table.register("KEYS", RoutingInfo::new(Read, NoKey, -1, -1));
        table.register("INFO", RoutingInfo::new(Read, NoKey, -1, -1));

        table
    }

    /// Registers one entry. Later registrations for the same name win.
    pub fn register(&mut self, name: &str, info: RoutingInfo) {
        self.entries.insert(name.to_ascii_uppercase(), info);
    }

    /// Case-insensitive metadata lookup. `None` means the command is unknown
    /// and callers fall back to the default routing policy.
    pub fn lookup(&self, name: &str) -> Option<RoutingInfo> {
        self.entries.get(&name.to_ascii_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

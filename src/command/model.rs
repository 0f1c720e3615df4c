//! The `Command` value type.
//!
//! A command owns its argument storage outright; cloning one duplicates every
//! argument. Routing metadata is resolved from the shared table once at
//! construction and again whenever argument 0 changes.

use std::fmt;
use std::sync::Arc;

use super::table::CommandTable;
use super::types::{KeyScope, RoutingInfo};

/// Default key position applied when a command is not in the routing table.
const DEFAULT_KEY_POS: i32 = 1;

#[derive(Clone)]
pub struct Command {
    args: Vec<String>,
    table: Arc<CommandTable>,
    routing: Option<RoutingInfo>,
}

impl Command {
    /// Builds a command from an ordered argument list and resolves its
    /// routing metadata against the table.
    pub fn new(args: Vec<String>, table: Arc<CommandTable>) -> Self {
        let routing = args.first().and_then(|name| table.lookup(name));
        Self { args, table, routing }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn name(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }

    /// Replaces the argument at `index` in place. Out-of-range indexes are
    /// ignored. Replacing argument 0 re-resolves the routing metadata.
    pub fn replace_arg(&mut self, index: usize, value: impl Into<String>) {
        if index >= self.args.len() {
            return;
        }
        self.args[index] = value.into();
        if index == 0 {
            self.resolve();
        }
    }

    /// Appends arguments at the end of the list.
    pub fn append_args<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(values.into_iter().map(Into::into));
    }

    /// Replaces the command prefix (the part of argument 0 up to and
    /// including the first `.`) with `{prefix}.`. A command without a dot
    /// gets the prefix prepended. Routing metadata is re-resolved.
    pub fn set_prefix(&mut self, prefix: &str) {
        let Some(name) = self.args.first() else {
            return;
        };
        let suffix = match name.find('.') {
            Some(dot) => &name[dot + 1..],
            None => name.as_str(),
        };
        let renamed = format!("{}.{}", prefix, suffix);
        self.args[0] = renamed;
        self.resolve();
    }

    /// Argument index used for slot computation; defaults to 1 for
    /// unrecognized commands.
    pub fn sharding_key(&self) -> i32 {
        self.routing.map(|r| r.key_pos).unwrap_or(DEFAULT_KEY_POS)
    }

    /// Argument index rewritten with the owning shard's hash tag; defaults
    /// to 1 for unrecognized commands.
    pub fn partitioning_key(&self) -> i32 {
        self.routing
            .map(|r| r.partition_key_pos)
            .unwrap_or(DEFAULT_KEY_POS)
    }

    /// True for commands that must not be routed to a single shard
    /// (coordination and system commands). Unrecognized commands are
    /// considered shardable.
    pub fn is_unsharded(&self) -> bool {
        self.routing.map(|r| r.key_pos <= 0).unwrap_or(false)
    }

    /// True when the command carries several key arguments that each need
    /// their own shard tag.
    pub fn is_multi_key(&self) -> bool {
        self.routing
            .map(|r| r.scope == KeyScope::MultiKey)
            .unwrap_or(false)
    }

    pub fn routing(&self) -> Option<RoutingInfo> {
        self.routing
    }

    fn resolve(&mut self) {
        self.routing = self.args.first().and_then(|name| self.table.lookup(name));
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("args", &self.args)
            .field("routing", &self.routing)
            .finish()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}

//! Routing metadata attached to known commands.

/// Whether a command reads or mutates shard state. Coordination entry points
/// are registered as reads so replicas may serve them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Read,
    Write,
}

/// How a command relates to routing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    /// Exactly one routing key; the command lands on one shard.
    SingleKey,
    /// Several key arguments, each of which needs its own shard tag.
    MultiKey,
    /// No routing key at all (system commands).
    NoKey,
    /// Coordinator-level entry point; never routed to a single shard.
    Coordination,
}

/// Static routing metadata for one command-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingInfo {
    pub kind: CommandKind,
    pub scope: KeyScope,
    /// Argument index used for slot computation; <= 0 means unsharded.
    pub key_pos: i32,
    /// Argument index rewritten with the owning shard's hash tag.
    pub partition_key_pos: i32,
}

impl RoutingInfo {
    pub const fn new(
        kind: CommandKind,
        scope: KeyScope,
        key_pos: i32,
        partition_key_pos: i32,
    ) -> Self {
        Self { kind, scope, key_pos, partition_key_pos }
    }
}

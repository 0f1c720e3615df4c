//! Partitioner
//!
//! Pure routing computations over one topology snapshot: which shard owns a
//! key, the canonical hash tag of each shard, and the command rewrites that
//! keep the coordinator's routing decision and the shard engine's internal
//! routing in agreement.

use crate::command::Command;

use super::types::Topology;

/// Index of the shard owning `key` under the snapshot's hash function.
pub fn shard_for_key(topology: &Topology, key: &str) -> Option<usize> {
    let slot = topology.hash_func.slot(key);
    topology.shard_for_slot(slot)
}

/// Canonical hash tag of a shard: the smallest decimal string whose slot
/// lands inside the shard's range. Deterministic for a given snapshot, so
/// every rewrite of the same logical key produces the same tagged form.
pub fn shard_tag(topology: &Topology, shard_index: usize) -> Option<String> {
    let shard = topology.shards.get(shard_index)?;
    // The expected number of probes is roughly the shard count, so this
    // stays cheap even on every rewrite.
    for candidate in 0u32..u32::from(topology.num_slots()) * 2 {
        let tag = candidate.to_string();
        let slot = topology.hash_func.slot(&tag);
        if shard.contains_slot(slot) {
            return Some(tag);
        }
    }
    None
}

/// Wraps the argument at `arg_index` with the hash tag of its own owning
/// shard, so the shard engine's internal routing agrees with ours.
/// Out-of-range indexes are ignored.
pub fn rewrite_command_arg(topology: &Topology, cmd: &mut Command, arg_index: usize) {
    let Some(arg) = cmd.arg(arg_index).map(str::to_owned) else {
        return;
    };
    let Some(owner) = shard_for_key(topology, &arg) else {
        return;
    };
    if let Some(tag) = shard_tag(topology, owner) {
        cmd.replace_arg(arg_index, format!("{}{{{}}}", arg, tag));
    }
}

/// Computes the owning shard for the key at `part_index` and tags the
/// command's sharding key with that shard's tag, so a single-key command
/// lands deterministically on the shard owning its partition key. When the
/// sharding key and the partition key are the same argument this is plain
/// self-tagging.
pub fn rewrite_command(topology: &Topology, cmd: &mut Command, part_index: usize) {
    let Some(part_key) = cmd.arg(part_index).map(str::to_owned) else {
        return;
    };
    let Some(owner) = shard_for_key(topology, &part_key) else {
        return;
    };
    let key_pos = cmd.sharding_key();
    if key_pos <= 0 {
        return;
    }
    let key_index = key_pos as usize;
    let Some(key) = cmd.arg(key_index).map(str::to_owned) else {
        return;
    };
    if let Some(tag) = shard_tag(topology, owner) {
        cmd.replace_arg(key_index, format!("{}{{{}}}", key, tag));
    }
}

/// Expands one logical command into exactly one rewritten copy per shard,
/// in topology order (stable for a given snapshot). Each copy's partition
/// key carries the tag of its target shard. Commands without a usable
/// partition key are replicated untagged.
pub fn multiplex_command(topology: &Topology, cmd: &Command) -> Vec<Command> {
    let part_pos = cmd.partitioning_key();
    let mut out = Vec::with_capacity(topology.num_shards());

    for shard_index in 0..topology.num_shards() {
        let mut copy = cmd.clone();
        if part_pos > 0 && (part_pos as usize) < copy.len() {
            if let Some(tag) = shard_tag(topology, shard_index) {
                let arg_index = part_pos as usize;
                let tagged = format!("{}{{{}}}", copy.arg(arg_index).unwrap_or(""), tag);
                copy.replace_arg(arg_index, tagged);
            }
        }
        out.push(copy);
    }
    out
}

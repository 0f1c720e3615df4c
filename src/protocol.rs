//! Coordinator Wire Protocol
//!
//! Defines the typed reply union and the Data Transfer Objects (DTOs) used on
//! both boundaries of the coordinator: the client-facing JSON API and the
//! internal per-shard engine endpoint.
//!
//! Replies are immutable once received from a shard; the scatter-gather engine
//! moves them into the reducer and the reducer alone decides what the client
//! sees.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Public endpoint for executing a client command through the coordinator.
pub const ENDPOINT_COMMAND: &str = "/command";
/// Endpoint for installing a full replacement topology snapshot.
pub const ENDPOINT_CLUSTER_SET: &str = "/cluster/set";
/// Endpoint for triggering an on-demand topology refresh.
pub const ENDPOINT_CLUSTER_REFRESH: &str = "/cluster/refresh";
/// Read-only cluster introspection endpoint.
pub const ENDPOINT_CLUSTER_INFO: &str = "/cluster/info";
/// Endpoint for hot-reloading the mutable configuration values.
pub const ENDPOINT_CONFIG: &str = "/config";
/// Internal endpoint each shard engine exposes for rewritten commands.
pub const ENDPOINT_SHARD_COMMAND: &str = "/internal/command";

/// A single reply returned by a shard engine or produced by a reducer.
///
/// Mirrors the reply types of the shard engine protocol. `Nil` doubles as the
/// timeout marker: a dispatch that misses the shared deadline contributes a
/// `Nil` entry at its position instead of blocking the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum Reply {
    /// Simple status line, e.g. "OK".
    Status(String),
    /// Bulk string payload.
    Str(String),
    Int(i64),
    Double(f64),
    Array(Vec<Reply>),
    Error(String),
    Nil,
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// String view used by reducers that merge textual elements.
    /// Covers both bulk strings and simple status lines.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Status(s) | Reply::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Integer view with the lenient coercion shard engines rely on:
    /// integers pass through, numeric strings are parsed, doubles truncate.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(n) => Some(*n),
            Reply::Double(d) => Some(*d as i64),
            Reply::Status(s) | Reply::Str(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Double view with the same coercion rules as [`Reply::as_int`].
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Reply::Double(d) => Some(*d),
            Reply::Int(n) => Some(*n as f64),
            Reply::Status(s) | Reply::Str(s) => s.parse().ok(),
            _ => None,
        }
    }
}

// --- Data Transfer Objects ---

/// Client request body: one command as an ordered argument list.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandRequest {
    pub args: Vec<String>,
}

/// Body POSTed to a shard engine's internal command endpoint.
///
/// Argument 0 always carries the internal (prefix-rewritten) command name and
/// any routing key argument already carries its shard tag.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShardCommandRequest {
    pub args: Vec<String>,
}

/// Hot-reloadable configuration values; anything omitted stays unchanged.
/// Only the coordinator timeout and the partition count may change after
/// startup.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigUpdateRequest {
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub partitions: Option<usize>,
}

/// Acknowledgment for topology administration requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClusterAckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClusterAckResponse {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { success: false, error: Some(msg.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::types::Topology;

    #[test]
    fn test_reply_wire_format_roundtrip() {
        let reply = Reply::Array(vec![
            Reply::Int(10),
            Reply::Str("d1".to_string()),
            Reply::Double(9.0),
            Reply::Nil,
            Reply::Error("oops".to_string()),
            Reply::Status("OK".to_string()),
        ]);

        let encoded = serde_json::to_string(&reply).unwrap();
        let decoded: Reply = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, reply);
    }

    #[test]
    fn test_reply_tags_are_stable() {
        // shard engines encode against these exact tags
        assert_eq!(
            serde_json::to_string(&Reply::Nil).unwrap(),
            r#"{"t":"nil"}"#
        );
        assert_eq!(
            serde_json::to_string(&Reply::Int(3)).unwrap(),
            r#"{"t":"int","v":3}"#
        );
        assert_eq!(
            serde_json::to_string(&Reply::Status("OK".to_string())).unwrap(),
            r#"{"t":"status","v":"OK"}"#
        );
    }

    #[test]
    fn test_reply_coercions() {
        assert_eq!(Reply::Str("42".to_string()).as_int(), Some(42));
        assert_eq!(Reply::Double(3.9).as_int(), Some(3));
        assert_eq!(Reply::Int(2).as_double(), Some(2.0));
        assert_eq!(Reply::Nil.as_int(), None);
        assert_eq!(Reply::Status("OK".to_string()).as_str(), Some("OK"));
    }

    #[test]
    fn test_topology_snapshot_deserializes_from_membership_json() {
        let raw = r#"{
            "hash_func": "crc16",
            "shards": [
                {
                    "start_slot": 0,
                    "end_slot": 16383,
                    "nodes": [
                        {
                            "id": "n1",
                            "endpoint": {"host": "10.0.0.1", "port": 7001},
                            "master": true,
                            "myself": false
                        }
                    ]
                }
            ]
        }"#;

        let topology: Topology = serde_json::from_str(raw).unwrap();
        assert_eq!(topology.num_shards(), 1);
        assert_eq!(topology.num_slots(), 16384);
        assert!(topology.validate().is_ok());
        assert_eq!(topology.shards[0].nodes[0].endpoint.to_string(), "10.0.0.1:7001");
    }
}

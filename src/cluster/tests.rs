//! Cluster Module Tests
//!
//! Validates slot hashing, topology validation, snapshot swapping and the
//! routing rewrites.
//!
//! ## Test Scopes
//! - **Slots**: Deterministic hashing, range bounds, hash-tag extraction.
//! - **Topology**: Self-consistency validation and store swap semantics.
//! - **Partitioner**: Tag computation, rewriting, and multiplexing.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::cluster::partitioner::{
        multiplex_command, rewrite_command, rewrite_command_arg, shard_for_key, shard_tag,
    };
    use crate::cluster::slots::{routing_tag, HashFunc, CRC12_SLOTS, CRC16_SLOTS};
    use crate::cluster::store::TopologyStore;
    use crate::cluster::types::{Endpoint, Node, Shard, Topology};
    use crate::command::{Command, CommandTable};
    use crate::config::{ClusterConfig, ClusterType};

    fn node(id: &str, port: u16, master: bool) -> Node {
        Node {
            id: id.to_string(),
            endpoint: Endpoint { host: "127.0.0.1".to_string(), port },
            master,
            myself: false,
        }
    }

    /// Evenly splits the CRC16 slot space across `n` shards.
    fn topology(n: u16) -> Topology {
        let total = CRC16_SLOTS;
        let per_shard = total / n;
        let shards = (0..n)
            .map(|i| {
                let start = i * per_shard;
                let end = if i == n - 1 { total - 1 } else { start + per_shard - 1 };
                Shard {
                    start_slot: start,
                    end_slot: end,
                    nodes: vec![node(&format!("node-{}", i), 7000 + i, true)],
                }
            })
            .collect();
        Topology::new(HashFunc::Crc16, shards)
    }

    fn cmd(args: &[&str]) -> Command {
        Command::new(
            args.iter().map(|s| s.to_string()).collect(),
            Arc::new(CommandTable::with_defaults()),
        )
    }

    // ============================================================
    // SLOT TESTS
    // ============================================================

    #[test]
    fn test_slot_is_deterministic() {
        for func in [HashFunc::Crc16, HashFunc::Crc12] {
            let s1 = func.slot("doc:1234");
            let s2 = func.slot("doc:1234");
            assert_eq!(s1, s2, "the same key must always map to the same slot");
        }
    }

    #[test]
    fn test_slot_is_within_range() {
        for i in 0..1000 {
            let key = format!("key_{}", i);
            assert!(HashFunc::Crc16.slot(&key) < CRC16_SLOTS);
            assert!(HashFunc::Crc12.slot(&key) < CRC12_SLOTS);
        }
    }

    #[test]
    fn test_crc16_matches_xmodem_reference() {
        // The shard engine uses CRC16/XMODEM, whose standard check value for
        // "123456789" is 0x31C3.
        assert_eq!(HashFunc::Crc16.slot("123456789"), 0x31C3 % CRC16_SLOTS);
    }

    #[test]
    fn test_hash_tag_extraction() {
        assert_eq!(routing_tag("user"), "user");
        assert_eq!(routing_tag("{user}.profile"), "user");
        assert_eq!(routing_tag("doc{user}extra"), "user");
        // degenerate tags fall back to the full key
        assert_eq!(routing_tag("doc{}rest"), "doc{}rest");
        assert_eq!(routing_tag("doc{unterminated"), "doc{unterminated");
    }

    #[test]
    fn test_tagged_keys_share_a_slot() {
        let a = HashFunc::Crc16.slot("doc:1{user}");
        let b = HashFunc::Crc16.slot("doc:2{user}");
        let tag_only = HashFunc::Crc16.slot("user");
        assert_eq!(a, b);
        assert_eq!(a, tag_only);
    }

    // ============================================================
    // TOPOLOGY VALIDATION TESTS
    // ============================================================

    #[test]
    fn test_valid_topology_passes() {
        assert!(topology(4).validate().is_ok());
        assert!(topology(1).validate().is_ok());
    }

    #[test]
    fn test_empty_topology_rejected() {
        let topo = Topology::new(HashFunc::Crc16, vec![]);
        assert!(topo.validate().is_err());
    }

    #[test]
    fn test_shard_without_nodes_rejected() {
        let mut topo = topology(2);
        topo.shards[0].nodes.clear();
        assert!(topo.validate().is_err());
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let mut topo = topology(2);
        topo.shards[1].start_slot = topo.shards[0].end_slot; // overlap by one slot
        let err = topo.validate().unwrap_err();
        assert!(err.contains("overlap"), "unexpected error: {}", err);
    }

    #[test]
    fn test_coverage_gap_rejected() {
        let mut topo = topology(2);
        topo.shards[1].start_slot += 1;
        assert!(topo.validate().is_err());
    }

    #[test]
    fn test_partial_coverage_rejected() {
        let mut topo = topology(2);
        topo.shards[1].end_slot -= 10;
        assert!(topo.validate().is_err());
    }

    // ============================================================
    // TOPOLOGY STORE TESTS
    // ============================================================

    #[test]
    fn test_store_starts_not_ready() {
        let store = TopologyStore::new(Arc::new(ClusterConfig::default()));
        assert!(!store.ready());
        assert!(store.get().is_none());
    }

    #[test]
    fn test_store_install_and_get() {
        let store = TopologyStore::new(Arc::new(ClusterConfig::default()));
        store.update(topology(3)).unwrap();
        let snapshot = store.get().expect("snapshot should be installed");
        assert_eq!(snapshot.num_shards(), 3);
    }

    #[test]
    fn test_rejected_update_keeps_previous_snapshot() {
        let store = TopologyStore::new(Arc::new(ClusterConfig::default()));
        store.update(topology(3)).unwrap();

        let mut bad = topology(2);
        bad.shards[1].start_slot = bad.shards[0].end_slot;
        assert!(store.update(bad).is_err());

        let snapshot = store.get().expect("previous snapshot should survive");
        assert_eq!(snapshot.num_shards(), 3, "store must keep the prior topology");
    }

    #[test]
    fn test_inflight_snapshot_survives_swap() {
        let store = TopologyStore::new(Arc::new(ClusterConfig::default()));
        store.update(topology(3)).unwrap();
        let captured = store.get().unwrap();

        store.update(topology(5)).unwrap();

        assert_eq!(captured.num_shards(), 3, "captured snapshot must not change");
        assert_eq!(store.get().unwrap().num_shards(), 5);
    }

    #[test]
    fn test_ensure_size_reconciles_in_auto_mode() {
        let config = Arc::new(ClusterConfig::new(ClusterType::Open, 0, 500));
        let store = TopologyStore::new(config.clone());

        store.ensure_size(&topology(4));
        assert_eq!(config.partitions(), 4);

        // idempotent
        store.ensure_size(&topology(4));
        assert_eq!(config.partitions(), 4);
    }

    #[test]
    fn test_ensure_size_respects_explicit_count() {
        let config = Arc::new(ClusterConfig::new(ClusterType::Open, 20, 500));
        let store = TopologyStore::new(config.clone());

        store.ensure_size(&topology(4));
        assert_eq!(config.partitions(), 20, "explicit partition count is authoritative");
    }

    // ============================================================
    // PARTITIONER TESTS
    // ============================================================

    #[test]
    fn test_shard_tag_lands_in_range() {
        let topo = topology(4);
        for i in 0..topo.num_shards() {
            let tag = shard_tag(&topo, i).expect("every shard needs a tag");
            let slot = topo.hash_func.slot(&tag);
            assert!(
                topo.shards[i].contains_slot(slot),
                "tag {} of shard {} hashes to slot {} outside {}-{}",
                tag,
                i,
                slot,
                topo.shards[i].start_slot,
                topo.shards[i].end_slot
            );
        }
    }

    #[test]
    fn test_rewrite_command_pins_key_to_owner() {
        let topo = topology(4);
        let mut c = cmd(&["_FT.SEARCH", "myindex", "hello"]);
        let owner = shard_for_key(&topo, "myindex").unwrap();

        rewrite_command(&topo, &mut c, 1);

        let rewritten = c.arg(1).unwrap();
        assert!(rewritten.starts_with("myindex{"), "got {}", rewritten);
        let new_owner = shard_for_key(&topo, rewritten).unwrap();
        assert_eq!(new_owner, owner, "tagging must not move the key off its shard");
    }

    #[test]
    fn test_rewrite_command_tags_sharding_key_by_partition_owner() {
        let topo = topology(4);
        // _FT.ADD shards by the index name (arg 1) but partitions by the
        // document id (arg 2)
        let mut c = cmd(&["_FT.ADD", "myindex", "doc:77", "1.0"]);
        let doc_owner = shard_for_key(&topo, "doc:77").unwrap();

        rewrite_command(&topo, &mut c, 2);

        let index_key = c.arg(1).unwrap();
        assert!(index_key.starts_with("myindex{"), "got {}", index_key);
        assert_eq!(
            shard_for_key(&topo, index_key).unwrap(),
            doc_owner,
            "the command must land on the shard owning the document"
        );
        assert_eq!(c.arg(2), Some("doc:77"), "partition key itself untouched here");
    }

    #[test]
    fn test_rewrite_command_arg_out_of_range_is_noop() {
        let topo = topology(2);
        let mut c = cmd(&["_FT.SEARCH", "idx"]);
        rewrite_command_arg(&topo, &mut c, 9);
        assert_eq!(c.arg(1), Some("idx"));
    }

    #[test]
    fn test_multiplex_one_command_per_shard_in_order() {
        let topo = topology(4);
        let c = cmd(&["_FT.TAGVALS", "idx", "field"]);

        let copies = multiplex_command(&topo, &c);
        assert_eq!(copies.len(), 4);

        for (i, copy) in copies.iter().enumerate() {
            let key = copy.arg(1).unwrap();
            assert!(key.starts_with("idx{"), "shard {} key {}", i, key);
            let slot = topo.hash_func.slot(key);
            assert!(
                topo.shards[i].contains_slot(slot),
                "copy {} must target shard {} (slot {})",
                i,
                i,
                slot
            );
        }
    }

    #[test]
    fn test_multiplex_is_stable_for_a_snapshot() {
        let topo = topology(3);
        let c = cmd(&["_FT.INFO", "idx"]);
        let first: Vec<_> = multiplex_command(&topo, &c)
            .iter()
            .map(|m| m.args().to_vec())
            .collect();
        let second: Vec<_> = multiplex_command(&topo, &c)
            .iter()
            .map(|m| m.args().to_vec())
            .collect();
        assert_eq!(first, second, "multiplex order must be stable per snapshot");
    }
}

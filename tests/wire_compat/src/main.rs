fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use glyphcast_protocol::{Packet, TransferId, wire};
    use glyphcast_transfer::{Assembler, ProcessStatus, build, checksum};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    fn load_packets(name: &str) -> Vec<Packet> {
        serde_json::from_value(load_fixture(name))
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent comparison).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  Rust:    {reserialized}"
        );
    }

    /// Content of `transfer_300_128.json`, regenerated.
    fn transfer_content() -> Vec<u8> {
        (0..300u32).map(|i| ((i * 31 + 7) % 256) as u8).collect()
    }

    // --- Record format ---

    #[test]
    fn fixture_packet() {
        roundtrip_test::<Packet>("packet.json");
    }

    #[test]
    fn fixture_empty_packet() {
        roundtrip_test::<Packet>("empty_packet.json");
    }

    #[test]
    fn fixture_transfer() {
        roundtrip_test::<Vec<Packet>>("transfer_300_128.json");
    }

    #[test]
    fn fixture_packet_decodes_from_record() {
        let raw = fs::read_to_string(fixtures_dir().join("packet.json")).unwrap();
        let packet = wire::decode(&raw).unwrap();
        assert_eq!(packet.file_name, "report.bin");
        assert_eq!(packet.piece_index, 0);
        assert_eq!(packet.total_pieces, 3);
        assert_eq!(packet.payload.len(), 128);
    }

    // --- Checksums ---

    #[test]
    fn fixture_checksums_verify() {
        let packets = load_packets("transfer_300_128.json");
        for p in &packets {
            assert!(
                checksum::verify(&p.payload, p.payload_checksum),
                "payload checksum of piece {}",
                p.piece_index
            );
        }
        let content = fs::read(fixtures_dir().join("transfer_300_128.bin")).unwrap();
        assert_eq!(content, transfer_content());
        assert_eq!(checksum::compute(&content), packets[0].file_checksum);
    }

    #[test]
    fn fixture_empty_packet_checksums_are_zero() {
        let packet: Packet = serde_json::from_value(load_fixture("empty_packet.json")).unwrap();
        assert!(packet.payload.is_empty());
        assert_eq!(packet.payload_checksum, 0);
        assert_eq!(packet.file_checksum, 0);
    }

    // --- Builder and assembler against fixtures ---

    #[test]
    fn builder_matches_fixture() {
        let fixture = load_packets("transfer_300_128.json");
        let built = build(
            &TransferId::new("7d1f0c2a-5b3e-4f6a-9c8d-0e1f2a3b4c5d"),
            "report.bin",
            &transfer_content(),
            128,
            "M",
        )
        .unwrap();
        assert_eq!(built, fixture);
    }

    #[test]
    fn assembler_accepts_fixture_in_reverse() {
        let assembler = Assembler::new();
        let mut packets = load_packets("transfer_300_128.json");
        packets.reverse();

        let mut outcomes: Vec<_> = packets.iter().map(|p| assembler.process(p)).collect();
        let last = outcomes.pop().unwrap();
        assert!(outcomes.iter().all(|o| o.status == ProcessStatus::Accepted));
        assert_eq!(last.status, ProcessStatus::Accepted);
        let file = last.file.expect("transfer complete");
        assert_eq!(file.data, transfer_content());
        assert_eq!(file.file_name, "report.bin");
    }

    #[test]
    fn assembler_completes_empty_fixture() {
        let assembler = Assembler::new();
        let packet: Packet = serde_json::from_value(load_fixture("empty_packet.json")).unwrap();
        let outcome = assembler.process(&packet);
        assert_eq!(outcome.status, ProcessStatus::Accepted);
        assert!(outcome.file.unwrap().data.is_empty());
    }
}

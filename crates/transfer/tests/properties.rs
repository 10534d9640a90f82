//! Reassembly properties over arbitrary content, orderings and duplicates.

use glyphcast_protocol::{MAX_CHUNK_SIZE, TransferId};
use glyphcast_transfer::{Assembler, ProcessStatus, build};
use proptest::prelude::*;
use proptest::sample::Index;

fn shuffled<T: Clone>(items: &[T], picks: &[Index]) -> Vec<T> {
    let mut pool = items.to_vec();
    let mut out = Vec::with_capacity(pool.len());
    for pick in picks {
        if pool.is_empty() {
            break;
        }
        out.push(pool.remove(pick.index(pool.len())));
    }
    out.append(&mut pool);
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_order_with_duplicates_reassembles_exactly(
        content in prop::collection::vec(any::<u8>(), 0..2048),
        chunk_size in 1..=MAX_CHUNK_SIZE,
        order in prop::collection::vec(any::<Index>(), 0..64),
        dups in prop::collection::vec(any::<Index>(), 0..16),
    ) {
        let id = TransferId::new("prop");
        let packets = build(&id, "data.bin", &content, chunk_size, "M").unwrap();

        let mut stream = shuffled(&packets, &order);
        for d in &dups {
            let at = d.index(stream.len() + 1);
            let copy = packets[d.index(packets.len())].clone();
            stream.insert(at, copy);
        }

        let asm = Assembler::new();
        let mut finished = None;
        for p in &stream {
            let outcome = asm.process(p);
            prop_assert!(matches!(outcome.status, ProcessStatus::Accepted | ProcessStatus::Duplicate));
            if let Some(file) = outcome.file {
                prop_assert!(finished.is_none(), "file attached more than once");
                finished = Some(file);
            }
        }

        let file = finished.expect("transfer completed");
        prop_assert_eq!(&file.data, &content);
        prop_assert_eq!(asm.try_get_file(&id).unwrap().data.len(), content.len());
    }

    #[test]
    fn withheld_piece_is_always_reported_missing(
        content in prop::collection::vec(any::<u8>(), 1..1024),
        chunk_size in 1u32..=64,
        withheld in any::<Index>(),
    ) {
        let id = TransferId::new("withheld");
        let packets = build(&id, "data.bin", &content, chunk_size, "L").unwrap();
        let skip = withheld.index(packets.len()) as u32;

        let asm = Assembler::new();
        for p in packets.iter().filter(|p| p.piece_index != skip) {
            asm.process(p);
        }

        match asm.snapshot(&id) {
            Some(snap) => {
                prop_assert!(!snap.completed);
                prop_assert_eq!(snap.missing_pieces(), vec![skip]);
            }
            // Withholding the only piece leaves nothing to track.
            None => {
                prop_assert_eq!(packets.len(), 1);
                prop_assert!(asm.is_empty());
            }
        }
        prop_assert!(asm.try_get_file(&id).is_none());
    }

    #[test]
    fn corrupted_payload_never_sets_its_bit(
        content in prop::collection::vec(any::<u8>(), 1..512),
        chunk_size in 1u32..=32,
        victim in any::<Index>(),
        bit in 0u8..8,
        byte in any::<Index>(),
    ) {
        let id = TransferId::new("flip");
        let packets = build(&id, "data.bin", &content, chunk_size, "Q").unwrap();
        let mut bad = packets[victim.index(packets.len())].clone();
        let at = byte.index(bad.payload.len());
        bad.payload[at] ^= 1 << bit;

        let asm = Assembler::new();
        let outcome = asm.process(&bad);
        prop_assert_eq!(outcome.status, ProcessStatus::InvalidChecksum);
        prop_assert!(!outcome.snapshot.unwrap().has_piece(bad.piece_index));
    }
}

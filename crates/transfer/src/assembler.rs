use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use glyphcast_protocol::{MAX_FILE_SIZE, Packet, TransferId, expected_total_pieces};

use crate::checksum;
use crate::pieces::PieceSet;
use crate::types::{AssembledFile, ProcessOutcome, ProcessStatus, Snapshot};

type Slot = Arc<Mutex<TransferState>>;

/// Receiver-side reassembly of any number of concurrent transfers.
///
/// Each transfer lives behind its own mutex inside a concurrent map, so
/// packets for unrelated transfers never contend on a shared lock. Map
/// guards are always released before a transfer mutex is taken.
#[derive(Default)]
pub struct Assembler {
    transfers: DashMap<TransferId, Slot>,
}

impl Assembler {
    /// Creates an assembler with no known transfers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one packet and reports what happened to it.
    ///
    /// Never panics on malformed input: every rejection is a typed status.
    pub fn process(&self, packet: &Packet) -> ProcessOutcome {
        if let Err(reason) = check_structure(packet) {
            tracing::debug!(
                transfer_id = %packet.transfer_id,
                piece = packet.piece_index,
                reason,
                "rejected malformed packet"
            );
            return ProcessOutcome {
                status: ProcessStatus::InvalidMetadata,
                snapshot: self.snapshot(&packet.transfer_id),
                file: None,
            };
        }

        let Some(slot) = self.slot_for(packet) else {
            tracing::warn!(
                transfer_id = %packet.transfer_id,
                file_size = packet.file_size,
                "could not allocate transfer buffer"
            );
            return ProcessOutcome {
                status: ProcessStatus::InvalidMetadata,
                snapshot: None,
                file: None,
            };
        };

        let mut state = lock(&slot);
        if !state.matches(packet) {
            let Some(mut fresh) = TransferState::new(packet) else {
                return state.outcome(ProcessStatus::InvalidMetadata, None);
            };
            fresh.metadata_resets = state.metadata_resets + 1;
            tracing::warn!(
                transfer_id = %packet.transfer_id,
                old_name = %state.file_name,
                new_name = %packet.file_name,
                old_size = state.file_size,
                new_size = packet.file_size,
                discarded_pieces = state.pieces.count(),
                "transfer metadata changed, restarting collection"
            );
            *state = fresh;
        }
        state.accept(packet)
    }

    /// Returns a snapshot of every known transfer, ordered by id.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        let slots: Vec<Slot> = self
            .transfers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut snapshots: Vec<Snapshot> = slots.iter().map(|slot| lock(slot).snapshot()).collect();
        snapshots.sort_by(|a, b| a.transfer_id.cmp(&b.transfer_id));
        snapshots
    }

    /// Returns a snapshot of one transfer.
    pub fn snapshot(&self, transfer_id: &TransferId) -> Option<Snapshot> {
        let slot = self.slot(transfer_id)?;
        let snapshot = lock(&slot).snapshot();
        Some(snapshot)
    }

    /// Returns the finished file if the transfer completed and has not been
    /// reset since.
    pub fn try_get_file(&self, transfer_id: &TransferId) -> Option<Arc<AssembledFile>> {
        let slot = self.slot(transfer_id)?;
        let file = lock(&slot).assembled.clone();
        file
    }

    /// Clears received pieces and counters, keeping the transfer's metadata.
    ///
    /// Returns `false` if the transfer is unknown.
    pub fn reset(&self, transfer_id: &TransferId) -> bool {
        let Some(slot) = self.slot(transfer_id) else {
            return false;
        };
        lock(&slot).reset();
        tracing::info!(transfer_id = %transfer_id, "transfer reset");
        true
    }

    /// Drops all state for a transfer. Returns `false` if it was unknown.
    pub fn remove(&self, transfer_id: &TransferId) -> bool {
        let removed = self.transfers.remove(transfer_id).is_some();
        if removed {
            tracing::info!(transfer_id = %transfer_id, "transfer removed");
        }
        removed
    }

    /// Number of known transfers.
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    /// Returns `true` if no transfer is known.
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    fn slot(&self, transfer_id: &TransferId) -> Option<Slot> {
        self.transfers
            .get(transfer_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Gets the slot for the packet's transfer, creating it from the packet's
    /// metadata on first sight. Returns `None` if the buffer cannot be allocated.
    fn slot_for(&self, packet: &Packet) -> Option<Slot> {
        if let Some(slot) = self.slot(&packet.transfer_id) {
            return Some(slot);
        }
        match self.transfers.entry(packet.transfer_id.clone()) {
            Entry::Occupied(entry) => Some(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let state = TransferState::new(packet)?;
                tracing::info!(
                    transfer_id = %packet.transfer_id,
                    file_name = %packet.file_name,
                    file_size = packet.file_size,
                    total_pieces = packet.total_pieces,
                    "new transfer"
                );
                let slot = Arc::new(Mutex::new(state));
                entry.insert(Arc::clone(&slot));
                Some(slot)
            }
        }
    }
}

fn lock(slot: &Slot) -> MutexGuard<'_, TransferState> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_structure(packet: &Packet) -> Result<(), &'static str> {
    if packet.chunk_size == 0 {
        return Err("zero chunk size");
    }
    if packet.correction_tag.is_empty() {
        return Err("empty correction tag");
    }
    if packet.total_pieces == 0 {
        return Err("zero total pieces");
    }
    if packet.piece_index >= packet.total_pieces {
        return Err("piece index out of range");
    }
    if packet.file_size > MAX_FILE_SIZE {
        return Err("file size over limit");
    }
    if expected_total_pieces(packet.file_size, packet.chunk_size) != Some(packet.total_pieces) {
        return Err("total pieces inconsistent with file and chunk size");
    }
    Ok(())
}

/// Accumulating reconstruction state for one transfer.
struct TransferState {
    transfer_id: TransferId,
    file_name: String,
    file_size: u64,
    chunk_size: u32,
    correction_tag: String,
    file_checksum: u32,
    total_pieces: u32,
    buffer: Vec<u8>,
    pieces: PieceSet,
    received_bytes: u64,
    invalid_pieces: u32,
    checksum_failures: u32,
    metadata_resets: u32,
    assembled: Option<Arc<AssembledFile>>,
    last_updated: DateTime<Utc>,
}

impl TransferState {
    /// Adopts the packet's metadata. Returns `None` if the zero-filled buffer
    /// cannot be allocated.
    fn new(packet: &Packet) -> Option<Self> {
        let len = usize::try_from(packet.file_size).ok()?;
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len).ok()?;
        buffer.resize(len, 0);

        Some(Self {
            transfer_id: packet.transfer_id.clone(),
            file_name: packet.file_name.clone(),
            file_size: packet.file_size,
            chunk_size: packet.chunk_size,
            correction_tag: packet.correction_tag.clone(),
            file_checksum: packet.file_checksum,
            total_pieces: packet.total_pieces,
            buffer,
            pieces: PieceSet::new(packet.total_pieces),
            received_bytes: 0,
            invalid_pieces: 0,
            checksum_failures: 0,
            metadata_resets: 0,
            assembled: None,
            last_updated: Utc::now(),
        })
    }

    fn matches(&self, packet: &Packet) -> bool {
        self.file_name == packet.file_name
            && self.file_size == packet.file_size
            && self.chunk_size == packet.chunk_size
            && self.correction_tag == packet.correction_tag
            && self.file_checksum == packet.file_checksum
    }

    /// Runs the duplicate, checksum, bounds, commit and completion steps.
    fn accept(&mut self, packet: &Packet) -> ProcessOutcome {
        let index = packet.piece_index;
        self.last_updated = Utc::now();

        if self.pieces.contains(index) {
            tracing::trace!(transfer_id = %self.transfer_id, piece = index, "duplicate piece");
            return self.outcome(ProcessStatus::Duplicate, None);
        }

        if !checksum::verify(&packet.payload, packet.payload_checksum) {
            self.invalid_pieces += 1;
            tracing::debug!(transfer_id = %self.transfer_id, piece = index, "piece checksum mismatch");
            return self.outcome(ProcessStatus::InvalidChecksum, None);
        }

        let Some(range) = self.piece_range(index, packet.payload.len()) else {
            self.invalid_pieces += 1;
            tracing::debug!(
                transfer_id = %self.transfer_id,
                piece = index,
                len = packet.payload.len(),
                "piece length out of bounds"
            );
            return self.outcome(ProcessStatus::InvalidMetadata, None);
        };

        self.buffer[range].copy_from_slice(&packet.payload);
        self.pieces.insert(index);
        self.received_bytes += packet.payload.len() as u64;
        tracing::debug!(
            transfer_id = %self.transfer_id,
            piece = index,
            received = self.pieces.count(),
            total = self.total_pieces,
            "piece accepted"
        );

        if self.pieces.is_complete() {
            return self.complete();
        }
        self.outcome(ProcessStatus::Accepted, None)
    }

    /// Byte range the piece occupies, or `None` if its length is wrong for
    /// its position.
    fn piece_range(&self, index: u32, len: usize) -> Option<Range<usize>> {
        let start = u64::from(index) * u64::from(self.chunk_size);
        if start > self.file_size {
            return None;
        }
        let expected = if index == self.total_pieces - 1 {
            self.file_size - start
        } else {
            u64::from(self.chunk_size)
        };
        let len = len as u64;
        if len != expected {
            return None;
        }
        let end = start.checked_add(len)?;
        if end > self.file_size {
            return None;
        }
        Some(usize::try_from(start).ok()?..usize::try_from(end).ok()?)
    }

    fn complete(&mut self) -> ProcessOutcome {
        if !checksum::verify(&self.buffer, self.file_checksum) {
            self.checksum_failures += 1;
            self.clear_progress();
            tracing::warn!(
                transfer_id = %self.transfer_id,
                file_name = %self.file_name,
                failures = self.checksum_failures,
                "file checksum mismatch, discarding all pieces"
            );
            return self.outcome(ProcessStatus::InvalidFileChecksum, None);
        }

        let file = Arc::new(AssembledFile {
            transfer_id: self.transfer_id.clone(),
            file_name: self.file_name.clone(),
            file_size: self.file_size,
            chunk_size: self.chunk_size,
            correction_tag: self.correction_tag.clone(),
            file_checksum: self.file_checksum,
            data: self.buffer.clone(),
        });
        self.assembled = Some(Arc::clone(&file));
        tracing::info!(
            transfer_id = %self.transfer_id,
            file_name = %self.file_name,
            file_size = self.file_size,
            "transfer complete"
        );
        self.outcome(ProcessStatus::Accepted, Some(file))
    }

    fn clear_progress(&mut self) {
        self.pieces.clear();
        self.received_bytes = 0;
        self.assembled = None;
        self.buffer.fill(0);
    }

    fn reset(&mut self) {
        self.clear_progress();
        self.invalid_pieces = 0;
        self.checksum_failures = 0;
        self.metadata_resets = 0;
        self.last_updated = Utc::now();
    }

    fn outcome(&self, status: ProcessStatus, file: Option<Arc<AssembledFile>>) -> ProcessOutcome {
        ProcessOutcome {
            status,
            snapshot: Some(self.snapshot()),
            file,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            transfer_id: self.transfer_id.clone(),
            file_name: self.file_name.clone(),
            file_size: self.file_size,
            chunk_size: self.chunk_size,
            correction_tag: self.correction_tag.clone(),
            file_checksum: self.file_checksum,
            total_pieces: self.total_pieces,
            received_pieces: self.pieces.count(),
            received_bytes: self.received_bytes,
            invalid_pieces: self.invalid_pieces,
            checksum_failures: self.checksum_failures,
            metadata_resets: self.metadata_resets,
            completed: self.assembled.is_some(),
            last_updated: self.last_updated,
            pieces: self.pieces.clone(),
        }
    }
}

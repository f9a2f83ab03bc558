//! Command journal adapters.
//!
//! `InMemoryJournal` keeps records in a vector. `FileJournal` appends each
//! record to a file as `[len:u32 LE][bincode record]` and syncs before
//! returning. A failed append is truncated away before the error is returned;
//! a frame cut short by a crash is dropped on open.

use crate::errors::JournalError;
use crate::ports::outbound::{CommandJournal, JournalRecord};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const FRAME_HEADER: usize = 4;

/// Commands take consecutive sequence numbers; an abort or settlement must
/// name a command that is already journaled.
fn validate(next_seq: u64, record: &JournalRecord) -> Result<(), JournalError> {
    match record {
        JournalRecord::Command { seq, .. } if *seq != next_seq => Err(JournalError::SequenceGap {
            expected: next_seq,
            got: *seq,
        }),
        JournalRecord::Abort { seq, .. } | JournalRecord::Settled { seq }
            if *seq >= next_seq =>
        {
            Err(JournalError::SequenceGap {
                expected: next_seq.saturating_sub(1),
                got: *seq,
            })
        }
        _ => Ok(()),
    }
}

fn advance(next_seq: &mut u64, record: &JournalRecord) {
    if let JournalRecord::Command { seq, .. } = record {
        *next_seq = seq + 1;
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Journal held in memory. Lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    records: Vec<JournalRecord>,
    next_seq: u64,
}

impl InMemoryJournal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing was appended.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CommandJournal for InMemoryJournal {
    fn append(&mut self, record: JournalRecord) -> Result<(), JournalError> {
        validate(self.next_seq, &record)?;
        advance(&mut self.next_seq, &record);
        self.records.push(record);
        Ok(())
    }

    fn records(&self) -> Result<Vec<JournalRecord>, JournalError> {
        Ok(self.records.clone())
    }

    fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

// =============================================================================
// FILE-BACKED
// =============================================================================

/// Append-only journal file.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    file: File,
    records: Vec<JournalRecord>,
    next_seq: u64,
    /// Set when a failed append could not be rolled back.
    poisoned: bool,
    #[cfg(test)]
    short_write: Option<usize>,
}

impl FileJournal {
    /// Open or create the journal at `path`, loading every complete frame.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let (records, valid_len) = Self::decode_frames(&bytes)?;

        if valid_len < bytes.len() {
            warn!(
                path = %path.display(),
                dropped = bytes.len() - valid_len,
                "journal ends in a partial frame, truncating"
            );
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
        }

        let mut next_seq = 0;
        for record in &records {
            validate(next_seq, record)?;
            advance(&mut next_seq, record);
        }

        info!(
            path = %path.display(),
            records = records.len(),
            next_seq,
            "journal opened"
        );

        Ok(Self {
            path,
            file,
            records,
            next_seq,
            poisoned: false,
            #[cfg(test)]
            short_write: None,
        })
    }

    /// Location on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode complete frames. Returns the records and the byte length they
    /// cover; anything past that is a partial frame.
    fn decode_frames(bytes: &[u8]) -> Result<(Vec<JournalRecord>, usize), JournalError> {
        let mut records = Vec::new();
        let mut cursor = 0;

        while cursor + FRAME_HEADER <= bytes.len() {
            let mut header = [0u8; FRAME_HEADER];
            header.copy_from_slice(&bytes[cursor..cursor + FRAME_HEADER]);
            let len = u32::from_le_bytes(header) as usize;

            let start = cursor + FRAME_HEADER;
            if start + len > bytes.len() {
                break;
            }
            records.push(bincode::deserialize(&bytes[start..start + len])?);
            cursor = start + len;
        }

        Ok((records, cursor))
    }

    fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        #[cfg(test)]
        if let Some(n) = self.short_write.take() {
            self.file.write_all(&frame[..n.min(frame.len())])?;
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "short write",
            ));
        }
        self.file.write_all(frame)?;
        self.file.sync_all()
    }

    /// Cut the file back to `len` bytes, dropping a partly written frame.
    fn roll_back(&mut self, len: u64) -> std::io::Result<()> {
        self.file.set_len(len)?;
        self.file.sync_all()
    }

    fn encode_frame(record: &JournalRecord) -> Result<Vec<u8>, JournalError> {
        let body = bincode::serialize(record)?;
        let len = u32::try_from(body.len())
            .map_err(|_| JournalError::Codec(format!("record of {} bytes", body.len())))?;

        let mut frame = Vec::with_capacity(FRAME_HEADER + body.len());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

impl CommandJournal for FileJournal {
    fn append(&mut self, record: JournalRecord) -> Result<(), JournalError> {
        if self.poisoned {
            return Err(JournalError::Poisoned(self.path.display().to_string()));
        }
        validate(self.next_seq, &record)?;
        let frame = Self::encode_frame(&record)?;

        let committed = self.file.metadata()?.len();
        if let Err(e) = self.write_frame(&frame) {
            warn!(seq = record.seq(), error = %e, "journal append failed, rolling back");
            if let Err(rollback) = self.roll_back(committed) {
                self.poisoned = true;
                error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "journal rollback failed, refusing further appends"
                );
            }
            return Err(e.into());
        }

        debug!(seq = record.seq(), bytes = frame.len(), "journal record appended");
        advance(&mut self.next_seq, &record);
        self.records.push(record);
        Ok(())
    }

    fn records(&self) -> Result<Vec<JournalRecord>, JournalError> {
        Ok(self.records.clone())
    }

    fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

impl CommandJournal for Box<dyn CommandJournal> {
    fn append(&mut self, record: JournalRecord) -> Result<(), JournalError> {
        (**self).append(record)
    }

    fn records(&self) -> Result<Vec<JournalRecord>, JournalError> {
        (**self).records()
    }

    fn next_seq(&self) -> u64 {
        (**self).next_seq()
    }
}

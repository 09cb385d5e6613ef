//! Chain Walker
//!
//! Sequential traversal from the head pointer.
//!
//! ## States
//! ```text
//! AtHead ──(head = -1)──────────────────────────────► Done
//! AtHead ──(head = h)──► AtRecord(h)
//! AtRecord(o) ──(next valid, unvisited, in bounds)──► AtRecord(next)
//! AtRecord(o) ──(sentinel | unreadable | undecodable |
//!                visited | self-reference | limit)──► Done
//! ```
//!
//! Corruption never surfaces as an error: the walk ends and the reason is
//! kept in [`ChainWalker::stop`]. Only I/O failures and missing tables are
//! yielded as `Err`.

use std::collections::HashSet;
use std::fmt;

use crate::error::{Result, SeqFileError};
use crate::record::Record;

use super::{ChainManager, Table};

/// Why a walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStop {
    /// Reached the sentinel
    End,
    /// Range scan passed its upper bound
    PastMaxKey,
    /// A record points at itself
    SelfReference { offset: u64 },
    /// A pointer leads back to an already visited record
    Cycle { offset: u64 },
    /// A pointer is negative or outside the record area
    CorruptPointer { offset: u64, pointer: i64 },
    /// A record runs past the end of the file
    Truncated { offset: u64, needed: usize, available: usize },
    /// A pointer leads to bytes that are not a record of this schema
    BadRecord { offset: u64 },
    /// The walk hit the configured maximum length
    IterationLimit { limit: usize },
}

impl ScanStop {
    /// True if the walk ended normally
    pub fn is_clean(&self) -> bool {
        matches!(self, ScanStop::End | ScanStop::PastMaxKey)
    }
}

impl fmt::Display for ScanStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStop::End => write!(f, "end of chain"),
            ScanStop::PastMaxKey => write!(f, "past upper key bound"),
            ScanStop::SelfReference { offset } => {
                write!(f, "record at {} points to itself", offset)
            }
            ScanStop::Cycle { offset } => write!(f, "cycle back to offset {}", offset),
            ScanStop::CorruptPointer { offset, pointer } => {
                write!(f, "corrupt pointer {} at offset {}", pointer, offset)
            }
            ScanStop::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "record at {} truncated ({} of {} bytes)",
                offset, available, needed
            ),
            ScanStop::BadRecord { offset } => write!(f, "no valid record at offset {}", offset),
            ScanStop::IterationLimit { limit } => {
                write!(f, "stopped after {} records", limit)
            }
        }
    }
}

/// A record together with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    pub offset: u64,
    pub record: Record,
}

impl ChainEntry {
    pub fn key(&self) -> Option<&str> {
        self.record.key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    AtHead,
    AtRecord(u64),
    Done,
}

/// Iterator over the chain in key order
pub struct ChainWalker<'a> {
    chain: &'a ChainManager,
    table: &'a Table,
    state: WalkState,
    /// File length when the walk started
    file_len: u64,
    visited: HashSet<u64>,
    steps: usize,
    /// Offset of the last record read successfully
    last_good: Option<u64>,
    stop: Option<ScanStop>,
}

impl<'a> ChainWalker<'a> {
    pub(super) fn new(chain: &'a ChainManager, table: &'a Table) -> Result<Self> {
        let file_len = chain.store().file_len(table.name())?;
        Ok(Self {
            chain,
            table,
            state: WalkState::AtHead,
            file_len,
            visited: HashSet::new(),
            steps: 0,
            last_good: None,
            stop: None,
        })
    }

    /// Why the walk ended; `None` while it is still running
    pub fn stop(&self) -> Option<&ScanStop> {
        self.stop.as_ref()
    }

    /// Offset of the last record the walk read successfully
    pub fn last_good(&self) -> Option<u64> {
        self.last_good
    }

    /// Records yielded so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn finish(&mut self, stop: ScanStop) {
        if !stop.is_clean() {
            tracing::warn!(table = %self.table.name(), reason = %stop, "chain walk cut short");
        }
        self.state = WalkState::Done;
        self.stop = Some(stop);
    }

    /// Reject a link that revisits a record or leaves the record area
    fn check_link(&mut self, offset: u64) -> Result<()> {
        if !self.visited.insert(offset) {
            return Err(SeqFileError::CycleDetected { offset });
        }
        if offset < self.chain.first_record_offset() || offset >= self.file_len {
            return Err(SeqFileError::CorruptPointer {
                offset: self.last_good.unwrap_or(0),
                pointer: offset as i64,
            });
        }
        Ok(())
    }

    fn visit(&mut self, offset: u64) -> Option<Result<ChainEntry>> {
        if self.steps >= self.chain.max_chain_length() {
            self.finish(ScanStop::IterationLimit {
                limit: self.chain.max_chain_length(),
            });
            return None;
        }

        let read = self
            .check_link(offset)
            .and_then(|()| self.chain.read_record(self.table, offset, self.file_len));
        match read {
            Ok(record) => {
                self.steps += 1;
                self.last_good = Some(offset);
                match record.next() {
                    None => self.finish(ScanStop::End),
                    Some(next) if next == offset => {
                        self.finish(ScanStop::SelfReference { offset })
                    }
                    Some(next) => self.state = WalkState::AtRecord(next),
                }
                tracing::trace!(offset, next = ?record.next(), "visited record");
                Some(Ok(ChainEntry { offset, record }))
            }
            Err(e) => match stop_for(offset, &e) {
                Some(stop) => {
                    self.finish(stop);
                    None
                }
                None => {
                    self.state = WalkState::Done;
                    Some(Err(e))
                }
            },
        }
    }
}

/// Stop reason for a corruption error met at `offset`
fn stop_for(offset: u64, error: &SeqFileError) -> Option<ScanStop> {
    match *error {
        SeqFileError::CycleDetected { offset } => Some(ScanStop::Cycle { offset }),
        SeqFileError::CorruptPointer { offset, pointer } => {
            Some(ScanStop::CorruptPointer { offset, pointer })
        }
        SeqFileError::TruncatedRecord { needed, available } => Some(ScanStop::Truncated {
            offset,
            needed,
            available,
        }),
        SeqFileError::CorruptRecord { offset, .. } => Some(ScanStop::BadRecord { offset }),
        _ => None,
    }
}

impl Iterator for ChainWalker<'_> {
    type Item = Result<ChainEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            WalkState::Done => None,
            WalkState::AtHead => match self.chain.head(self.table) {
                Ok(None) => {
                    self.finish(ScanStop::End);
                    None
                }
                Ok(Some(head)) => self.visit(head),
                Err(SeqFileError::CorruptPointer { pointer, .. }) => {
                    self.finish(ScanStop::CorruptPointer { offset: 0, pointer });
                    None
                }
                Err(e) => {
                    self.state = WalkState::Done;
                    Some(Err(e))
                }
            },
            WalkState::AtRecord(offset) => self.visit(offset),
        }
    }
}

impl ChainManager {
    /// Start a walk from the head pointer
    pub fn walk<'a>(&'a self, table: &'a Table) -> Result<ChainWalker<'a>> {
        ChainWalker::new(self, table)
    }
}

//! On-disk layout of the MBR and of the extended boot records chained behind it.

use binrw::io::Cursor;
use binrw::{BinRead, BinWrite, binrw};

use arc_types::{Error, Result};

use crate::config::{MBR_SIGNATURE, MBR_SIZE, MBR_TABLE_OFFSET};

/// One 16-byte slot of a partition table.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionEntry {
    /// 0x80 marks the boot partition
    pub active: u8,
    /// CHS addresses are not used; LBA fields are authoritative
    pub start_chs: [u8; 3],
    pub kind: u8,
    pub end_chs: [u8; 3],
    /// Relative to the record holding this entry (or to the first link, for chained links)
    pub start: u32,
    pub count: u32,
}

impl PartitionEntry {
    pub const FREE: u8 = 0x00;
    /// CHS-addressed extended partition
    pub const EXTENDED: u8 = 0x05;
    /// LBA-addressed extended partition
    pub const EXTENDED_LBA: u8 = 0x0F;

    pub fn new(kind: u8, start: u32, count: u32) -> Self {
        Self {
            kind,
            start,
            count,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.kind == Self::FREE
    }

    #[inline]
    pub fn is_extended(&self) -> bool {
        matches!(self.kind, Self::EXTENDED | Self::EXTENDED_LBA)
    }
}

/// The partition table and signature that close every MBR-style record.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionTable {
    pub entries: [PartitionEntry; 4],
    pub signature: u16,
}

impl PartitionTable {
    pub fn new(entries: [PartitionEntry; 4]) -> Self {
        Self {
            entries,
            signature: MBR_SIGNATURE,
        }
    }

    /// Parses the table out of a whole 512-byte record.
    ///
    /// A short record or a missing `0xAA55` signature is [`Error::BadFile`].
    pub fn parse(record: &[u8]) -> Result<Self> {
        let tail = record
            .get(MBR_TABLE_OFFSET..MBR_SIZE)
            .ok_or(Error::BadFile)?;
        let table = Self::read(&mut Cursor::new(tail)).map_err(|e| {
            log::error!("malformed partition table: {e}");
            Error::BadFile
        })?;

        if table.signature != MBR_SIGNATURE {
            log::debug!("partition record signature {:#06x}", table.signature);
            return Err(Error::BadFile);
        }

        Ok(table)
    }

    /// Writes the table and signature into a 512-byte record, leaving the boot code alone.
    pub fn write_into(&self, record: &mut [u8]) -> Result<()> {
        let tail = record
            .get_mut(MBR_TABLE_OFFSET..MBR_SIZE)
            .ok_or(Error::Invalid)?;
        self.write(&mut Cursor::new(tail))
            .map_err(|_| Error::Invalid)
    }

    /// First extended entry, which continues the chain
    pub fn extended(&self) -> Option<&PartitionEntry> {
        self.entries.iter().find(|entry| entry.is_extended())
    }
}

//! # Partition resolver
//!
//! Numbers MBR partitions the way ARC does: primary entries first, in table order, then the
//! logical partitions found by following the extended chain. Extended entries themselves are
//! never numbered.

mod layout;

use arc_types::{Error, Result, SeekMode};

use crate::config::{MAX_CHAIN_LINKS, MBR_SIZE};
use crate::{Handle, Runtime};

pub use self::layout::{PartitionEntry, PartitionTable};

/// A run of sectors on a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent {
    pub start: u64,
    pub count: u64,
}

impl Extent {
    pub const fn new(start: u64, count: u64) -> Self {
        Self { start, count }
    }

    /// One past the last sector; `None` on overflow.
    pub fn end(&self) -> Option<u64> {
        self.start.checked_add(self.count)
    }
}

impl Runtime {
    /// Absolute extent of partition `number` (1-based) on the open whole-disk `device`.
    ///
    /// Records are read through the handle itself, so `device` must be readable and must
    /// address the whole disk. The position of `device` is left as it was.
    pub fn resolve_partition(
        &mut self,
        device: Handle,
        number: u32,
        sector_size: usize,
    ) -> Result<Extent> {
        if number == 0 {
            return Err(Error::NoDevice);
        }

        self.keeping_position(device, |rt| rt.find_partition(device, number, sector_size))
    }

    fn find_partition(
        &mut self,
        device: Handle,
        number: u32,
        sector_size: usize,
    ) -> Result<Extent> {
        let mut found = 0;
        let mut offset = 0u64;
        for _ in 0..MAX_CHAIN_LINKS {
            let table = self.partition_record(device, offset, sector_size)?;

            for entry in table.entries.iter().filter(|entry| !entry.is_free()) {
                if entry.is_extended() {
                    continue;
                }
                found += 1;
                if found == number {
                    let extent = Extent::new(offset + u64::from(entry.start), u64::from(entry.count));
                    log::debug!("partition({number}) of {device} is {extent:?}");
                    return Ok(extent);
                }
            }

            match table.extended() {
                Some(link) if link.count > 0 => offset += u64::from(link.start),
                _ => return Err(Error::NoDevice),
            }
        }

        log::warn!("extended chain of {device} exceeds {MAX_CHAIN_LINKS} links");
        Err(Error::NoDevice)
    }

    /// Numbered partitions on the open whole-disk `device`.
    ///
    /// Stops at the first link that cannot be read or parsed and returns what it found so far.
    /// The position of `device` is left as it was.
    pub fn count_partitions(&mut self, device: Handle) -> Result<u32> {
        let sector_size = self.table().opened(device)?.deblocker()?.sector_size();
        self.keeping_position(device, |rt| Ok(rt.tally_partitions(device, sector_size)))
    }

    fn tally_partitions(&mut self, device: Handle, sector_size: usize) -> u32 {
        let mut found = 0;
        let mut offset = 0u64;
        for _ in 0..MAX_CHAIN_LINKS {
            let Ok(table) = self.partition_record(device, offset, sector_size) else {
                break;
            };

            found += table
                .entries
                .iter()
                .filter(|entry| !entry.is_free() && !entry.is_extended())
                .count() as u32;

            match table.extended() {
                Some(link) if link.count > 0 => offset += u64::from(link.start),
                _ => break,
            }
        }

        found
    }

    /// Runs `walk` and puts the position of `device` back afterwards, whatever the outcome.
    ///
    /// A whole-disk open shares its handle with every other read-capable open of the disk, so
    /// the walk may be seeking on a handle its caller is in the middle of using.
    fn keeping_position<T>(
        &mut self,
        device: Handle,
        walk: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = self.table.opened(device)?.position();
        let result = walk(self);
        if let Ok(entry) = self.table.opened_mut(device) {
            entry.set_position(saved);
        }
        result
    }

    /// Reads and parses the record at sector `lba` of `device`.
    fn partition_record(
        &mut self,
        device: Handle,
        lba: u64,
        sector_size: usize,
    ) -> Result<PartitionTable> {
        let offset = lba
            .checked_mul(sector_size as u64)
            .and_then(|offset| i64::try_from(offset).ok())
            .ok_or(Error::TooBig)?;
        self.seek(device, offset, SeekMode::Absolute)?;

        let mut record = [0u8; MBR_SIZE];
        let read = self.read(device, &mut record)?;
        if read != MBR_SIZE {
            log::error!("short read of partition record at sector {lba}: {read} bytes");
            return Err(Error::Io);
        }

        PartitionTable::parse(&record)
    }
}

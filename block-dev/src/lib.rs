//! # Sector transfer layer
//!
//! A block device only moves whole, aligned sectors, and never more than
//! [`BlockDevice::max_transfer`] of them per call. USB mass storage, IDE drives and
//! disk images all sit behind [`BlockDevice`]; byte addressing is built on top of it.

#![no_std]

extern crate alloc;

mod ramdisk;

use core::fmt::Debug;

use arc_types::Result;

pub use self::ramdisk::RamDisk;

/// The sector primitive of one physical device.
///
/// Sector numbers are absolute on the device. `buf.len()` must be a non-zero multiple of
/// [`BlockDevice::sector_size`], and the sector count it implies must not exceed
/// [`BlockDevice::max_transfer`].
pub trait BlockDevice: Debug {
    /// Bytes per sector, e.g. 512 for disks or 2048 for optical media
    fn sector_size(&self) -> usize;

    fn sector_count(&self) -> u64;

    /// Maximum number of sectors a single transfer may move
    fn max_transfer(&self) -> u32;

    fn read_only(&self) -> bool {
        false
    }

    fn read_sectors(&self, sector: u64, buf: &mut [u8]) -> Result<()>;

    fn write_sectors(&self, sector: u64, buf: &[u8]) -> Result<()>;
}

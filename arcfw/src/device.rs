//! Raw disks and partitions, served by the deblocker.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use arc_types::{Error, FileInformation, OpenMode, Result, SeekMode};
use block_dev::BlockDevice;

use crate::deblock::Deblocker;
use crate::ops::{DeviceTree, FileOps};
use crate::partition::Extent;
use crate::path::ArcPath;
use crate::table::Backend;
use crate::{Handle, Runtime};

/// Vectors of one physical disk; every partition path of the disk shares them.
#[derive(Debug, Clone)]
pub struct RawBlockDevice {
    device: Rc<dyn BlockDevice>,
}

impl RawBlockDevice {
    pub fn new(device: Rc<dyn BlockDevice>) -> Self {
        Self { device }
    }

    /// The sector window `path` addresses: the whole disk for no partition or
    /// `partition(0)`, else the extent read from the partition tables.
    fn window(&self, rt: &mut Runtime, path: &str) -> Result<Extent> {
        let whole = Extent::new(0, self.device.sector_count());
        let number = match path.partition()? {
            None | Some(0) => return Ok(whole),
            Some(number) => number,
        };

        let disk = rt.open(&path.with_partition(0)?, OpenMode::ReadOnly)?;
        let resolved = rt.resolve_partition(disk, number, self.device.sector_size());
        let closed = rt.close(disk);

        let extent = resolved?;
        closed?;
        Ok(extent)
    }
}

impl FileOps for RawBlockDevice {
    fn open(&self, rt: &mut Runtime, handle: Handle, path: &str, mode: OpenMode) -> Result<()> {
        if mode.is_directory() {
            return Err(Error::NotDirectory);
        }
        if mode.creates() {
            return Err(Error::AccessDenied);
        }
        if mode.writable() && self.device.read_only() {
            return Err(Error::ReadOnly);
        }

        let window = self.window(rt, path)?;
        let deblocker = Deblocker::new(Rc::clone(&self.device), window)?;
        log::debug!(
            "{path}: sectors {}..{} of {} bytes, {} per transfer",
            window.start,
            window.start + window.count,
            deblocker.sector_size(),
            deblocker.max_transfer(),
        );

        rt.table_mut()
            .constructing_mut(handle)?
            .set_backend(Backend::Block(deblocker));
        Ok(())
    }

    fn read(&self, rt: &mut Runtime, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        let (deblocker, position) = rt.table_mut().opened_mut(handle)?.block_mut()?;
        deblocker.read(position, buf)
    }

    fn write(&self, rt: &mut Runtime, handle: Handle, buf: &[u8]) -> Result<usize> {
        let (deblocker, position) = rt.table_mut().opened_mut(handle)?.block_mut()?;
        deblocker.write(position, buf)
    }

    fn seek(&self, rt: &mut Runtime, handle: Handle, offset: i64, mode: SeekMode) -> Result<()> {
        let (deblocker, position) = rt.table_mut().opened_mut(handle)?.block_mut()?;
        deblocker.seek(position, offset, mode)
    }

    fn get_read_status(&self, rt: &mut Runtime, handle: Handle) -> Result<()> {
        let entry = rt.table().opened(handle)?;
        entry.deblocker()?.read_status(entry.position())
    }

    fn get_file_information(&self, rt: &mut Runtime, handle: Handle) -> Result<FileInformation> {
        let entry = rt.table().opened(handle)?;
        Ok(entry.deblocker()?.information(entry.position()))
    }
}

/// The device tree of a machine whose disks are all [`BlockDevice`]s.
///
/// Disks are keyed by their canonical path without the partition component, so
/// `scsi(0)disk(0)rdisk(0)` also serves `scsi(0)disk(0)rdisk(0)partition(2)`.
#[derive(Debug, Default)]
pub struct DeviceMap {
    disks: Vec<(String, Rc<RawBlockDevice>)>,
}

impl DeviceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a disk under `path`, replacing any disk already there.
    pub fn insert(&mut self, path: &str, device: Rc<dyn BlockDevice>) -> Result<()> {
        let key = path.canonicalize().disk_path()?;
        let raw = Rc::new(RawBlockDevice::new(device));

        match self.disks.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = raw,
            None => self.disks.push((key, raw)),
        }
        Ok(())
    }
}

impl DeviceTree for DeviceMap {
    fn lookup(&self, path: &str) -> Option<Rc<dyn FileOps>> {
        let key = path.disk_path().ok()?;
        self.disks
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, raw)| Rc::clone(raw) as Rc<dyn FileOps>)
    }
}

//! # Operation vectors
//!
//! Every open handle dispatches through one [`FileOps`] implementation. Raw disks and
//! partitions use [`RawBlockDevice`](crate::RawBlockDevice); files inside a volume use the
//! vectors a [`FileSystem`] hands out when it is mounted over a device.
//!
//! All operations get the whole [`Runtime`], so a backend can open, read or seek other
//! handles while it serves a request (a partition resolves its window through a whole-disk
//! handle, a filesystem reads its volume through the device handle).

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt::Debug;

use arc_types::{
    DirEntry, Error, FileAttribute, FileInformation, MountOperation, OpenMode, Result, SeekMode,
};
use enumflags2::BitFlags;

use crate::{Handle, Runtime};

pub trait FileOps: Debug {
    /// Fills in the backend context of `handle`, which is still under construction.
    ///
    /// The runtime marks the slot open only after this returns `Ok`.
    fn open(&self, rt: &mut Runtime, handle: Handle, path: &str, mode: OpenMode) -> Result<()>;

    #[allow(unused_variables)]
    fn close(&self, rt: &mut Runtime, handle: Handle) -> Result<()> {
        Ok(())
    }

    /// Loads or unloads removable media.
    #[allow(unused_variables)]
    fn mount(&self, path: &str, operation: MountOperation) -> Result<()> {
        Err(Error::Invalid)
    }

    /// Called on filesystem vectors when the device they were mounted over is released.
    #[allow(unused_variables)]
    fn unmount(&self, rt: &mut Runtime, device: Handle) -> Result<()> {
        Ok(())
    }

    #[allow(unused_variables)]
    fn read(&self, rt: &mut Runtime, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        Err(Error::Invalid)
    }

    #[allow(unused_variables)]
    fn write(&self, rt: &mut Runtime, handle: Handle, buf: &[u8]) -> Result<usize> {
        Err(Error::Invalid)
    }

    #[allow(unused_variables)]
    fn seek(&self, rt: &mut Runtime, handle: Handle, offset: i64, mode: SeekMode) -> Result<()> {
        Err(Error::Invalid)
    }

    /// `Ok` if a read would return data, [`Error::Again`] at the end of the medium.
    #[allow(unused_variables)]
    fn get_read_status(&self, rt: &mut Runtime, handle: Handle) -> Result<()> {
        Err(Error::Invalid)
    }

    #[allow(unused_variables)]
    fn get_file_information(&self, rt: &mut Runtime, handle: Handle) -> Result<FileInformation> {
        Err(Error::Invalid)
    }

    /// Sets the attributes selected by `mask` to their value in `attributes`.
    #[allow(unused_variables)]
    fn set_file_information(
        &self,
        rt: &mut Runtime,
        handle: Handle,
        attributes: BitFlags<FileAttribute>,
        mask: BitFlags<FileAttribute>,
    ) -> Result<()> {
        Err(Error::AccessDenied)
    }

    /// Returns up to `count` entries following the handle's cursor; empty at the end.
    #[allow(unused_variables)]
    fn get_directory_entry(
        &self,
        rt: &mut Runtime,
        handle: Handle,
        count: usize,
    ) -> Result<Vec<DirEntry>> {
        Err(Error::NotDirectory)
    }
}

/// A filesystem collaborator that can be layered over an open device.
pub trait FileSystem: Debug {
    fn name(&self) -> &str;

    /// Probes the volume behind `device` and returns the vectors for files on it.
    ///
    /// The device is open and readable; the probe reads it through the runtime.
    fn mount(&self, rt: &mut Runtime, device: Handle) -> Result<Rc<dyn FileOps>>;
}

/// The device-tree collaborator: maps a canonical device path to its vectors.
pub trait DeviceTree: Debug {
    fn lookup(&self, path: &str) -> Option<Rc<dyn FileOps>>;
}

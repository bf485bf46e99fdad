//! # Runtime context
//!
//! [`Runtime`] owns the file table (and with it the device registry), the device tree and the
//! filesystems that may be layered over devices. It exposes the ARC I/O calls by handle.
//!
//! ## Open, step by step
//!
//! 1. The path is canonicalized and split into its device and file portions.
//! 2. The device portion goes through the registry, which reuses a matching open device or
//!    asks the device tree for vectors and opens a new one.
//! 3. With a file portion, a filesystem is mounted over the device (once per device) and opens
//!    the file into a slot of its own.
//!
//! Any failure along the way gives back every slot and reference taken so far.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use arc_types::{
    DirEntry, Error, FileAttribute, FileInformation, MountOperation, OpenMode, Result, SeekMode,
};
use enumflags2::BitFlags;

use crate::ops::{DeviceTree, FileOps, FileSystem};
use crate::path::ArcPath;
use crate::table::{EntryFlag, FileEntry, FileTable};
use crate::Handle;

#[derive(Debug)]
pub struct Runtime {
    pub(crate) table: FileTable,
    pub(crate) devices: Box<dyn DeviceTree>,
    filesystems: Vec<Rc<dyn FileSystem>>,
}

impl Runtime {
    pub fn new(devices: impl DeviceTree + 'static) -> Self {
        Self {
            table: FileTable::new(),
            devices: Box::new(devices),
            filesystems: Vec::new(),
        }
    }

    /// Filesystems are probed in registration order when a file is opened on a device.
    pub fn register_filesystem(&mut self, fs: impl FileSystem + 'static) {
        log::debug!("filesystem {} registered", fs.name());
        self.filesystems.push(Rc::new(fs));
    }

    #[inline]
    pub fn table(&self) -> &FileTable {
        &self.table
    }

    #[inline]
    pub fn table_mut(&mut self) -> &mut FileTable {
        &mut self.table
    }

    pub fn open(&mut self, path: &str, mode: OpenMode) -> Result<Handle> {
        let canonical = path.canonicalize();
        let (device, file) = canonical.split_device();
        if device.components()?.is_empty() {
            return Err(Error::NoDevice);
        }

        match file {
            None => self.open_device(device, mode),
            Some(file) => {
                let device_mode = if mode.writable() {
                    OpenMode::ReadWrite
                } else {
                    OpenMode::ReadOnly
                };
                let device = self.open_device(device, device_mode)?;
                self.open_file(device, file, mode).inspect_err(|_| {
                    if let Err(e) = self.close_device(device) {
                        log::warn!("{device}: release after failed open: {e}");
                    }
                })
            }
        }
    }

    /// Opens `file` on the open device `device` through the filesystem mounted over it.
    fn open_file(&mut self, device: Handle, file: &str, mode: OpenMode) -> Result<Handle> {
        let fs = self.mount_filesystem(device)?;

        let handle = self
            .table
            .reserve(FileEntry::file(device, mode, Rc::clone(&fs)))?;
        if let Err(e) = fs.open(self, handle, file, mode) {
            log::debug!("{file} on {device}: {e}");
            self.table.free(handle);
            return Err(e);
        }

        self.table.constructing_mut(handle)?.mark_open();
        log::debug!("{file} on {device}: opened as {handle}");
        Ok(handle)
    }

    /// The filesystem vectors of `device`, probing the registered filesystems on first use.
    fn mount_filesystem(&mut self, device: Handle) -> Result<Rc<dyn FileOps>> {
        if let Some(mounted) = self.table.opened(device)?.mounted() {
            return Ok(mounted);
        }

        for fs in self.filesystems.clone() {
            match fs.mount(self, device) {
                Ok(ops) => {
                    self.table.opened_mut(device)?.set_mount(Rc::clone(&ops))?;
                    log::debug!("{device}: mounted {}", fs.name());
                    return Ok(ops);
                }
                Err(e) => log::trace!("{device}: not {}: {e}", fs.name()),
            }
        }

        log::debug!("{device}: no filesystem recognizes the volume");
        Err(Error::BadFile)
    }

    /// Closes a file, or drops one reference to a device.
    ///
    /// A device whose only remaining references belong to files layered over it cannot be
    /// closed directly: [`Error::Busy`].
    pub fn close(&mut self, handle: Handle) -> Result<()> {
        let entry = self.table.opened(handle)?;
        let Some(parent) = entry.parent() else {
            if entry.refs() <= self.table.dependents(handle) {
                return Err(Error::Busy);
            }
            return self.close_device(handle);
        };

        let ops = entry.ops();
        let closed = ops.close(self, handle);
        self.table.free(handle);
        log::debug!("{handle}: closed");

        let released = self.close_device(parent);
        closed.and(released)
    }

    /// Loads or unloads the media of a removable device; needs no open handle.
    pub fn mount(&mut self, path: &str, operation: MountOperation) -> Result<()> {
        let canonical = path.canonicalize();
        let (device, _) = canonical.split_device();
        let ops = self.devices.lookup(device).ok_or(Error::NoDevice)?;
        ops.mount(device, operation)
    }

    pub fn read(&mut self, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        let ops = self.table.permitted(handle, EntryFlag::Read)?.ops();
        ops.read(self, handle, buf)
    }

    pub fn write(&mut self, handle: Handle, buf: &[u8]) -> Result<usize> {
        let ops = self.table.permitted(handle, EntryFlag::Write)?.ops();
        ops.write(self, handle, buf)
    }

    pub fn seek(&mut self, handle: Handle, offset: i64, mode: SeekMode) -> Result<()> {
        let ops = self.table.opened(handle)?.ops();
        ops.seek(self, handle, offset, mode)
    }

    pub fn get_read_status(&mut self, handle: Handle) -> Result<()> {
        let ops = self.table.opened(handle)?.ops();
        ops.get_read_status(self, handle)
    }

    pub fn get_file_information(&mut self, handle: Handle) -> Result<FileInformation> {
        let ops = self.table.opened(handle)?.ops();
        ops.get_file_information(self, handle)
    }

    pub fn set_file_information(
        &mut self,
        handle: Handle,
        attributes: BitFlags<FileAttribute>,
        mask: BitFlags<FileAttribute>,
    ) -> Result<()> {
        let ops = self.table.opened(handle)?.ops();
        ops.set_file_information(self, handle, attributes, mask)
    }

    pub fn get_directory_entry(&mut self, handle: Handle, count: usize) -> Result<Vec<DirEntry>> {
        let ops = self.table.opened(handle)?.ops();
        ops.get_directory_entry(self, handle, count)
    }

    /// Closes every open handle: files first, then each device until its last reference.
    pub fn shutdown(&mut self) {
        let files: Vec<Handle> = self
            .table
            .handles()
            .filter(|&handle| {
                self.table
                    .opened(handle)
                    .is_ok_and(|entry| entry.parent().is_some())
            })
            .collect();
        for handle in files {
            if let Err(e) = self.close(handle) {
                log::warn!("{handle}: close on shutdown: {e}");
            }
        }

        let devices: Vec<Handle> = self.table.handles().collect();
        for handle in devices {
            while self.table.opened(handle).is_ok() {
                if let Err(e) = self.close_device(handle) {
                    log::warn!("{handle}: release on shutdown: {e}");
                    break;
                }
            }
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

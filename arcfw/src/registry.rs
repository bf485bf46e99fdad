//! # Device registry
//!
//! Each canonical device path is opened once per permission set; later opens of the same
//! path share the slot and bump its reference count. Matching is by exact path string, not by
//! hardware identity: `disk(0)` and `disk(0)partition(0)` are two devices to the registry.

use alloc::rc::Rc;

use arc_types::{Error, OpenMode, Result};

use crate::table::FileEntry;
use crate::{Handle, Runtime};

impl Runtime {
    /// Opens the device named by the canonical device path `path`.
    pub(crate) fn open_device(&mut self, path: &str, mode: OpenMode) -> Result<Handle> {
        if let Some(handle) = self.table.find_device(path, mode) {
            let refs = self.table.opened_mut(handle)?.acquire()?;
            log::debug!("{path}: shared as {handle}, {refs} refs");
            return Ok(handle);
        }

        let Some(ops) = self.devices.lookup(path) else {
            log::debug!("{path}: no such device");
            return Err(Error::NoDevice);
        };

        let handle = self
            .table
            .reserve(FileEntry::device(path, mode, Rc::clone(&ops)))?;
        if let Err(e) = ops.open(self, handle, path, mode) {
            log::debug!("{path}: open failed: {e}");
            self.table.free(handle);
            return Err(e);
        }

        let entry = self.table.constructing_mut(handle)?;
        entry.acquire()?;
        entry.mark_open();
        log::debug!("{path}: opened as {handle}");

        Ok(handle)
    }

    /// Drops one reference to a device. The last one unmounts the filesystem layered over
    /// it, closes the backend and frees the slot.
    pub(crate) fn close_device(&mut self, handle: Handle) -> Result<()> {
        let entry = self.table.opened_mut(handle)?;
        let refs = entry.release()?;
        if refs > 0 {
            log::trace!("{handle}: {refs} refs left");
            return Ok(());
        }

        let mounted = entry.take_mount();
        let ops = entry.ops();

        let unmounted = match mounted {
            Some(fs) => fs.unmount(self, handle),
            None => Ok(()),
        };
        let closed = ops.close(self, handle);
        if let Some(entry) = self.table.free(handle) {
            log::debug!("{}: released {handle}", entry.device_path().unwrap_or_default());
        }

        unmounted.and(closed)
    }
}

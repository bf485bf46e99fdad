//! # File table
//!
//! A fixed array of handle slots. A slot goes through three states:
//!
//! 1. free;
//! 2. under construction: reserved by an `Open` that is still resolving its nested
//!    dependencies, invisible to everything but that `Open`;
//! 3. open: usable by `Read`/`Write`/`Seek`/`Close`.
//!
//! Device slots double as device-registry entries: they carry the canonical path and
//! the number of opens sharing them.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use core::any::Any;

use arc_types::{Error, OpenMode, Result};
use derive_more::{Display, From, Into};
use enumflags2::{BitFlags, bitflags};

use crate::collections::SlotTable;
use crate::config::FILE_TABLE_SIZE;
use crate::deblock::Deblocker;
use crate::ops::FileOps;

/// The numeric handle a loader holds; equal to the slot index.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct Handle(usize);

#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFlag {
    Open = 0b001,
    Read = 0b010,
    Write = 0b100,
}

/// Whether an entry is a device itself or a file layered over one.
#[derive(Debug)]
pub enum DeviceLink {
    Device(Registration),
    Parent(Handle),
}

/// Device-registry data of a device slot.
#[derive(Debug)]
pub struct Registration {
    /// Canonical device path, the identity key for shared opens
    path: String,
    /// Opens resolved to this device, including the parents of layered files
    refs: u32,
    /// Filesystem vectors layered over the device, if any
    mount: Option<Rc<dyn FileOps>>,
}

/// Backend context; exactly one kind is valid at a time.
#[derive(Debug, Default)]
pub enum Backend {
    /// Not filled in yet
    #[default]
    None,
    /// Raw disk or partition
    Block(Deblocker),
    /// Filesystem cursor, owned by the entry
    Cursor(Box<dyn Any>),
}

#[derive(Debug)]
pub struct FileEntry {
    flags: BitFlags<EntryFlag>,
    link: DeviceLink,
    /// Byte position, relative to the start of the extent
    position: u64,
    ops: Rc<dyn FileOps>,
    backend: Backend,
}

impl FileEntry {
    pub(crate) fn device(path: &str, mode: OpenMode, ops: Rc<dyn FileOps>) -> Self {
        let registration = Registration {
            path: String::from(path),
            refs: 0,
            mount: None,
        };
        Self::new(DeviceLink::Device(registration), mode, ops)
    }

    pub(crate) fn file(parent: Handle, mode: OpenMode, ops: Rc<dyn FileOps>) -> Self {
        Self::new(DeviceLink::Parent(parent), mode, ops)
    }

    fn new(link: DeviceLink, mode: OpenMode, ops: Rc<dyn FileOps>) -> Self {
        let mut flags = BitFlags::empty();
        if mode.readable() {
            flags |= EntryFlag::Read;
        }
        if mode.writable() {
            flags |= EntryFlag::Write;
        }

        Self {
            flags,
            link,
            position: 0,
            ops,
            backend: Backend::None,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.flags.contains(EntryFlag::Open)
    }

    #[inline]
    pub fn readable(&self) -> bool {
        self.flags.contains(EntryFlag::Read)
    }

    #[inline]
    pub fn writable(&self) -> bool {
        self.flags.contains(EntryFlag::Write)
    }

    /// Does this entry already hold every permission `mode` needs?
    pub fn grants(&self, mode: OpenMode) -> bool {
        (!mode.readable() || self.readable()) && (!mode.writable() || self.writable())
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    #[inline]
    pub fn ops(&self) -> Rc<dyn FileOps> {
        Rc::clone(&self.ops)
    }

    /// The device a layered file lives on; `None` for devices.
    pub fn parent(&self) -> Option<Handle> {
        match self.link {
            DeviceLink::Device(_) => None,
            DeviceLink::Parent(parent) => Some(parent),
        }
    }

    /// Canonical path of a device entry.
    pub fn device_path(&self) -> Option<&str> {
        self.registration().map(|reg| reg.path.as_str())
    }

    /// Reference count of a device entry; `0` for files.
    pub fn refs(&self) -> u32 {
        self.registration().map_or(0, |reg| reg.refs)
    }

    pub fn mounted(&self) -> Option<Rc<dyn FileOps>> {
        self.registration().and_then(|reg| reg.mount.clone())
    }

    pub fn deblocker(&self) -> Result<&Deblocker> {
        match &self.backend {
            Backend::Block(deblocker) => Ok(deblocker),
            _ => Err(Error::BadFile),
        }
    }

    pub fn set_cursor<T: Any>(&mut self, cursor: T) {
        self.backend = Backend::Cursor(Box::new(cursor));
    }

    pub fn cursor<T: Any>(&self) -> Result<&T> {
        match &self.backend {
            Backend::Cursor(cursor) => cursor.downcast_ref().ok_or(Error::BadFile),
            _ => Err(Error::BadFile),
        }
    }

    pub fn cursor_mut<T: Any>(&mut self) -> Result<&mut T> {
        match &mut self.backend {
            Backend::Cursor(cursor) => cursor.downcast_mut().ok_or(Error::BadFile),
            _ => Err(Error::BadFile),
        }
    }

    pub(crate) fn set_backend(&mut self, backend: Backend) {
        self.backend = backend;
    }

    /// Deblocker and position, borrowed together for a transfer.
    pub(crate) fn block_mut(&mut self) -> Result<(&Deblocker, &mut u64)> {
        match &self.backend {
            Backend::Block(deblocker) => Ok((deblocker, &mut self.position)),
            _ => Err(Error::BadFile),
        }
    }

    fn registration(&self) -> Option<&Registration> {
        match &self.link {
            DeviceLink::Device(reg) => Some(reg),
            DeviceLink::Parent(_) => None,
        }
    }

    fn registration_mut(&mut self) -> Result<&mut Registration> {
        match &mut self.link {
            DeviceLink::Device(reg) => Ok(reg),
            DeviceLink::Parent(_) => Err(Error::BadFile),
        }
    }

    /// Takes one more reference on a device entry.
    pub(crate) fn acquire(&mut self) -> Result<u32> {
        let reg = self.registration_mut()?;
        reg.refs += 1;
        Ok(reg.refs)
    }

    /// Drops one reference and returns what is left.
    pub(crate) fn release(&mut self) -> Result<u32> {
        let reg = self.registration_mut()?;
        reg.refs = reg.refs.saturating_sub(1);
        Ok(reg.refs)
    }

    pub(crate) fn set_mount(&mut self, ops: Rc<dyn FileOps>) -> Result<()> {
        self.registration_mut()?.mount = Some(ops);
        Ok(())
    }

    pub(crate) fn take_mount(&mut self) -> Option<Rc<dyn FileOps>> {
        self.registration_mut().ok()?.mount.take()
    }

    pub(crate) fn mark_open(&mut self) {
        self.flags |= EntryFlag::Open;
    }
}

#[derive(Debug, Default)]
pub struct FileTable {
    slots: SlotTable<FileEntry, FILE_TABLE_SIZE>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `entry` into the lowest free slot, still closed.
    pub(crate) fn reserve(&mut self, entry: FileEntry) -> Result<Handle> {
        self.slots
            .insert(entry)
            .map(Handle)
            .ok_or(Error::TooManyFiles)
    }

    /// Clears a slot whatever its state.
    pub(crate) fn free(&mut self, handle: Handle) -> Option<FileEntry> {
        self.slots.remove(handle.0)
    }

    /// The entry of `handle`, which must already be open.
    pub fn opened(&self, handle: Handle) -> Result<&FileEntry> {
        self.slots
            .get(handle.0)
            .filter(|entry| entry.is_open())
            .ok_or(Error::BadFile)
    }

    pub fn opened_mut(&mut self, handle: Handle) -> Result<&mut FileEntry> {
        self.slots
            .get_mut(handle.0)
            .filter(|entry| entry.is_open())
            .ok_or(Error::BadFile)
    }

    /// The entry of `handle`, which must be reserved but not open yet.
    ///
    /// Only the `Open` that reserved the slot uses this; a nested `Open` can never reach a
    /// half-built entry through it after the entry went live.
    pub fn constructing_mut(&mut self, handle: Handle) -> Result<&mut FileEntry> {
        self.slots
            .get_mut(handle.0)
            .filter(|entry| !entry.is_open())
            .ok_or(Error::BadFile)
    }

    /// The open entry of `handle` if it holds `access`.
    pub fn permitted(&self, handle: Handle, access: EntryFlag) -> Result<&FileEntry> {
        let entry = self.opened(handle)?;
        if entry.flags.contains(access) {
            Ok(entry)
        } else {
            Err(Error::AccessDenied)
        }
    }

    /// Registry lookup: the open device registered under exactly `path` that already
    /// grants what `mode` needs.
    pub fn find_device(&self, path: &str, mode: OpenMode) -> Option<Handle> {
        self.slots.iter().find_map(|(index, entry)| {
            (entry.is_open() && entry.device_path() == Some(path) && entry.grants(mode))
                .then_some(Handle(index))
        })
    }

    /// Open handles in ascending order
    pub fn handles(&self) -> impl Iterator<Item = Handle> {
        self.slots
            .iter()
            .filter(|(_, entry)| entry.is_open())
            .map(|(index, _)| Handle(index))
    }

    /// Open files layered over `device`
    pub fn dependents(&self, device: Handle) -> u32 {
        self.slots
            .iter()
            .filter(|(_, entry)| entry.is_open() && entry.parent() == Some(device))
            .count() as u32
    }

    pub fn open_count(&self) -> usize {
        self.handles().count()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}

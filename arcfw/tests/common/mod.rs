#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use arc_types::{
    DirEntry, Error, FileAttribute, FileInformation, FileKind, OpenMode, Result, SeekMode,
};
use arcfw::{
    DeviceMap, DeviceTree, FileOps, FileSystem, Handle, PartitionEntry, PartitionTable,
    RawBlockDevice, Runtime,
};
use block_dev::{BlockDevice, RamDisk};
use enumflags2::BitFlags;

pub const DISK: &str = "scsi(0)disk(0)rdisk(0)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Read,
    Write,
}

/// One call into the sector primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub dir: Dir,
    pub sector: u64,
    pub count: u64,
}

/// A RAM disk that logs every sector transfer and can be told to fail.
#[derive(Debug)]
pub struct RecordingDisk {
    pub inner: RamDisk,
    pub log: RefCell<Vec<Transfer>>,
    /// Transfers touching this sector fail with `EIO`
    pub bad_sector: Cell<Option<u64>>,
}

impl RecordingDisk {
    pub fn new(inner: RamDisk) -> Rc<Self> {
        Rc::new(Self {
            inner,
            log: RefCell::new(Vec::new()),
            bad_sector: Cell::new(None),
        })
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    fn check(&self, dir: Dir, sector: u64, len: usize) -> Result<()> {
        let count = (len / self.inner.sector_size()) as u64;
        self.log.borrow_mut().push(Transfer { dir, sector, count });
        match self.bad_sector.get() {
            Some(bad) if (sector..sector + count).contains(&bad) => Err(Error::Io),
            _ => Ok(()),
        }
    }
}

impl BlockDevice for RecordingDisk {
    fn sector_size(&self) -> usize {
        self.inner.sector_size()
    }

    fn sector_count(&self) -> u64 {
        self.inner.sector_count()
    }

    fn max_transfer(&self) -> u32 {
        self.inner.max_transfer()
    }

    fn read_only(&self) -> bool {
        self.inner.read_only()
    }

    fn read_sectors(&self, sector: u64, buf: &mut [u8]) -> Result<()> {
        self.check(Dir::Read, sector, buf.len())?;
        self.inner.read_sectors(sector, buf)
    }

    fn write_sectors(&self, sector: u64, buf: &[u8]) -> Result<()> {
        self.check(Dir::Write, sector, buf.len())?;
        self.inner.write_sectors(sector, buf)
    }
}

/// Writes an MBR-style record holding `entries` into sector `lba`.
pub fn write_record(disk: &RamDisk, lba: u64, entries: [PartitionEntry; 4]) {
    let offset = lba as usize * disk.sector_size();
    let mut record = disk.peek(offset, 512);
    PartitionTable::new(entries).write_into(&mut record).unwrap();
    disk.poke(offset, &record);
}

pub fn entry(kind: u8, start: u32, count: u32) -> PartitionEntry {
    PartitionEntry::new(kind, start, count)
}

pub fn free() -> PartitionEntry {
    PartitionEntry::default()
}

/// Fills the disk with a byte pattern that identifies every offset.
pub fn fill_pattern(disk: &RamDisk) {
    let len = disk.sector_count() as usize * disk.sector_size();
    let pattern: Vec<u8> = (0..len).map(|i| (i * 7 + i / 251) as u8).collect();
    disk.poke(0, &pattern);
}

/// Open and close counts of a device backend.
#[derive(Debug, Default)]
pub struct Counts {
    pub opens: Cell<u32>,
    pub closes: Cell<u32>,
    pub unmounts: Cell<u32>,
}

/// Raw-device vectors that count how often the backend is opened and closed.
#[derive(Debug)]
pub struct CountingDevice {
    inner: RawBlockDevice,
    counts: Rc<Counts>,
    /// Accepts `Mount` calls, like a floppy or CD-ROM drive
    removable: bool,
}

impl FileOps for CountingDevice {
    fn open(&self, rt: &mut Runtime, handle: Handle, path: &str, mode: OpenMode) -> Result<()> {
        self.inner.open(rt, handle, path, mode)?;
        self.counts.opens.set(self.counts.opens.get() + 1);
        Ok(())
    }

    fn close(&self, rt: &mut Runtime, handle: Handle) -> Result<()> {
        self.counts.closes.set(self.counts.closes.get() + 1);
        self.inner.close(rt, handle)
    }

    fn mount(&self, path: &str, operation: arc_types::MountOperation) -> Result<()> {
        if self.removable {
            Ok(())
        } else {
            self.inner.mount(path, operation)
        }
    }

    fn read(&self, rt: &mut Runtime, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(rt, handle, buf)
    }

    fn write(&self, rt: &mut Runtime, handle: Handle, buf: &[u8]) -> Result<usize> {
        self.inner.write(rt, handle, buf)
    }

    fn seek(&self, rt: &mut Runtime, handle: Handle, offset: i64, mode: SeekMode) -> Result<()> {
        self.inner.seek(rt, handle, offset, mode)
    }

    fn get_read_status(&self, rt: &mut Runtime, handle: Handle) -> Result<()> {
        self.inner.get_read_status(rt, handle)
    }

    fn get_file_information(&self, rt: &mut Runtime, handle: Handle) -> Result<FileInformation> {
        self.inner.get_file_information(rt, handle)
    }
}

/// A device tree with one counting disk at [`DISK`], plus a plain [`DeviceMap`].
#[derive(Debug)]
pub struct CountingTree {
    pub disk: Rc<CountingDevice>,
    pub map: DeviceMap,
}

impl CountingTree {
    pub fn new(device: Rc<dyn BlockDevice>, removable: bool) -> (Self, Rc<Counts>) {
        let counts = Rc::new(Counts::default());
        let disk = Rc::new(CountingDevice {
            inner: RawBlockDevice::new(device),
            counts: Rc::clone(&counts),
            removable,
        });
        let tree = Self {
            disk,
            map: DeviceMap::new(),
        };
        (tree, counts)
    }
}

impl DeviceTree for CountingTree {
    fn lookup(&self, path: &str) -> Option<Rc<dyn FileOps>> {
        if path.starts_with(DISK) {
            Some(Rc::clone(&self.disk) as Rc<dyn FileOps>)
        } else {
            self.map.lookup(path)
        }
    }
}

/// A runtime over a single RAM disk registered at [`DISK`].
pub fn runtime_with(disk: Rc<dyn BlockDevice>) -> Runtime {
    let mut devices = DeviceMap::new();
    devices.insert(DISK, disk).unwrap();
    Runtime::new(devices)
}

pub fn open_path(partition: u32) -> String {
    format!("{DISK}partition({partition})")
}

/*
 * FLAT: a toy read-only filesystem
 *
 * Sector 0 of the volume: b"FLAT", u32 LE file count, then per file a 32-byte record of a
 * 24-byte NUL-padded name, u32 LE byte offset and u32 LE byte length.
 */

pub const FLAT_MAGIC: &[u8; 4] = b"FLAT";

/// Builds a FLAT volume image of `sectors` 512-byte sectors.
pub fn flat_volume(files: &[(&str, &[u8])], sectors: usize) -> Vec<u8> {
    let mut image = vec![0u8; sectors * 512];
    image[..4].copy_from_slice(FLAT_MAGIC);
    image[4..8].copy_from_slice(&(files.len() as u32).to_le_bytes());

    let mut data = 512;
    for (i, (name, content)) in files.iter().enumerate() {
        let record = 8 + i * 32;
        image[record..record + name.len()].copy_from_slice(name.as_bytes());
        image[record + 24..record + 28].copy_from_slice(&(data as u32).to_le_bytes());
        image[record + 28..record + 32].copy_from_slice(&(content.len() as u32).to_le_bytes());
        image[data..data + content.len()].copy_from_slice(content);
        data += content.len();
    }

    image
}

#[derive(Debug)]
pub struct FlatFs {
    pub unmounts: Rc<Cell<u32>>,
}

impl FlatFs {
    pub fn new() -> (Self, Rc<Cell<u32>>) {
        let unmounts = Rc::new(Cell::new(0));
        let fs = Self {
            unmounts: Rc::clone(&unmounts),
        };
        (fs, unmounts)
    }
}

impl FileSystem for FlatFs {
    fn name(&self) -> &str {
        "flat"
    }

    fn mount(&self, rt: &mut Runtime, device: Handle) -> Result<Rc<dyn FileOps>> {
        let mut header = [0u8; 512];
        rt.seek(device, 0, SeekMode::Absolute)?;
        rt.read(device, &mut header)?;
        if &header[..4] != FLAT_MAGIC {
            return Err(Error::BadFile);
        }

        let count = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;
        let files = (0..count)
            .map(|i| {
                let record = &header[8 + i * 32..8 + (i + 1) * 32];
                let name_len = record[..24].iter().position(|&b| b == 0).unwrap_or(24);
                FlatRecord {
                    name: String::from_utf8_lossy(&record[..name_len]).into_owned(),
                    start: u32::from_le_bytes(record[24..28].try_into().unwrap()) as u64,
                    len: u32::from_le_bytes(record[28..32].try_into().unwrap()) as u64,
                }
            })
            .collect();

        Ok(Rc::new(FlatFiles {
            files,
            unmounts: Rc::clone(&self.unmounts),
        }))
    }
}

#[derive(Debug, Clone)]
struct FlatRecord {
    name: String,
    start: u64,
    len: u64,
}

#[derive(Debug)]
struct FlatFiles {
    files: Vec<FlatRecord>,
    unmounts: Rc<Cell<u32>>,
}

/// Cursor state of an open FLAT handle.
#[derive(Debug)]
enum FlatCursor {
    File(FlatRecord),
    /// Index of the next entry to list
    Root(usize),
}

impl FileOps for FlatFiles {
    fn open(&self, rt: &mut Runtime, handle: Handle, path: &str, mode: OpenMode) -> Result<()> {
        if mode.writable() {
            return Err(Error::ReadOnly);
        }

        let name = path.trim_start_matches('\\');
        let cursor = if name.is_empty() {
            FlatCursor::Root(0)
        } else if mode.is_directory() {
            return Err(Error::NotDirectory);
        } else {
            let record = self
                .files
                .iter()
                .find(|file| file.name.eq_ignore_ascii_case(name))
                .ok_or(Error::NotFound)?;
            FlatCursor::File(record.clone())
        };

        rt.table_mut().constructing_mut(handle)?.set_cursor(cursor);
        Ok(())
    }

    fn unmount(&self, _rt: &mut Runtime, _device: Handle) -> Result<()> {
        self.unmounts.set(self.unmounts.get() + 1);
        Ok(())
    }

    fn read(&self, rt: &mut Runtime, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        let entry = rt.table().opened(handle)?;
        let FlatCursor::File(record) = entry.cursor::<FlatCursor>()? else {
            return Err(Error::IsDirectory);
        };
        let (start, len) = (record.start, record.len);
        let position = entry.position();
        let device = entry.parent().ok_or(Error::BadFile)?;

        let n = (len.saturating_sub(position) as usize).min(buf.len());
        if n == 0 {
            return Ok(0);
        }
        rt.seek(device, (start + position) as i64, SeekMode::Absolute)?;
        let read = rt.read(device, &mut buf[..n])?;
        rt.table_mut()
            .opened_mut(handle)?
            .set_position(position + read as u64);
        Ok(read)
    }

    fn seek(&self, rt: &mut Runtime, handle: Handle, offset: i64, mode: SeekMode) -> Result<()> {
        let entry = rt.table_mut().opened_mut(handle)?;
        let base = match mode {
            SeekMode::Absolute => 0,
            SeekMode::Relative => entry.position() as i64,
        };
        let target = u64::try_from(base + offset).map_err(|_| Error::Invalid)?;
        entry.set_position(target);
        Ok(())
    }

    fn get_read_status(&self, rt: &mut Runtime, handle: Handle) -> Result<()> {
        let entry = rt.table().opened(handle)?;
        match entry.cursor::<FlatCursor>()? {
            FlatCursor::File(record) if entry.position() < record.len => Ok(()),
            _ => Err(Error::Again),
        }
    }

    fn get_file_information(&self, rt: &mut Runtime, handle: Handle) -> Result<FileInformation> {
        let entry = rt.table().opened(handle)?;
        let info = match entry.cursor::<FlatCursor>()? {
            FlatCursor::File(record) => FileInformation {
                start: 0,
                end: record.len,
                position: entry.position(),
                kind: FileKind::File,
                attributes: FileAttribute::ReadOnly.into(),
                name: record.name.clone(),
            },
            FlatCursor::Root(_) => FileInformation {
                kind: FileKind::Directory,
                attributes: FileAttribute::Directory.into(),
                ..FileInformation::default()
            },
        };
        Ok(info)
    }

    fn get_directory_entry(
        &self,
        rt: &mut Runtime,
        handle: Handle,
        count: usize,
    ) -> Result<Vec<DirEntry>> {
        let entry = rt.table_mut().opened_mut(handle)?;
        let FlatCursor::Root(next) = entry.cursor_mut::<FlatCursor>()? else {
            return Err(Error::NotDirectory);
        };

        let listed: Vec<DirEntry> = self
            .files
            .iter()
            .skip(*next)
            .take(count)
            .map(|file| DirEntry {
                name: file.name.clone(),
                attributes: BitFlags::from(FileAttribute::ReadOnly),
            })
            .collect();
        *next += listed.len();
        Ok(listed)
    }
}

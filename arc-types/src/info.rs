use alloc::string::String;

use enumflags2::{BitFlags, bitflags};

/// What `GetFileInformation` reports about an open handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInformation {
    /// First byte of the extent on the underlying device
    pub start: u64,
    /// One past the last byte of the extent
    pub end: u64,
    /// Current position, relative to `start`
    pub position: u64,
    pub kind: FileKind,
    pub attributes: BitFlags<FileAttribute>,
    /// Empty for devices
    pub name: String,
}

impl FileInformation {
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileKind {
    /// Raw disk or partition
    Device,
    #[default]
    File,
    Directory,
}

#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAttribute {
    ReadOnly = 0b0000_0001,
    Hidden = 0b0000_0010,
    System = 0b0000_0100,
    Archive = 0b0000_1000,
    Directory = 0b0001_0000,
    /// Marks the file for deletion on close
    Delete = 0b0010_0000,
}

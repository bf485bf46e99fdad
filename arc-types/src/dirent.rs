use alloc::string::String;

use enumflags2::BitFlags;

use crate::FileAttribute;

/// One record of `GetDirectoryEntry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub attributes: BitFlags<FileAttribute>,
}

impl DirEntry {
    #[inline]
    pub fn is_directory(&self) -> bool {
        self.attributes.contains(FileAttribute::Directory)
    }
}

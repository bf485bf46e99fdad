/// `OPEN_MODE` of the ARC `Open` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum OpenMode {
    #[default]
    ReadOnly = 0,
    WriteOnly = 1,
    ReadWrite = 2,
    /// Create the file, fail if it exists
    CreateWriteOnly = 3,
    CreateReadWrite = 4,
    /// Create the file, truncate it if it exists
    SupersedeWriteOnly = 5,
    SupersedeReadWrite = 6,
    OpenDirectory = 7,
    CreateDirectory = 8,
}

impl OpenMode {
    /// Every mode except the write-only ones needs read access.
    #[inline]
    pub fn readable(self) -> bool {
        !matches!(
            self,
            Self::WriteOnly | Self::CreateWriteOnly | Self::SupersedeWriteOnly
        )
    }

    /// Every mode except read-only needs write access.
    #[inline]
    pub fn writable(self) -> bool {
        !matches!(self, Self::ReadOnly | Self::OpenDirectory)
    }

    #[inline]
    pub fn is_directory(self) -> bool {
        matches!(self, Self::OpenDirectory | Self::CreateDirectory)
    }

    #[inline]
    pub fn creates(self) -> bool {
        matches!(
            self,
            Self::CreateWriteOnly
                | Self::CreateReadWrite
                | Self::SupersedeWriteOnly
                | Self::SupersedeReadWrite
                | Self::CreateDirectory
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SeekMode {
    Absolute = 0,
    Relative = 1,
}

/// Removable media operations of the ARC `Mount` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MountOperation {
    LoadMedia = 0,
    UnloadMedia = 1,
}

use derive_more::Display;

pub type Result<T> = core::result::Result<T, Error>;

/// ARC status codes.
///
/// Success is `Ok(..)`, so the table starts at 1. The numeric values are part of the
/// firmware ABI: a loader compares them directly, see [`Error::code`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Error {
    /// E2BIG
    #[display(fmt = "request or size out of supported range")]
    TooBig = 1,
    /// EACCES
    #[display(fmt = "permission denied")]
    AccessDenied = 2,
    /// EAGAIN, also "no more data" from `GetReadStatus`
    #[display(fmt = "no more data available")]
    Again = 3,
    /// EBADF
    #[display(fmt = "bad file handle or bad format")]
    BadFile = 4,
    /// EBUSY
    #[display(fmt = "device busy")]
    Busy = 5,
    /// EFAULT
    #[display(fmt = "bad address")]
    Fault = 6,
    /// EINVAL
    #[display(fmt = "invalid argument")]
    Invalid = 7,
    /// EIO
    #[display(fmt = "I/O error")]
    Io = 8,
    /// EISDIR
    #[display(fmt = "is a directory")]
    IsDirectory = 9,
    /// EMFILE
    #[display(fmt = "too many open files")]
    TooManyFiles = 10,
    /// EMLINK
    #[display(fmt = "too many links")]
    TooManyLinks = 11,
    /// ENAMETOOLONG
    #[display(fmt = "name too long")]
    NameTooLong = 12,
    /// ENODEV
    #[display(fmt = "no such device or partition")]
    NoDevice = 13,
    /// ENOENT
    #[display(fmt = "no such file or directory")]
    NotFound = 14,
    /// ENOEXEC
    #[display(fmt = "execute format error")]
    NotExecutable = 15,
    /// ENOMEM
    #[display(fmt = "out of memory")]
    NoMemory = 16,
    /// ENOSPC
    #[display(fmt = "no space left on device")]
    NoSpace = 17,
    /// ENOTDIR
    #[display(fmt = "not a directory")]
    NotDirectory = 18,
    /// ENOTTY
    #[display(fmt = "not a terminal")]
    NotTerminal = 19,
    /// ENXIO
    #[display(fmt = "no such device or address")]
    NoSuchAddress = 20,
    /// EROFS
    #[display(fmt = "read-only medium")]
    ReadOnly = 21,
}

impl Error {
    const TABLE: [Self; 21] = [
        Self::TooBig,
        Self::AccessDenied,
        Self::Again,
        Self::BadFile,
        Self::Busy,
        Self::Fault,
        Self::Invalid,
        Self::Io,
        Self::IsDirectory,
        Self::TooManyFiles,
        Self::TooManyLinks,
        Self::NameTooLong,
        Self::NoDevice,
        Self::NotFound,
        Self::NotExecutable,
        Self::NoMemory,
        Self::NoSpace,
        Self::NotDirectory,
        Self::NotTerminal,
        Self::NoSuchAddress,
        Self::ReadOnly,
    ];

    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// `None` for `ESUCCESS` (0) and for codes outside the table.
    pub fn from_code(code: u32) -> Option<Self> {
        let index = usize::try_from(code).ok()?.checked_sub(1)?;
        Self::TABLE.get(index).copied()
    }
}

impl core::error::Error for Error {}

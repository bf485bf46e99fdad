//! Constants of the storage core

/// Number of handle slots; a loader never sees more open files than this
pub const FILE_TABLE_SIZE: usize = 16;

/// Upper bound on the links followed in an extended partition chain.
/// A corrupt chain that points back into itself stops here instead of spinning forever.
pub const MAX_CHAIN_LINKS: usize = 128;

/// The MBR and every extended boot record occupy this many bytes at the start of their sector
pub const MBR_SIZE: usize = 512;
/// Offset of the four-entry partition table inside the record
pub const MBR_TABLE_OFFSET: usize = 446;
pub const MBR_SIGNATURE: u16 = 0xAA55;

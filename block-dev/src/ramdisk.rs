use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use arc_types::{Error, Result};

use crate::BlockDevice;

/// A disk stored in memory.
#[derive(Debug)]
pub struct RamDisk {
    data: RefCell<Vec<u8>>,
    sector_size: usize,
    max_transfer: u32,
    read_only: bool,
}

impl RamDisk {
    /// Creates a zeroed disk of `sectors` sectors.
    ///
    /// To create a 1MiB disk of 512-byte sectors, use `sectors = 2048`.
    pub fn new(sector_size: usize, sectors: u64) -> Self {
        assert!(sector_size > 0, "sector size must be positive");
        Self {
            data: RefCell::new(vec![0; sector_size * sectors as usize]),
            sector_size,
            max_transfer: u32::MAX,
            read_only: false,
        }
    }

    /// Wraps an existing image, which must hold whole sectors.
    pub fn from_image(sector_size: usize, image: Vec<u8>) -> Self {
        assert_eq!(0, image.len() % sector_size, "not a whole number of sectors");
        Self {
            data: RefCell::new(image),
            sector_size,
            max_transfer: u32::MAX,
            read_only: false,
        }
    }

    pub fn with_max_transfer(mut self, sectors: u32) -> Self {
        self.max_transfer = sectors;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Copies `len` bytes starting at absolute byte `offset`, bypassing sector rules.
    pub fn peek(&self, offset: usize, len: usize) -> Vec<u8> {
        self.data.borrow()[offset..offset + len].to_vec()
    }

    /// Overwrites bytes at absolute byte `offset`, bypassing sector rules.
    pub fn poke(&self, offset: usize, bytes: &[u8]) {
        self.data.borrow_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn byte_range(&self, sector: u64, len: usize) -> Result<core::ops::Range<usize>> {
        if len == 0 || len % self.sector_size != 0 {
            return Err(Error::Invalid);
        }
        if (len / self.sector_size) as u64 > u64::from(self.max_transfer) {
            return Err(Error::TooBig);
        }

        let start = usize::try_from(sector)
            .ok()
            .and_then(|s| s.checked_mul(self.sector_size))
            .ok_or(Error::Io)?;
        let end = start.checked_add(len).ok_or(Error::Io)?;
        if end > self.data.borrow().len() {
            return Err(Error::Io);
        }

        Ok(start..end)
    }
}

impl BlockDevice for RamDisk {
    #[inline]
    fn sector_size(&self) -> usize {
        self.sector_size
    }

    #[inline]
    fn sector_count(&self) -> u64 {
        (self.data.borrow().len() / self.sector_size) as u64
    }

    #[inline]
    fn max_transfer(&self) -> u32 {
        self.max_transfer
    }

    #[inline]
    fn read_only(&self) -> bool {
        self.read_only
    }

    fn read_sectors(&self, sector: u64, buf: &mut [u8]) -> Result<()> {
        let range = self.byte_range(sector, buf.len())?;
        buf.copy_from_slice(&self.data.borrow()[range]);
        Ok(())
    }

    fn write_sectors(&self, sector: u64, buf: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        let range = self.byte_range(sector, buf.len())?;
        self.data.borrow_mut()[range].copy_from_slice(buf);
        Ok(())
    }
}

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use arc_types::{Error, Result};
use block_dev::BlockDevice;

/// A disk image on the host, addressed in sectors.
#[derive(Debug)]
pub struct BlockFile {
    inner: RefCell<File>,
    sector_size: usize,
    sector_count: u64,
    max_transfer: u32,
    read_only: bool,
}

impl BlockFile {
    /// Trailing bytes that do not fill a whole sector are not addressable.
    pub fn new(fd: File, sector_size: usize, max_transfer: u32, read_only: bool) -> io::Result<Self> {
        if sector_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "sector size must be positive",
            ));
        }
        let sector_count = fd.metadata()?.len() / sector_size as u64;

        Ok(Self {
            inner: RefCell::new(fd),
            sector_size,
            sector_count,
            max_transfer,
            read_only,
        })
    }

    fn check(&self, sector: u64, len: usize) -> Result<u64> {
        if len == 0 || len % self.sector_size != 0 {
            return Err(Error::Invalid);
        }
        let count = (len / self.sector_size) as u64;
        if count > u64::from(self.max_transfer) {
            return Err(Error::TooBig);
        }
        if sector.checked_add(count).is_none_or(|end| end > self.sector_count) {
            return Err(Error::Io);
        }
        Ok(sector * self.sector_size as u64)
    }
}

fn io_error(sector: u64, e: io::Error) -> Error {
    log::error!("sector {sector}: {e}");
    Error::Io
}

impl BlockDevice for BlockFile {
    fn sector_size(&self) -> usize {
        self.sector_size
    }

    fn sector_count(&self) -> u64 {
        self.sector_count
    }

    fn max_transfer(&self) -> u32 {
        self.max_transfer
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    fn read_sectors(&self, sector: u64, buf: &mut [u8]) -> Result<()> {
        let offset = self.check(sector, buf.len())?;
        let mut file = self.inner.borrow_mut();
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(buf))
            .map_err(|e| io_error(sector, e))
    }

    fn write_sectors(&self, sector: u64, buf: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        let offset = self.check(sector, buf.len())?;
        let mut file = self.inner.borrow_mut();
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.write_all(buf))
            .map_err(|e| io_error(sector, e))
    }
}

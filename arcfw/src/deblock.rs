//! # Sector deblocking
//!
//! Byte-addressed reads and writes over a [`BlockDevice`] that only moves whole sectors.
//!
//! A request is split into at most one partial sector at each end, which goes through a
//! one-sector scratch buffer, and an aligned middle that is transferred straight into the
//! caller's buffer in chunks of at most `max_transfer` sectors.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use arc_types::{Error, FileInformation, FileKind, Result, SeekMode};
use block_dev::BlockDevice;
use enumflags2::BitFlags;

use crate::partition::Extent;

/// A window of sectors on one block device.
#[derive(Debug, Clone)]
pub struct Deblocker {
    device: Rc<dyn BlockDevice>,
    /// Sectors of the device that this handle may address, e.g. one partition
    window: Extent,
    sector_size: usize,
    max_transfer: u32,
}

impl Deblocker {
    /// Fails with [`Error::TooBig`] if the window does not fit on the device.
    pub fn new(device: Rc<dyn BlockDevice>, window: Extent) -> Result<Self> {
        let sector_size = device.sector_size();
        if sector_size == 0 {
            return Err(Error::Invalid);
        }
        if window.end().is_none_or(|end| end > device.sector_count()) {
            log::error!(
                "window {window:?} exceeds the {} sectors of the device",
                device.sector_count()
            );
            return Err(Error::TooBig);
        }
        let max_transfer = device.max_transfer().max(1);

        Ok(Self {
            device,
            window,
            sector_size,
            max_transfer,
        })
    }

    #[inline]
    pub fn window(&self) -> Extent {
        self.window
    }

    #[inline]
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    #[inline]
    pub fn max_transfer(&self) -> u32 {
        self.max_transfer
    }

    #[inline]
    pub fn device(&self) -> &Rc<dyn BlockDevice> {
        &self.device
    }

    /// Size of the window in bytes
    pub fn extent_bytes(&self) -> u64 {
        self.window.count.saturating_mul(self.sector_size as u64)
    }

    pub fn read(&self, position: &mut u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.check_span(*position, buf.len())?;

        let sector_size = self.sector_size;
        let mut scratch = Vec::new();
        let mut done = 0;

        while done < buf.len() {
            let offset = self.offset_in_sector(*position);
            let remaining = buf.len() - done;

            let len = if offset != 0 || remaining < sector_size {
                let len = (sector_size - offset).min(remaining);
                self.load(self.sector_of(*position), &mut scratch)?;
                buf[done..done + len].copy_from_slice(&scratch[offset..offset + len]);
                len
            } else {
                let relative = self.sector_of(*position);
                let len = self.chunk(relative, remaining / sector_size) * sector_size;
                log::trace!("read {} sectors at {relative}", len / sector_size);
                self.device
                    .read_sectors(self.absolute(relative)?, &mut buf[done..done + len])?;
                len
            };

            done += len;
            *position += len as u64;
        }

        Ok(done)
    }

    /// Partial sectors are read, patched and written back. `position` only moves once a
    /// whole step went through, so a failed read-modify-write leaves it where it was.
    pub fn write(&self, position: &mut u64, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.check_span(*position, buf.len())?;

        let sector_size = self.sector_size;
        let mut scratch = Vec::new();
        let mut done = 0;

        while done < buf.len() {
            let offset = self.offset_in_sector(*position);
            let remaining = buf.len() - done;

            let len = if offset != 0 || remaining < sector_size {
                let len = (sector_size - offset).min(remaining);
                let sector = self.sector_of(*position);
                self.load(sector, &mut scratch)?;
                scratch[offset..offset + len].copy_from_slice(&buf[done..done + len]);
                self.store(sector, &scratch)?;
                len
            } else {
                let relative = self.sector_of(*position);
                let len = self.chunk(relative, remaining / sector_size) * sector_size;
                log::trace!("write {} sectors at {relative}", len / sector_size);
                self.device
                    .write_sectors(self.absolute(relative)?, &buf[done..done + len])?;
                len
            };

            done += len;
            *position += len as u64;
        }

        Ok(done)
    }

    /// The target must stay inside `[0, extent_bytes]`.
    pub fn seek(&self, position: &mut u64, offset: i64, mode: SeekMode) -> Result<()> {
        let base = match mode {
            SeekMode::Absolute => 0,
            SeekMode::Relative => i64::try_from(*position).map_err(|_| Error::TooBig)?,
        };
        let target = base
            .checked_add(offset)
            .and_then(|target| u64::try_from(target).ok())
            .filter(|&target| target <= self.extent_bytes())
            .ok_or(Error::Invalid)?;

        *position = target;
        Ok(())
    }

    /// [`Error::Again`] once the position reached the end of the window.
    pub fn read_status(&self, position: u64) -> Result<()> {
        if position >= self.extent_bytes() {
            Err(Error::Again)
        } else {
            Ok(())
        }
    }

    pub fn information(&self, position: u64) -> FileInformation {
        let start = self.window.start.saturating_mul(self.sector_size as u64);
        FileInformation {
            start,
            end: start.saturating_add(self.extent_bytes()),
            position,
            kind: FileKind::Device,
            attributes: BitFlags::empty(),
            name: String::new(),
        }
    }

    #[inline]
    fn offset_in_sector(&self, position: u64) -> usize {
        (position % self.sector_size as u64) as usize
    }

    /// Window-relative sector holding `position`
    #[inline]
    fn sector_of(&self, position: u64) -> u64 {
        position / self.sector_size as u64
    }

    fn absolute(&self, relative: u64) -> Result<u64> {
        self.window.start.checked_add(relative).ok_or(Error::TooBig)
    }

    /// Sectors to move in one aligned transfer starting at window-relative `relative`.
    ///
    /// Capped by the device limit and by what is left of the window. Once the window is
    /// used up the request is not clamped; the device decides what lies beyond.
    fn chunk(&self, relative: u64, sectors: usize) -> usize {
        let left = self.window.count.saturating_sub(relative);
        let mut count = (sectors as u64).min(u64::from(self.max_transfer));
        if left > 0 {
            count = count.min(left);
        }
        count as usize
    }

    /// Reads window-relative sector `relative` into `scratch`.
    fn load(&self, relative: u64, scratch: &mut Vec<u8>) -> Result<()> {
        if scratch.len() != self.sector_size {
            *scratch = vec![0; self.sector_size];
        }
        self.device.read_sectors(self.absolute(relative)?, scratch)
    }

    fn store(&self, relative: u64, scratch: &[u8]) -> Result<()> {
        self.device.write_sectors(self.absolute(relative)?, scratch)
    }

    /// Positions are signed 64-bit on the loader side.
    fn check_span(&self, position: u64, len: usize) -> Result<()> {
        position
            .checked_add(len as u64)
            .filter(|&end| end <= i64::MAX as u64)
            .map(|_| ())
            .ok_or(Error::TooBig)
    }
}

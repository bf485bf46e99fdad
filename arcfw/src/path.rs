//! ARC path strings: `token(number)token(number)...` optionally followed by `\file\path`.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use arc_types::{Error, Result};

/// One `token(number)` group of the device portion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component<'a> {
    pub name: &'a str,
    pub index: u32,
}

pub trait ArcPath {
    /// Lowercases the device portion and writes `()` as `(0)`.
    ///
    /// The file portion, if any, is kept verbatim; filesystems decide about its case.
    fn canonicalize(&self) -> String;

    /// Returns `(device, file)`.
    ///
    /// The device portion ends at the first `)` that is followed by `\` or by the end of the
    /// string. The file portion keeps its leading `\`.
    fn split_device(&self) -> (&str, Option<&str>);

    /// Parses the device portion into its components.
    fn components(&self) -> Result<Vec<Component<'_>>>;

    /// Index of the `partition(n)` component; `None` if the path names a whole disk.
    fn partition(&self) -> Result<Option<u32>>;

    /// Device portion without its `partition(n)` component.
    fn disk_path(&self) -> Result<String>;

    /// Device portion with its partition component set to `partition`.
    fn with_partition(&self, partition: u32) -> Result<String>;
}

/// Index one past the `)` closing the device portion.
fn device_end(path: &str) -> Option<usize> {
    let bytes = path.as_bytes();
    (0..bytes.len())
        .find(|&i| bytes[i] == b')' && matches!(bytes.get(i + 1), None | Some(b'\\')))
        .map(|i| i + 1)
}

impl ArcPath for str {
    fn canonicalize(&self) -> String {
        let (device, file) = self.split_device();

        let mut canonical = String::with_capacity(self.len() + 1);
        let mut chars = device.chars().peekable();
        while let Some(c) = chars.next() {
            canonical.push(c.to_ascii_lowercase());
            if c == '(' && chars.peek() == Some(&')') {
                canonical.push('0');
            }
        }
        canonical.extend(file);

        canonical
    }

    fn split_device(&self) -> (&str, Option<&str>) {
        match device_end(self) {
            Some(end) if end < self.len() => (&self[..end], Some(&self[end..])),
            _ => (self, None),
        }
    }

    fn components(&self) -> Result<Vec<Component<'_>>> {
        let (mut rest, _) = self.split_device();

        let mut cmps = Vec::new();
        while !rest.is_empty() {
            let (name, tail) = rest.split_once('(').ok_or(Error::Invalid)?;
            let (index, tail) = tail.split_once(')').ok_or(Error::Invalid)?;

            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(Error::Invalid);
            }
            if !index.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::Invalid);
            }
            // `()` means index 0
            let index = if index.is_empty() {
                0
            } else {
                index.parse().map_err(|_| Error::Invalid)?
            };

            cmps.push(Component { name, index });
            rest = tail;
        }

        Ok(cmps)
    }

    fn partition(&self) -> Result<Option<u32>> {
        Ok(self
            .components()?
            .iter()
            .rev()
            .find(|cmp| cmp.name.eq_ignore_ascii_case("partition"))
            .map(|cmp| cmp.index))
    }

    fn disk_path(&self) -> Result<String> {
        let mut disk = String::new();
        for cmp in self
            .components()?
            .into_iter()
            .filter(|cmp| !cmp.name.eq_ignore_ascii_case("partition"))
        {
            let _ = write!(disk, "{}({})", cmp.name.to_ascii_lowercase(), cmp.index);
        }
        Ok(disk)
    }

    fn with_partition(&self, partition: u32) -> Result<String> {
        let mut path = self.disk_path()?;
        let _ = write!(path, "partition({partition})");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{ArcPath, Component};

    #[test]
    fn canonicalize_lowercases_device_portion() {
        assert_eq!(
            "Multi()Disk(0)RDisk()Partition(1)\\OSLOADER.EXE".canonicalize(),
            "multi(0)disk(0)rdisk(0)partition(1)\\OSLOADER.EXE"
        );
        assert_eq!("SCSI(0)CDROM()".canonicalize(), "scsi(0)cdrom(0)");
        assert_eq!("disk()\\A()B".canonicalize(), "disk(0)\\A()B");
    }

    #[test]
    fn split_at_first_terminal_paren() {
        assert_eq!(
            "scsi(0)disk(1)rdisk(0)partition(2)\\boot\\x.exe".split_device(),
            ("scsi(0)disk(1)rdisk(0)partition(2)", Some("\\boot\\x.exe"))
        );
        assert_eq!("scsi(0)disk(1)".split_device(), ("scsi(0)disk(1)", None));
        assert_eq!("\\no\\device".split_device(), ("\\no\\device", None));
    }

    #[test]
    fn components_parse() {
        assert_eq!(
            "scsi(0)disk()rdisk(3)".components().unwrap(),
            [
                Component { name: "scsi", index: 0 },
                Component { name: "disk", index: 0 },
                Component { name: "rdisk", index: 3 },
            ]
        );
        assert!("scsi(0".components().is_err());
        assert!("scsi(x)".components().is_err());
        assert!("(0)".components().is_err());
        assert!("".components().unwrap().is_empty());
    }

    #[test]
    fn partition_rewrite() {
        let path = "scsi(0)disk(0)rdisk(0)partition(3)";
        assert_eq!(path.partition().unwrap(), Some(3));
        assert_eq!(path.disk_path().unwrap(), "scsi(0)disk(0)rdisk(0)");
        assert_eq!(
            path.with_partition(0).unwrap(),
            "scsi(0)disk(0)rdisk(0)partition(0)"
        );
        assert_eq!("scsi(0)disk(0)rdisk(0)".partition().unwrap(), None);
    }
}

#![no_std]

extern crate alloc;

mod dirent;
mod error;
mod info;
mod mode;

pub use self::{
    dirent::DirEntry,
    error::{Error, Result},
    info::{FileAttribute, FileInformation, FileKind},
    mode::{MountOperation, OpenMode, SeekMode},
};

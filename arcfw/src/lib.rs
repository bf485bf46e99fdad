//! # ARC storage I/O core
//!
//! Numeric-handle file and disk I/O for an OS loader running on ARC firmware.
//!
//! ## Layers (top down)
//!
//! 1. [`Runtime`]: the ARC calls, dispatched by handle
//! 2. file table and device registry: slots, permissions, shared device opens
//! 3. backends: [`RawBlockDevice`] (deblocker over a partition window) or a [`FileSystem`]
//! 4. [`BlockDevice`](block_dev::BlockDevice): whole-sector transfers

#![no_std]

extern crate alloc;

mod collections;
pub mod config;
mod deblock;
mod device;
mod ops;
mod partition;
mod path;
mod registry;
mod runtime;
mod table;

pub use self::{
    collections::SlotTable,
    deblock::Deblocker,
    device::{DeviceMap, RawBlockDevice},
    ops::{DeviceTree, FileOps, FileSystem},
    partition::{Extent, PartitionEntry, PartitionTable},
    path::{ArcPath, Component},
    runtime::Runtime,
    table::{Backend, EntryFlag, FileEntry, FileTable, Handle},
};

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Serve a disk image as an ARC device and poke at it
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Disk image file
    pub image: PathBuf,

    /// ARC path the image is registered under
    #[arg(long, short, default_value = "scsi(0)disk(0)rdisk(0)")]
    pub device: String,

    /// Bytes per sector
    #[arg(long, default_value_t = 512)]
    pub sector_size: usize,

    /// Most sectors moved by one transfer
    #[arg(long, default_value_t = 64)]
    pub max_transfer: u32,

    /// Refuse writable opens
    #[arg(long)]
    pub read_only: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the partitions of the disk
    Partitions,
    /// Print what `GetFileInformation` reports for a path
    Info {
        /// Partition number; 0 is the whole disk
        #[arg(default_value_t = 0)]
        partition: u32,
    },
    /// Hex-dump bytes of a partition
    Dump {
        /// Partition number; 0 is the whole disk
        partition: u32,

        /// Byte offset into the partition
        #[arg(long, short, default_value_t = 0)]
        offset: u64,

        /// Number of bytes
        #[arg(long, short, default_value_t = 512)]
        length: usize,
    },
}

mod block_file;
mod cli;

use std::fs::OpenOptions;
use std::io;
use std::process::ExitCode;
use std::rc::Rc;

use arc_types::{Error, OpenMode, SeekMode};
use arcfw::{ArcPath, DeviceMap, Handle, Runtime};
use block_dev::BlockDevice;
use clap::Parser;
use typed_bytesize::ByteSizeIec;

pub use self::{
    block_file::BlockFile,
    cli::{Cli, Command},
};

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// ARC status as an I/O error carrying both the message and the numeric code
fn status(e: Error) -> io::Error {
    io::Error::other(format!("{e} (status {})", e.code()))
}

fn run(cli: &Cli) -> io::Result<()> {
    let fd = OpenOptions::new()
        .read(true)
        .write(!cli.read_only)
        .open(&cli.image)?;
    let disk = BlockFile::new(fd, cli.sector_size, cli.max_transfer, cli.read_only)?;
    log::info!(
        "image={:?} sectors={} size={}",
        cli.image,
        disk.sector_count(),
        ByteSizeIec(disk.sector_count() * cli.sector_size as u64)
    );

    let disk: Rc<dyn BlockDevice> = Rc::new(disk);
    let mut devices = DeviceMap::new();
    devices.insert(&cli.device, disk).map_err(status)?;
    let mut rt = Runtime::new(devices);

    let device = cli.device.canonicalize().disk_path().map_err(status)?;
    let result = match cli.command {
        Command::Partitions => partitions(&mut rt, &device, cli.sector_size),
        Command::Info { partition } => info(&mut rt, &device, partition),
        Command::Dump {
            partition,
            offset,
            length,
        } => dump(&mut rt, &device, partition, offset, length),
    };
    result.map_err(status)
}

fn open_partition(rt: &mut Runtime, device: &str, partition: u32) -> arc_types::Result<Handle> {
    rt.open(&device.with_partition(partition)?, OpenMode::ReadOnly)
}

fn partitions(rt: &mut Runtime, device: &str, sector_size: usize) -> arc_types::Result<()> {
    let disk = open_partition(rt, device, 0)?;
    let count = rt.count_partitions(disk)?;
    println!("{device}: {count} partitions");

    for number in 1..=count {
        match rt.resolve_partition(disk, number, sector_size) {
            Ok(extent) => println!(
                "  partition({number}): sectors {}..{} ({})",
                extent.start,
                extent.start + extent.count,
                ByteSizeIec(extent.count * sector_size as u64)
            ),
            Err(e) => println!("  partition({number}): {e}"),
        }
    }

    rt.close(disk)
}

fn info(rt: &mut Runtime, device: &str, partition: u32) -> arc_types::Result<()> {
    let handle = open_partition(rt, device, partition)?;
    let info = rt.get_file_information(handle)?;
    println!("{}", device.with_partition(partition)?);
    println!("  kind:     {:?}", info.kind);
    println!("  start:    {:#x}", info.start);
    println!("  end:      {:#x}", info.end);
    println!("  size:     {}", ByteSizeIec(info.len()));
    println!("  position: {}", info.position);
    rt.close(handle)
}

fn dump(
    rt: &mut Runtime,
    device: &str,
    partition: u32,
    offset: u64,
    length: usize,
) -> arc_types::Result<()> {
    let handle = open_partition(rt, device, partition)?;
    let offset_arg = i64::try_from(offset).map_err(|_| Error::TooBig)?;
    rt.seek(handle, offset_arg, SeekMode::Absolute)?;

    let mut buf = vec![0u8; length];
    let read = rt.read(handle, &mut buf)?;
    for (row, chunk) in buf[..read].chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let text: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        println!("{:08x}  {:<47}  |{text}|", offset + row as u64 * 16, hex.join(" "));
    }

    rt.close(handle)
}

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use soma_core::io::NrrdReader;

#[derive(Args)]
pub struct InfoArgs {
    /// Input NRRD movie
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let reader = NrrdReader::open(&args.file)?;
    let info = reader.source_info(&args.file);

    println!("File:        {}", info.filename.display());
    println!("Frames:      {}", info.total_frames);
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Sample type: {:?}", info.sample_type);
    println!("Bit depth:   {}", info.sample_type.bit_depth());
    println!(
        "Byte order:  {}",
        if info.little_endian { "little" } else { "big" }
    );

    let frame_bytes = reader.header.frame_byte_size();
    let total_mb = (frame_bytes * info.total_frames) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(())
}

use vrlens::read::{LensReader, LensReaderSettings};

use crate::CommonArgs;
use crate::prelude::*;

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    rarg: crate::ReadArgs,
    #[command(flatten)]
    inpath: crate::InputPath,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &InfoArgs,
) -> AnyResult<()> {
    let data = std::fs::read(&args_cmd.inpath.in_file)
        .context("Could not read input file")?;
    let reader = LensReader::init_with_settings(
        LensReaderSettings::from(&args_cmd.rarg),
        &data,
    )
    .context("Cannot decode file header")?;

    let header = *reader.header();
    println!("Revision:     {}", reader.revision());
    println!("Magic:        {:#010x}", { header.magic });
    println!("Version:      {:#06x}", { header.version });
    println!("Vertices:     {}", reader.n_vertices());
    println!("Indices:      {}", reader.n_indices());
    println!("File size:    {} bytes", data.len());
    match reader.expected_len() {
        Some(len) => println!("Expected:     {} bytes", len),
        None => println!("Expected:     (overflows)"),
    }

    Ok(())
}

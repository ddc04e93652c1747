use vrlens::read::{LensReader, LensReaderSettings};

use crate::CommonArgs;
use crate::prelude::*;

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    /// Tolerate trailing data and out-of-range indices, but warn about them
    #[arg(long)]
    lenient: bool,
    #[command(flatten)]
    inpath: crate::InputPath,
}

pub fn run(
    args_common: &CommonArgs,
    args_cmd: &VerifyArgs,
) -> AnyResult<()> {
    let strict = LensReaderSettings {
        allow_trailing_data: false,
        verify_indices: true,
    };
    if args_cmd.lenient {
        if let Err(e) = try_run(args_common, args_cmd, strict) {
            eprintln!("Error! {:#}", e);
            eprintln!("Warning! Trying again without strict checks.");
            try_run(args_common, args_cmd, LensReaderSettings::default())
        } else {
            Ok(())
        }
    } else {
        try_run(args_common, args_cmd, strict)
    }
}

pub fn try_run(
    args_common: &CommonArgs,
    args_cmd: &VerifyArgs,
    settings: LensReaderSettings,
) -> AnyResult<()> {
    let data = std::fs::read(&args_cmd.inpath.in_file)
        .context("Could not read input file")?;
    let reader = LensReader::init_with_settings(settings, &data)
        .context("Cannot decode file header")?;
    if args_common.verbose {
        eprintln!("File header OK, revision {}.", reader.revision());
    }
    let bufs = reader.into_flat_buffers()
        .context("Cannot split file data into vertex and index blocks")?;
    if args_common.verbose {
        eprintln!(
            "Vertex block {} bytes, index block {} bytes.",
            bufs.vertices.len(),
            bufs.indices.len(),
        );
    }
    let model = reader.decode()
        .context("Cannot decode file data")?;
    if args_common.verbose {
        eprintln!(
            "File data successfully decoded: {} vertices, {} indices.",
            model.n_vertices(),
            model.n_indices(),
        );
    }
    if model.n_indices() % 3 != 0 {
        eprintln!(
            "Warning! Index count {} is not a multiple of 3.",
            model.n_indices(),
        );
    }
    Ok(())
}

use std::fs::File;

use vrlens::mesh::LensModel;
use vrlens::io::{detect_stream, read_lens};
use vrlens::read::LensReaderSettings;
use vrlens::write::LensWriter;

use crate::prelude::*;

pub fn load_lens_file(
    path: &Path,
    settings: LensReaderSettings,
) -> AnyResult<LensModel> {
    let mut file = File::open(path)
        .with_context(|| format!("Could not open input file {:?}", path))?;
    let Some(revision) = detect_stream(&mut file)
        .with_context(|| format!("Could not read input file {:?}", path))?
    else {
        bail!("{:?} is not a lens model file", path);
    };
    tracing::debug!("{:?}: revision {}", path, revision);
    let model = read_lens(settings, &mut file)
        .with_context(|| format!("Cannot decode file data of {:?}", path))?;
    Ok(model)
}

pub fn create_output(path: &Path, overwrite: bool) -> AnyResult<File> {
    let file = if overwrite {
        File::create(path)
    } else {
        File::create_new(path)
    };
    file.with_context(|| format!("Could not open output file {:?}", path))
}

/// Encode fully in memory first so a failed encode leaves no partial file.
pub fn save_lens_file(
    writer: &LensWriter<'_>,
    path: &Path,
    overwrite: bool,
) -> AnyResult<()> {
    let bytes = writer.encode().context("Cannot encode output file")?;
    let mut outfile = create_output(path, overwrite)?;
    std::io::Write::write_all(&mut outfile, &bytes)
        .context("Cannot write output file")?;
    tracing::info!(
        "Wrote {:?}: revision {}, {} bytes",
        path,
        writer.settings().revision,
        bytes.len(),
    );
    Ok(())
}

use vrlens::read::LensReaderSettings;
use vrlens::write::{LensWriter, LensWriterSettings};

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::{load_lens_file, save_lens_file};

#[derive(clap::Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    rarg: crate::ReadArgs,
    #[command(flatten)]
    warg: crate::WriteArgs,
    #[command(flatten)]
    oarg: crate::OutputArgs,
    #[command(flatten)]
    outpath: crate::OutputPath,
    #[command(flatten)]
    inpaths: crate::InputPaths,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &MergeArgs,
) -> AnyResult<()> {
    if args_cmd.inpaths.in_files.is_empty() {
        bail!("No input files provided.");
    }
    let settings = LensWriterSettings::from(&args_cmd.warg);
    if !settings.revision.supports_multi_mesh() && args_cmd.inpaths.in_files.len() > 1 {
        tracing::warn!(
            "Revision {} keeps only the first mesh; only {:?} will be written",
            settings.revision,
            args_cmd.inpaths.in_files[0],
        );
    }

    let mut in_parsed = vec![];
    for inpath in args_cmd.inpaths.in_files.iter() {
        in_parsed.push(load_lens_file(
            inpath,
            LensReaderSettings::from(&args_cmd.rarg),
        )?);
    }

    let mut writer = LensWriter::new_with_settings(settings);
    for src in in_parsed.iter() {
        for m in src.meshes.iter() {
            writer.add_mesh(m.as_mesh_ref()).context("Cannot use mesh for output")?;
        }
    }

    save_lens_file(&writer, &args_cmd.outpath.out_file, args_cmd.oarg.overwrite)
}

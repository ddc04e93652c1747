use vrlens::read::LensReaderSettings;
use vrlens::write::{LensWriter, LensWriterSettings};

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::{load_lens_file, save_lens_file};

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    rarg: crate::ReadArgs,
    #[command(flatten)]
    warg: crate::WriteArgs,
    #[command(flatten)]
    oarg: crate::OutputArgs,
    #[command(flatten)]
    paths: crate::InOutPaths,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &ConvertArgs,
) -> AnyResult<()> {
    let model = load_lens_file(
        &args_cmd.paths.in_file,
        LensReaderSettings::from(&args_cmd.rarg),
    )?;

    let mut writer = LensWriter::new_with_settings(
        LensWriterSettings::from(&args_cmd.warg),
    );
    for m in model.meshes.iter() {
        writer.add_mesh(m.as_mesh_ref()).context("Cannot use mesh for output")?;
    }

    let outpath =
        args_cmd.paths.out_file.as_ref().unwrap_or(&args_cmd.paths.in_file);
    let overwrite = args_cmd.oarg.overwrite || args_cmd.paths.out_file.is_none();
    save_lens_file(&writer, outpath, overwrite)
}

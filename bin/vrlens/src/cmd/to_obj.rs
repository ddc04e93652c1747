use std::io::{BufWriter, Write};

use vrlens::mesh::LensMesh;
use vrlens::read::LensReaderSettings;

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::{create_output, load_lens_file};

#[derive(clap::Args, Debug)]
pub struct ToObjArgs {
    #[command(flatten)]
    rarg: crate::ReadArgs,
    #[command(flatten)]
    oarg: crate::OutputArgs,
    #[command(flatten)]
    inpath: crate::InputPath,
    #[command(flatten)]
    outpath: crate::OptOutputPath,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &ToObjArgs,
) -> AnyResult<()> {
    let model = load_lens_file(
        &args_cmd.inpath.in_file,
        LensReaderSettings::from(&args_cmd.rarg),
    )?;
    let Some(mesh) = model.first() else {
        bail!("File contains no mesh.");
    };

    match &args_cmd.outpath.out_file {
        Some(path) => {
            let outfile = create_output(path, args_cmd.oarg.overwrite)?;
            let mut bufout = BufWriter::new(outfile);
            write_obj(mesh, &mut bufout).context("Cannot write OBJ file")?;
            bufout.flush().context("Cannot write OBJ file")?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            write_obj(mesh, &mut stdout).context("Cannot write OBJ to stdout")?;
        }
    }
    Ok(())
}

fn write_obj(mesh: &LensMesh, out: &mut dyn Write) -> AnyResult<()> {
    writeln!(out, "# {} vertices, {} indices", mesh.n_vertices(), mesh.n_indices())?;
    for p in mesh.positions.iter() {
        writeln!(out, "v {} {} {}", p[0], p[1], p[2])?;
    }
    for uv in mesh.uvs.iter() {
        writeln!(out, "vt {} {}", uv[0], uv[1])?;
    }
    let n_vertices = mesh.n_vertices() as u32;
    let triangles = mesh.indices.chunks_exact(3);
    if !triangles.remainder().is_empty() {
        tracing::warn!(
            "Dropping {} indices that do not form a full triangle",
            triangles.remainder().len(),
        );
    }
    for tri in triangles {
        if let Some(bad) = tri.iter().find(|&&i| i >= n_vertices) {
            bail!("Index {} is past the last vertex", bad);
        }
        // OBJ indices are 1-based
        let [a, b, c] = [tri[0] + 1, tri[1] + 1, tri[2] + 1];
        writeln!(out, "f {a}/{a} {b}/{b} {c}/{c}")?;
    }
    Ok(())
}

use std::io::BufReader;

use obj::raw::object::Polygon;
use obj::raw::{RawObj, parse_obj};
use obj::{Obj, Position, TexturedVertex, Vertex};
use rapidhash::RapidHashMap;
use vrlens::mesh::LensMesh;
use vrlens::read::LensReaderSettings;
use vrlens::write::{LensWriter, LensWriterSettings};

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::{load_lens_file, save_lens_file};

#[derive(clap::Args, Debug)]
pub struct FromObjArgs {
    /// If the output lens file exists, add its geometry in front of the new meshes
    #[arg(short, long)]
    append: bool,
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
    args_cmd: &FromObjArgs,
) -> AnyResult<()> {
    if args_cmd.inpaths.in_files.is_empty() {
        bail!("No input files provided.");
    }

    let mut new_meshes = vec![];
    for path in args_cmd.inpaths.in_files.iter() {
        let infile = std::fs::File::open(path)
            .context("Cannot open input OBJ file")?;
        let rawobj = parse_obj(BufReader::new(infile))
            .context("Cannot parse OBJ file")?;
        let mesh = try_ptn(rawobj.clone())
            .or_else(|_| try_pt(&rawobj))
            .or_else(|_| try_pn(rawobj.clone()))
            .or_else(|_| try_p(rawobj.clone()))
            .context("OBJ file is not in any valid vertex format")?;
        tracing::debug!(
            "{:?}: {} vertices, {} indices",
            path,
            mesh.n_vertices(),
            mesh.n_indices(),
        );
        new_meshes.push(mesh);
    }

    let old_model;
    let appending = args_cmd.append && args_cmd.outpath.out_file.exists();
    let mut writer = LensWriter::new_with_settings(
        LensWriterSettings::from(&args_cmd.warg),
    );
    if appending {
        old_model = load_lens_file(
            &args_cmd.outpath.out_file,
            LensReaderSettings::from(&args_cmd.rarg),
        )
        .context("Cannot decode file to append to")?;
        for m in old_model.meshes.iter() {
            writer.add_mesh(m.as_mesh_ref()).context("Cannot use old mesh for output")?;
        }
    }

    for m in new_meshes.iter() {
        writer.add_mesh(m.as_mesh_ref()).context("New mesh is not valid")?;
    }

    save_lens_file(
        &writer,
        &args_cmd.outpath.out_file,
        args_cmd.oarg.overwrite || appending,
    )
}

/// Positions, texture coordinates, and normals. The normals are dropped
/// and the texture coordinates truncated to (u, v).
fn try_ptn(rawobj: RawObj) -> AnyResult<LensMesh> {
    let obj: Obj<TexturedVertex, u32> = Obj::new(rawobj)?;
    Ok(LensMesh {
        positions: obj.vertices.iter().map(|v| v.position).collect(),
        uvs: obj.vertices.iter().map(|v| [v.texture[0], v.texture[1]]).collect(),
        indices: obj.indices,
    })
}

/// Positions and texture coordinates without normals. Each distinct
/// (position, texture coordinate) pair becomes one vertex, in the order
/// the faces first use it.
fn try_pt(rawobj: &RawObj) -> AnyResult<LensMesh> {
    let mut mesh = LensMesh::default();
    let mut seen: RapidHashMap<(usize, usize), u32> = RapidHashMap::default();
    let mut corners = vec![];
    for polygon in rawobj.polygons.iter() {
        corners.clear();
        match polygon {
            Polygon::PT(vs) => corners.extend(vs.iter().copied()),
            Polygon::PTN(vs) => corners.extend(vs.iter().map(|&(p, t, _)| (p, t))),
            _ => bail!("Polygon without texture coordinates"),
        }
        if corners.len() < 3 {
            bail!("Polygon with fewer than 3 vertices");
        }
        let mut face = Vec::with_capacity(corners.len());
        for &(p, t) in corners.iter() {
            let index = match seen.get(&(p, t)) {
                Some(&index) => index,
                None => {
                    let Some(&(x, y, z, _)) = rawobj.positions.get(p) else {
                        bail!("Position index {} out of range", p + 1);
                    };
                    let Some(&(u, v, _)) = rawobj.tex_coords.get(t) else {
                        bail!("Texture coordinate index {} out of range", t + 1);
                    };
                    let index = u32::try_from(mesh.positions.len())
                        .context("Too many vertices")?;
                    mesh.positions.push([x, y, z]);
                    mesh.uvs.push([u, v]);
                    seen.insert((p, t), index);
                    index
                }
            };
            face.push(index);
        }
        for i in 1..face.len() - 1 {
            mesh.indices.extend([face[0], face[i], face[i + 1]]);
        }
    }
    Ok(mesh)
}

fn try_pn(rawobj: RawObj) -> AnyResult<LensMesh> {
    let no_uvs = rawobj.tex_coords.is_empty();
    let obj: Obj<Vertex, u32> = Obj::new(rawobj)?;
    if no_uvs {
        tracing::warn!("OBJ file has no texture coordinates; using (0, 0)");
    }
    Ok(LensMesh {
        uvs: vec![[0.0, 0.0]; obj.vertices.len()],
        positions: obj.vertices.iter().map(|v| v.position).collect(),
        indices: obj.indices,
    })
}

fn try_p(rawobj: RawObj) -> AnyResult<LensMesh> {
    let no_uvs = rawobj.tex_coords.is_empty();
    let obj: Obj<Position, u32> = Obj::new(rawobj)?;
    if no_uvs {
        tracing::warn!("OBJ file has no texture coordinates; using (0, 0)");
    }
    Ok(LensMesh {
        uvs: vec![[0.0, 0.0]; obj.vertices.len()],
        positions: obj.vertices.iter().map(|v| v.position).collect(),
        indices: obj.indices,
    })
}

use std::io::Write;

use crate::header::LensHeader;
use crate::mesh::*;
use crate::revision::Revision;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid mesh #{mesh}: {defect}")]
    InvalidMesh { mesh: usize, defect: MeshDefect },
    #[error("Too much geometry to fit the 32-bit counts of the format")]
    TooLarge,
    #[error("No source meshes provided")]
    EmptyInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LensWriterSettings {
    /// Layout to write.
    pub revision: Revision,
    /// Reject meshes with indices past their own vertex count.
    ///
    /// Positions and UVs must line up regardless of this setting, as the
    /// interleaved layout cannot be written otherwise.
    pub validate_meshes: bool,
}

impl Default for LensWriterSettings {
    fn default() -> Self {
        Self {
            revision: Revision::A,
            validate_meshes: true,
        }
    }
}

pub struct LensWriter<'s> {
    settings: LensWriterSettings,
    src_meshes: Vec<LensMeshRef<'s>>,
}

impl<'s> LensWriter<'s> {
    pub fn new() -> Self {
        Self::new_with_settings(Default::default())
    }

    pub fn new_with_settings(settings: LensWriterSettings) -> Self {
        Self {
            settings,
            src_meshes: vec![],
        }
    }

    pub fn settings(&self) -> &LensWriterSettings {
        &self.settings
    }

    pub fn add_mesh(
        &mut self,
        mesh: LensMeshRef<'s>,
    ) -> Result<(), WriteError> {
        if !self.settings.revision.supports_multi_mesh() && !self.src_meshes.is_empty() {
            // Never written; only counted by `discarded_meshes`.
            self.src_meshes.push(mesh);
            return Ok(());
        }
        let checked = if self.settings.validate_meshes {
            mesh.validate()
        } else {
            mesh.check_layout()
        };
        checked.map_err(|defect| WriteError::InvalidMesh {
            mesh: self.src_meshes.len(),
            defect,
        })?;
        self.src_meshes.push(mesh);
        Ok(())
    }

    pub fn with_mesh(
        mut self,
        mesh: LensMeshRef<'s>,
    ) -> Result<Self, WriteError> {
        self.add_mesh(mesh)?;
        Ok(self)
    }

    pub fn n_meshes(&self) -> usize {
        self.src_meshes.len()
    }

    /// The meshes that will actually end up in the output.
    ///
    /// Revision A collapses all of them. Revision B only ever writes the
    /// first one and silently leaves the rest out.
    pub fn meshes_to_write(&self) -> &[LensMeshRef<'s>] {
        if self.settings.revision.supports_multi_mesh() {
            &self.src_meshes
        } else {
            &self.src_meshes[..self.src_meshes.len().min(1)]
        }
    }

    /// How many added meshes will be left out of the output.
    pub fn discarded_meshes(&self) -> usize {
        self.src_meshes.len() - self.meshes_to_write().len()
    }

    /// For each written mesh, the number of vertices written before it.
    ///
    /// Adding this to a mesh's own indices moves them into the single
    /// flattened vertex space of the file.
    pub fn gen_base_vertices(&self) -> Result<Vec<u32>, WriteError> {
        let meshes = self.meshes_to_write();
        let mut r = Vec::with_capacity(meshes.len());
        let mut base_vertex: u32 = 0;
        for m in meshes {
            r.push(base_vertex);
            base_vertex = u32::try_from(m.n_vertices())
                .ok()
                .and_then(|n| base_vertex.checked_add(n))
                .ok_or(WriteError::TooLarge)?;
        }
        Ok(r)
    }

    fn compute_counts(&self) -> Result<(u32, u32), WriteError> {
        let meshes = self.meshes_to_write();
        let n_vertices: usize = meshes.iter().map(|m| m.n_vertices()).sum();
        let n_indices: usize = meshes.iter().map(|m| m.n_indices()).sum();
        Ok((
            u32::try_from(n_vertices).map_err(|_| WriteError::TooLarge)?,
            u32::try_from(n_indices).map_err(|_| WriteError::TooLarge)?,
        ))
    }

    /// Exact size of the encoded output in bytes.
    pub fn encoded_len(&self) -> Result<usize, WriteError> {
        let (n_vertices, n_indices) = self.compute_counts()?;
        self.settings
            .revision
            .descriptor()
            .payload_size(n_vertices, n_indices)
            .and_then(|len| len.checked_add(LensHeader::encoded_len()))
            .ok_or(WriteError::TooLarge)
    }

    /// Encode everything into a freshly allocated buffer.
    pub fn encode(&self) -> Result<Vec<u8>, WriteError> {
        let meshes = self.meshes_to_write();
        if meshes.is_empty() {
            return Err(WriteError::EmptyInput);
        }
        let discarded = self.discarded_meshes();
        if discarded > 0 {
            tracing::warn!(
                "Revision {} holds a single mesh; discarding {} of {} meshes",
                self.settings.revision,
                discarded,
                self.src_meshes.len(),
            );
        }

        let revision = self.settings.revision;
        let desc = revision.descriptor();
        let (n_vertices, n_indices) = self.compute_counts()?;
        let base_vertices = self.gen_base_vertices()?;
        let total_len = self.encoded_len()?;

        let mut out = Vec::with_capacity(total_len);
        out.extend_from_slice(
            LensHeader::new(revision, n_vertices, n_indices).to_le().as_bytes(),
        );

        // The index block comes after every vertex, so all vertices go
        // first, mesh by mesh.
        for m in meshes {
            for (pos, uv) in m.positions.iter().zip(m.uvs) {
                for c in pos {
                    out.extend_from_slice(&c.to_le_bytes());
                }
                out.extend_from_slice(&uv[0].to_le_bytes());
                out.extend_from_slice(&uv[1].to_le_bytes());
                for _ in 2..desc.uv_components {
                    out.extend_from_slice(&0f32.to_le_bytes());
                }
            }
        }
        for (m, base_vertex) in meshes.iter().zip(base_vertices) {
            for &i in m.indices {
                let i = base_vertex.checked_add(i).ok_or(WriteError::TooLarge)?;
                out.extend_from_slice(&i.to_le_bytes());
            }
        }
        debug_assert_eq!(out.len(), total_len);

        tracing::debug!(
            "Encoded {} meshes as lens model revision {}: {} vertices, {} indices, {} bytes",
            meshes.len(),
            revision,
            n_vertices,
            n_indices,
            out.len(),
        );
        Ok(out)
    }

    /// Encode and write the result in one go.
    ///
    /// Nothing is written unless encoding succeeds as a whole.
    pub fn write_to(
        &self,
        write: &mut dyn Write,
    ) -> Result<(), WriteError> {
        let bytes = self.encode()?;
        write.write_all(&bytes)?;
        Ok(())
    }
}

impl Default for LensWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `meshes` as the given revision with default settings otherwise.
pub fn encode(meshes: &[LensMesh], revision: Revision) -> Result<Vec<u8>, WriteError> {
    let mut writer = LensWriter::new_with_settings(LensWriterSettings {
        revision,
        ..Default::default()
    });
    for m in meshes {
        writer.add_mesh(m.as_mesh_ref())?;
    }
    writer.encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(n_vertices: usize, indices: &[u32]) -> LensMesh {
        LensMesh {
            positions: (0..n_vertices).map(|i| [i as f32, 0.0, 0.0]).collect(),
            uvs: (0..n_vertices).map(|i| [0.0, i as f32]).collect(),
            indices: indices.to_vec(),
        }
    }

    fn index_block(bytes: &[u8], n_indices: usize) -> Vec<u32> {
        bytes[bytes.len() - n_indices * 4..]
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    #[test]
    fn base_vertices_are_running_totals() {
        let a = mesh(3, &[0, 1, 2]);
        let b = mesh(2, &[0, 1]);
        let c = mesh(4, &[]);
        let writer = LensWriter::new()
            .with_mesh(a.as_mesh_ref())
            .unwrap()
            .with_mesh(b.as_mesh_ref())
            .unwrap()
            .with_mesh(c.as_mesh_ref())
            .unwrap();
        assert_eq!(writer.gen_base_vertices().unwrap(), vec![0, 3, 5]);
    }

    #[test]
    fn indices_are_renumbered_into_one_space() {
        let meshes = [mesh(3, &[0, 1, 2]), mesh(2, &[0, 1])];
        let bytes = encode(&meshes, Revision::A).unwrap();
        assert_eq!(bytes.len(), 16 + 5 * 20 + 5 * 4);
        assert_eq!(index_block(&bytes, 5), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_input_is_rejected() {
        for rev in Revision::ALL {
            assert!(matches!(encode(&[], rev), Err(WriteError::EmptyInput)));
        }
    }

    #[test]
    fn empty_mesh_encodes_to_preamble_only() {
        let bytes = encode(&[LensMesh::default()], Revision::A).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[8..16], &[0u8; 8]);
    }

    #[test]
    fn revision_b_writes_only_the_first_mesh() {
        let a = mesh(3, &[0, 1, 2]);
        let b = mesh(2, &[0, 1]);
        let writer = LensWriter::new_with_settings(LensWriterSettings {
            revision: Revision::B,
            ..Default::default()
        })
        .with_mesh(a.as_mesh_ref())
        .unwrap()
        .with_mesh(b.as_mesh_ref())
        .unwrap();
        assert_eq!(writer.n_meshes(), 2);
        assert_eq!(writer.discarded_meshes(), 1);

        let bytes = writer.encode().unwrap();
        assert_eq!(bytes.len(), 16 + 3 * 24 + 3 * 4);
        assert_eq!(&bytes[8..12], &3u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &3u32.to_le_bytes());
        assert_eq!(index_block(&bytes, 3), vec![0, 1, 2]);
    }

    #[test]
    fn revision_b_ignores_defects_in_discarded_meshes() {
        let first = mesh(3, &[0, 1, 2]);
        let bad_index = mesh(2, &[0, 5]);
        let mut bad_uvs = mesh(2, &[0, 1]);
        bad_uvs.uvs.pop();

        let bytes = encode(&[first.clone(), bad_index, bad_uvs], Revision::B).unwrap();
        assert_eq!(bytes.len(), 16 + 3 * 24 + 3 * 4);
        assert_eq!(index_block(&bytes, 3), vec![0, 1, 2]);

        let broken_first = mesh(2, &[0, 5]);
        let mut writer = LensWriter::new_with_settings(LensWriterSettings {
            revision: Revision::B,
            ..Default::default()
        });
        assert!(matches!(
            writer.add_mesh(broken_first.as_mesh_ref()),
            Err(WriteError::InvalidMesh { mesh: 0, .. })
        ));
        writer.add_mesh(first.as_mesh_ref()).unwrap();
        writer.add_mesh(broken_first.as_mesh_ref()).unwrap();
        assert_eq!(writer.discarded_meshes(), 1);
    }

    #[test]
    fn revision_b_pads_uv_record_with_zero() {
        let m = LensMesh {
            positions: vec![[1.0, 2.0, 3.0]],
            uvs: vec![[0.5, 0.25]],
            indices: vec![0],
        };
        let bytes = encode(&[m], Revision::B).unwrap();
        let vertex = &bytes[16..40];
        assert_eq!(&vertex[12..16], &0.5f32.to_le_bytes());
        assert_eq!(&vertex[16..20], &0.25f32.to_le_bytes());
        assert_eq!(&vertex[20..24], &0f32.to_le_bytes());
    }

    #[test]
    fn invalid_meshes_are_rejected_on_add() {
        let mut bad_uvs = mesh(3, &[0, 1, 2]);
        bad_uvs.uvs.pop();
        let bad_index = mesh(3, &[0, 1, 3]);
        let good = mesh(1, &[0]);

        let mut writer = LensWriter::new();
        writer.add_mesh(good.as_mesh_ref()).unwrap();
        match writer.add_mesh(bad_index.as_mesh_ref()) {
            Err(WriteError::InvalidMesh {
                mesh: 1,
                defect: MeshDefect::IndexOutOfRange { position: 2, index: 3 },
            }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            writer.add_mesh(bad_uvs.as_mesh_ref()),
            Err(WriteError::InvalidMesh { mesh: 1, .. })
        ));
        assert_eq!(writer.n_meshes(), 1);
    }

    #[test]
    fn unvalidated_writer_still_checks_layout() {
        let settings = LensWriterSettings {
            validate_meshes: false,
            ..Default::default()
        };
        let bad_index = mesh(3, &[0, 1, 7]);
        let mut bad_uvs = mesh(3, &[0, 1, 2]);
        bad_uvs.uvs.clear();

        let mut writer = LensWriter::new_with_settings(settings);
        writer.add_mesh(bad_index.as_mesh_ref()).unwrap();
        assert!(writer.add_mesh(bad_uvs.as_mesh_ref()).is_err());
        let bytes = writer.encode().unwrap();
        assert_eq!(index_block(&bytes, 3), vec![0, 1, 7]);
    }

    #[test]
    fn write_to_emits_the_encoded_bytes() {
        let m = mesh(3, &[0, 1, 2]);
        let writer = LensWriter::new().with_mesh(m.as_mesh_ref()).unwrap();
        let mut out = vec![];
        writer.write_to(&mut out).unwrap();
        assert_eq!(out, writer.encode().unwrap());
        assert_eq!(out.len(), writer.encoded_len().unwrap());
    }

    #[test]
    fn empty_writer_writes_nothing() {
        let mut out = vec![];
        assert!(LensWriter::new().write_to(&mut out).is_err());
        assert!(out.is_empty());
    }
}

/// An owned triangle mesh: positions, parallel UVs, and zero-based indices.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LensMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// Borrowed view of a mesh, used by the writer so callers can encode
/// their own buffers without copying them first.
#[derive(Debug, Default, Clone, Copy)]
pub struct LensMeshRef<'s> {
    pub positions: &'s [[f32; 3]],
    pub uvs: &'s [[f32; 2]],
    pub indices: &'s [u32],
}

/// Everything stored in (or about to be written to) one lens model file.
///
/// A decoded file always yields exactly one mesh; the format has no
/// sub-mesh concept on disk.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LensModel {
    pub meshes: Vec<LensMesh>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshDefect {
    /// Positions and UVs differ in length.
    UvCountMismatch { positions: usize, uvs: usize },
    /// An index points past the last vertex.
    IndexOutOfRange { position: usize, index: u32 },
}

impl LensMesh {
    pub fn as_mesh_ref(&self) -> LensMeshRef<'_> {
        LensMeshRef {
            positions: &self.positions,
            uvs: &self.uvs,
            indices: &self.indices,
        }
    }

    pub fn n_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn n_indices(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.indices.is_empty()
    }

    /// Positions in draw order, i.e. looked up through the index list.
    ///
    /// Out-of-range indices yield `None` for that slot.
    pub fn indexed_positions(&self) -> impl Iterator<Item = Option<[f32; 3]>> + '_ {
        self.indices
            .iter()
            .map(|&i| self.positions.get(i as usize).copied())
    }
}

impl<'s> LensMeshRef<'s> {
    pub fn n_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn n_indices(&self) -> usize {
        self.indices.len()
    }

    /// Check that the positions and UVs line up.
    pub fn check_layout(&self) -> Result<(), MeshDefect> {
        if self.positions.len() != self.uvs.len() {
            return Err(MeshDefect::UvCountMismatch {
                positions: self.positions.len(),
                uvs: self.uvs.len(),
            });
        }
        Ok(())
    }

    /// Check the layout, then that every index stays inside the mesh.
    pub fn validate(&self) -> Result<(), MeshDefect> {
        self.check_layout()?;
        let n_vertices = self.n_vertices();
        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, i)| **i as usize >= n_vertices)
        {
            return Err(MeshDefect::IndexOutOfRange { position, index });
        }
        Ok(())
    }
}

impl<'s> From<&'s LensMesh> for LensMeshRef<'s> {
    fn from(mesh: &'s LensMesh) -> Self {
        mesh.as_mesh_ref()
    }
}

impl LensModel {
    pub fn n_vertices(&self) -> usize {
        self.meshes.iter().map(|m| m.n_vertices()).sum()
    }

    pub fn n_indices(&self) -> usize {
        self.meshes.iter().map(|m| m.n_indices()).sum()
    }

    /// The single mesh of a decoded file.
    pub fn first(&self) -> Option<&LensMesh> {
        self.meshes.first()
    }

    pub fn into_single(self) -> Option<LensMesh> {
        self.meshes.into_iter().next()
    }
}

impl std::fmt::Display for MeshDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshDefect::UvCountMismatch { positions, uvs } => {
                write!(f, "{} positions but {} UVs", positions, uvs)
            }
            MeshDefect::IndexOutOfRange { position, index } => {
                write!(f, "index #{} is {}, past the last vertex", position, index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> LensMesh {
        LensMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn valid_triangle() {
        assert_eq!(triangle().as_mesh_ref().validate(), Ok(()));
    }

    #[test]
    fn uv_mismatch_is_a_layout_defect() {
        let mut mesh = triangle();
        mesh.uvs.pop();
        assert_eq!(
            mesh.as_mesh_ref().check_layout(),
            Err(MeshDefect::UvCountMismatch { positions: 3, uvs: 2 })
        );
    }

    #[test]
    fn index_past_end_is_reported_with_position() {
        let mut mesh = triangle();
        mesh.indices = vec![0, 1, 2, 2, 3, 0];
        assert_eq!(mesh.as_mesh_ref().check_layout(), Ok(()));
        assert_eq!(
            mesh.as_mesh_ref().validate(),
            Err(MeshDefect::IndexOutOfRange { position: 4, index: 3 })
        );
        let lookups: Vec<_> = mesh.indexed_positions().collect();
        assert_eq!(lookups[4], None);
        assert_eq!(lookups[3], Some([0.0, 1.0, 0.0]));
    }
}

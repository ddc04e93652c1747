/// On-disk layout variants of the lens model format.
///
/// Both revisions share the same preamble and index block. They differ
/// only in how wide the UV record inside each vertex is, which makes them
/// binary incompatible with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Revision {
    /// Stride 20: position (3x f32) followed by UV (2x f32).
    ///
    /// The writer collapses any number of sub-meshes into one buffer.
    A,
    /// Stride 24: position (3x f32) followed by a 3x f32 UV record,
    /// of which only (u, v) carry meaning.
    ///
    /// The writer only ever encodes the first sub-mesh.
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevisionDescriptor {
    pub magic: u32,
    pub version: u32,
    /// Distance in bytes between consecutive vertex records.
    pub stride: usize,
    /// Number of f32 UV components stored per vertex.
    pub uv_components: usize,
    /// Whether the writer collapses several sub-meshes, or keeps only the
    /// first one.
    pub multi_mesh: bool,
}

/// Every supported revision, in declaration order of [`Revision`].
pub const REVISIONS: &[(Revision, RevisionDescriptor)] = &[
    (
        Revision::A,
        RevisionDescriptor {
            magic: crate::MAGIC,
            version: 0x1010,
            stride: 20,
            uv_components: 2,
            multi_mesh: true,
        },
    ),
    (
        Revision::B,
        RevisionDescriptor {
            magic: crate::MAGIC,
            version: 0x1000,
            stride: 24,
            uv_components: 3,
            multi_mesh: false,
        },
    ),
];

/// Bytes taken by a vertex position on the wire.
pub const POSITION_SIZE: usize = 12;
/// Bytes taken by a single index on the wire.
pub const INDEX_SIZE: usize = 4;

impl Revision {
    pub const ALL: [Revision; 2] = [Revision::A, Revision::B];

    pub const fn descriptor(self) -> RevisionDescriptor {
        REVISIONS[self as usize].1
    }

    pub fn lookup(magic: u32, version: u32) -> Option<Revision> {
        REVISIONS
            .iter()
            .find(|(_, desc)| desc.magic == magic && desc.version == version)
            .map(|(rev, _)| *rev)
    }

    pub const fn stride(self) -> usize {
        self.descriptor().stride
    }

    /// Whether the writer for this revision can collapse several sub-meshes.
    pub const fn supports_multi_mesh(self) -> bool {
        self.descriptor().multi_mesh
    }
}

impl RevisionDescriptor {
    /// Size of the vertex block, or `None` if it would overflow.
    pub fn vertex_block_size(&self, n_vertices: u32) -> Option<usize> {
        (n_vertices as usize).checked_mul(self.stride)
    }

    pub fn index_block_size(&self, n_indices: u32) -> Option<usize> {
        (n_indices as usize).checked_mul(INDEX_SIZE)
    }

    /// Size of the vertex and index blocks together (everything after the
    /// 16-byte preamble).
    pub fn payload_size(&self, n_vertices: u32, n_indices: u32) -> Option<usize> {
        self.vertex_block_size(n_vertices)?
            .checked_add(self.index_block_size(n_indices)?)
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Revision::A => "A",
            Revision::B => "B",
        };
        let desc = self.descriptor();
        write!(f, "{} (version {:#06x}, stride {})", name, desc.version, desc.stride)
    }
}

use crate::header::{HeaderParseError, LensHeader};
use crate::mesh::{LensMesh, LensModel, MeshDefect};
use crate::revision::{INDEX_SIZE, POSITION_SIZE, Revision};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Not a lens model file of a supported revision")]
    NotThisFormat,
    #[error("Cannot decode header: {0}")]
    Header(#[from] HeaderParseError),
    #[error("Data ends too early: need {needed} bytes, have {available}")]
    TruncatedData { needed: usize, available: usize },
    #[error("Unexpected extra data: {extra} bytes after the index block")]
    TooMuchData { extra: usize },
    #[error("Index #{position} is {index}, but there are only {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LensReaderSettings {
    /// Ignore bytes after the index block instead of failing.
    pub allow_trailing_data: bool,
    /// Check every index against the vertex count after decoding.
    ///
    /// Off by default: out-of-range indices are left for the renderer
    /// to deal with.
    pub verify_indices: bool,
}

impl Default for LensReaderSettings {
    fn default() -> Self {
        Self {
            allow_trailing_data: true,
            verify_indices: false,
        }
    }
}

/// The vertex and index blocks of a file, sliced out of the input but
/// not yet interpreted.
#[derive(Default, Clone, Copy)]
pub struct DecodedBuffers<'s> {
    pub vertices: &'s [u8],
    pub indices: &'s [u8],
    /// Bytes after the index block (empty for well-formed files).
    pub trailing: &'s [u8],
}

pub struct LensReader<'s> {
    buf: &'s [u8],
    header: LensHeader,
    revision: Revision,
    settings: LensReaderSettings,
}

impl<'s> LensReader<'s> {
    /// Detect the revision of `buf` and parse its header.
    pub fn init(buf: &'s [u8]) -> Result<Self, ReadError> {
        Self::init_with_settings(Default::default(), buf)
    }

    pub fn init_with_settings(
        settings: LensReaderSettings,
        buf: &'s [u8],
    ) -> Result<Self, ReadError> {
        let revision = detect_revision(buf).ok_or(ReadError::NotThisFormat)?;
        Self::init_as(settings, revision, buf)
    }

    /// Parse `buf` as a specific revision, without trying the others.
    pub fn init_as(
        settings: LensReaderSettings,
        revision: Revision,
        buf: &'s [u8],
    ) -> Result<Self, ReadError> {
        if !detect(buf, revision) {
            return Err(ReadError::NotThisFormat);
        }
        let header_len = LensHeader::encoded_len();
        if buf.len() < header_len {
            return Err(ReadError::TruncatedData {
                needed: header_len,
                available: buf.len(),
            });
        }
        let header = LensHeader::from_bytes(&buf[..header_len])?;
        Ok(Self {
            buf,
            header,
            revision,
            settings,
        })
    }

    pub fn header(&self) -> &LensHeader {
        &self.header
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn n_vertices(&self) -> u32 {
        self.header.n_vertices
    }

    pub fn n_indices(&self) -> u32 {
        self.header.n_indices
    }

    /// Total number of bytes the header claims the file occupies.
    pub fn expected_len(&self) -> Option<usize> {
        self.revision
            .descriptor()
            .payload_size(self.header.n_vertices, self.header.n_indices)?
            .checked_add(LensHeader::encoded_len())
    }

    /// Slice the payload into its vertex and index blocks, checking that
    /// the declared counts fit inside the buffer.
    pub fn into_flat_buffers(&self) -> Result<DecodedBuffers<'s>, ReadError> {
        let desc = self.revision.descriptor();
        let payload = &self.buf[LensHeader::encoded_len()..];
        let (Some(vertex_size), Some(index_size)) = (
            desc.vertex_block_size(self.header.n_vertices),
            desc.index_block_size(self.header.n_indices),
        ) else {
            return Err(ReadError::TruncatedData {
                needed: usize::MAX,
                available: payload.len(),
            });
        };
        let needed = vertex_size.saturating_add(index_size);
        if payload.len() < needed {
            return Err(ReadError::TruncatedData {
                needed,
                available: payload.len(),
            });
        }
        let (vertices, rest) = payload.split_at(vertex_size);
        let (indices, trailing) = rest.split_at(index_size);
        if !trailing.is_empty() && !self.settings.allow_trailing_data {
            return Err(ReadError::TooMuchData {
                extra: trailing.len(),
            });
        }
        Ok(DecodedBuffers {
            vertices,
            indices,
            trailing,
        })
    }

    /// Decode the file into a model holding a single mesh.
    pub fn decode(&self) -> Result<LensModel, ReadError> {
        let buffers = self.into_flat_buffers()?;
        let stride = self.revision.stride();
        let n_vertices = self.header.n_vertices as usize;

        let mut mesh = LensMesh {
            positions: Vec::with_capacity(n_vertices),
            uvs: Vec::with_capacity(n_vertices),
            indices: Vec::with_capacity(self.header.n_indices as usize),
        };
        for v in buffers.vertices.chunks_exact(stride) {
            mesh.positions.push([read_f32(&v[0..]), read_f32(&v[4..]), read_f32(&v[8..])]);
            // Anything past (u, v) is stride padding.
            mesh.uvs.push([
                read_f32(&v[POSITION_SIZE..]),
                read_f32(&v[POSITION_SIZE + 4..]),
            ]);
        }
        mesh.indices.extend(
            buffers
                .indices
                .chunks_exact(INDEX_SIZE)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );

        if self.settings.verify_indices {
            if let Err(MeshDefect::IndexOutOfRange { position, index }) =
                mesh.as_mesh_ref().validate()
            {
                return Err(ReadError::IndexOutOfRange {
                    position,
                    index,
                    vertex_count: n_vertices,
                });
            }
        }

        tracing::debug!(
            "Decoded lens model revision {}: {} vertices, {} indices",
            self.revision,
            mesh.n_vertices(),
            mesh.n_indices(),
        );
        Ok(LensModel { meshes: vec![mesh] })
    }
}

/// Check whether `buf` starts with the header of the given revision.
///
/// Never looks past the first 8 bytes. Short input is simply not a match.
pub fn detect(buf: &[u8], revision: Revision) -> bool {
    let Some((magic, version)) = peek_magic_version(buf) else {
        return false;
    };
    let desc = revision.descriptor();
    magic == desc.magic && version == desc.version
}

/// Find which supported revision, if any, `buf` is an instance of.
pub fn detect_revision(buf: &[u8]) -> Option<Revision> {
    let (magic, version) = peek_magic_version(buf)?;
    Revision::lookup(magic, version)
}

/// Decode `buf` as the given revision with default settings.
pub fn decode(buf: &[u8], revision: Revision) -> Result<LensModel, ReadError> {
    decode_with_settings(Default::default(), buf, revision)
}

pub fn decode_with_settings(
    settings: LensReaderSettings,
    buf: &[u8],
    revision: Revision,
) -> Result<LensModel, ReadError> {
    LensReader::init_as(settings, revision, buf)?.decode()
}

fn peek_magic_version(buf: &[u8]) -> Option<(u32, u32)> {
    let b = buf.get(..8)?;
    Some((
        u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        u32::from_le_bytes([b[4], b[5], b[6], b[7]]),
    ))
}

fn read_f32(b: &[u8]) -> f32 {
    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

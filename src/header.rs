use crate::revision::Revision;

/// The fixed 16-byte preamble of every lens model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
pub struct LensHeader {
    pub magic: u32,
    pub version: u32,
    pub n_vertices: u32,
    pub n_indices: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum HeaderParseError {
    #[error("Bytes array cannot be reinterpreted/cast: {0}")]
    Bytemuck(bytemuck::PodCastError),
}

impl LensHeader {
    pub fn new(revision: Revision, n_vertices: u32, n_indices: u32) -> Self {
        let desc = revision.descriptor();
        Self {
            magic: desc.magic,
            version: desc.version,
            n_vertices,
            n_indices,
        }
    }

    pub const fn encoded_len() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Parse the header from exactly [`Self::encoded_len`] bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, HeaderParseError> {
        let raw_header: &LensHeader = bytemuck::try_from_bytes(buf)
            .map_err(HeaderParseError::Bytemuck)?;
        Ok(raw_header.to_le())
    }

    /// Byte-swap every field between native and little-endian order.
    /// A no-op on little-endian targets.
    pub fn to_le(&self) -> Self {
        Self {
            magic: self.magic.to_le(),
            version: self.version.to_le(),
            n_vertices: self.n_vertices.to_le(),
            n_indices: self.n_indices.to_le(),
        }
    }

    /// Raw bytes as laid out in memory. Call [`Self::to_le`] first when the
    /// result is going to disk.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn revision(&self) -> Option<Revision> {
        Revision::lookup(self.magic, self.version)
    }
}

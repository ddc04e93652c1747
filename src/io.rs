use std::io::{ErrorKind, Read, Seek};

use crate::mesh::LensModel;
use crate::read::{LensReader, LensReaderSettings, ReadError};
use crate::revision::Revision;

pub trait ReadSeek: Read + Seek {
}

impl<T: Read + Seek> ReadSeek for T {}

/// Peek at the start of a stream to find the revision of a lens model,
/// leaving the stream rewound.
///
/// Streams shorter than the 8 identifying bytes are not lens models.
pub fn detect_stream(read: &mut dyn ReadSeek) -> Result<Option<Revision>, ReadError> {
    read.rewind()?;
    let mut magic = [0; 8];
    let r = match read.read_exact(&mut magic) {
        Ok(()) => crate::read::detect_revision(&magic),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => None,
        Err(e) => return Err(e.into()),
    };
    read.rewind()?;
    Ok(r)
}

/// Buffer the whole stream and decode it.
pub fn read_lens(
    settings: LensReaderSettings,
    read: &mut dyn Read,
) -> Result<LensModel, ReadError> {
    let mut buf = vec![];
    read.read_to_end(&mut buf)?;
    LensReader::init_with_settings(settings, &buf)?.decode()
}

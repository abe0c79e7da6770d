use std::path::Path;

use crate::{error::Error, reader::ArchiveReader, worker};

/// Decompresses a 7z archive file to a destination directory.
///
/// Convenience wrapper around [`ArchiveReader::open`] + [`crate::extractall`].
pub fn decompress_file(src_path: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<(), Error> {
    let file = std::fs::File::open(src_path.as_ref())
        .map_err(|e| Error::file_open(e, src_path.as_ref().to_string_lossy().to_string()))?;
    decompress(file, dest)
}

/// Decompresses a 7z archive from a reader to a destination directory.
pub fn decompress<R: std::io::Read + std::io::Seek>(src_reader: R, dest: impl AsRef<Path>) -> Result<(), Error> {
    let mut reader = ArchiveReader::new(src_reader)?;
    worker::extractall(&mut reader, dest.as_ref())
}

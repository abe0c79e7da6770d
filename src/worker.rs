//! Extraction worker: routes a block's decompressed substreams to their destinations.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Read, Seek},
    path::{Component, Path, PathBuf},
};

use rayon::prelude::*;

use crate::{
    archive::ArchiveEntry,
    error::Error,
    reader::{ArchiveReader, BlockDecoder},
};

/// Destination for a single extracted entry's bytes.
pub enum FileSink {
    /// Write to a path on disk, creating parent directories as needed.
    Path(PathBuf),
    /// Append to an in-memory buffer.
    Buffer(Vec<u8>),
    /// Read and discard (used by [`test`] to force CRC verification without writing anything).
    Discard,
}

impl FileSink {
    fn consume(&mut self, entry: &ArchiveEntry, reader: &mut dyn Read) -> Result<(), Error> {
        match self {
            FileSink::Path(path) => write_to_path(entry, reader, path),
            FileSink::Buffer(buf) => {
                reader.read_to_end(buf).map_err(Error::io)?;
                Ok(())
            }
            FileSink::Discard => {
                io::copy(reader, &mut io::sink()).map_err(Error::io)?;
                Ok(())
            }
        }
    }
}

fn write_to_path(entry: &ArchiveEntry, reader: &mut dyn Read, path: &Path) -> Result<(), Error> {
    if entry.is_anti_item() {
        if path.is_dir() {
            fs::remove_dir_all(path).map_err(Error::io)?;
        } else {
            let _ = fs::remove_file(path);
        }
        return Ok(());
    }
    if entry.is_directory() {
        fs::create_dir_all(path).map_err(Error::io)?;
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(Error::io)?;
        }
    }

    if entry.is_symlink() {
        let mut target = Vec::new();
        reader.read_to_end(&mut target).map_err(Error::io)?;
        let target = String::from_utf8(target).map_err(|e| Error::bad_header(e.to_string()))?;
        let _ = fs::remove_file(path);
        return create_symlink(&target, path);
    }

    let file = File::create(path).map_err(|e| Error::file_open(e, path.to_string_lossy().to_string()))?;
    let mut writer = BufWriter::new(file);
    io::copy(reader, &mut writer).map_err(Error::io)?;
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &str, path: &Path) -> Result<(), Error> {
    std::os::unix::fs::symlink(target, path).map_err(Error::io)
}

#[cfg(not(unix))]
fn create_symlink(target: &str, path: &Path) -> Result<(), Error> {
    fs::write(path, target.as_bytes()).map_err(Error::io)
}

/// Joins `dest` with an archive entry's name, rejecting any name that would resolve outside of
/// `dest` (`..` components, absolute paths, or a root/prefix component).
pub(crate) fn safe_join(dest: &Path, name: &str) -> Result<PathBuf, Error> {
    let normalized = name.replace('\\', "/");
    let mut out = dest.to_path_buf();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PathEscape(name.to_string()));
            }
        }
    }
    Ok(out)
}

/// Whether `extractall_parallel` can safely decode `archive`'s blocks out of order: more than one
/// block, exactly one pack stream per folder, and no two entries sharing an output name (so
/// "last entry wins" ordering can't be disturbed by decoding blocks concurrently).
fn can_parallelize(archive: &crate::archive::Archive) -> bool {
    if archive.blocks.len() <= 1 {
        return false;
    }
    if archive.pack_sizes.len() != archive.blocks.len() {
        return false;
    }
    let mut seen_names = std::collections::HashSet::new();
    archive.files.iter().all(|f| seen_names.insert(f.name.as_str()))
}

/// Verifies every pack-stream CRC (when present) and decompresses every folder, without writing
/// any output.
///
/// Returns `Ok(false)` if any pack stream or folder fails its CRC check; keeps testing the
/// remaining streams/folders rather than stopping at the first failure. Structural errors (bad
/// header, unsupported coder) still abort immediately as `Err`.
pub fn test<R: Read + Seek>(reader: &mut ArchiveReader<R>) -> Result<bool, Error> {
    let mut ok = reader.verify_pack_crcs()?;
    reader.for_each_entries(|_entry, data| match io::copy(data, &mut io::sink()) {
        Ok(_) => Ok(true),
        Err(e) => match Error::io(e) {
            Error::Corrupt(_) => {
                ok = false;
                Ok(true)
            }
            other => Err(other),
        },
    })?;
    Ok(ok)
}

/// Extracts every entry in the archive under `dest`, sequentially.
///
/// Rejects any entry whose name would resolve outside of `dest` with [`Error::PathEscape`].
/// Symbolic-link entries (detected via the POSIX `st_mode` bits in `windows_attributes`) are
/// recreated as symlinks on Unix-like targets.
pub fn extractall<R: Read + Seek>(reader: &mut ArchiveReader<R>, dest: &Path) -> Result<(), Error> {
    if !dest.exists() {
        fs::create_dir_all(dest).map_err(Error::io)?;
    }
    reader.for_each_entries(|entry, data| {
        let path = safe_join(dest, entry.name())?;
        let mut sink = FileSink::Path(path);
        sink.consume(entry, data)?;
        Ok(true)
    })
}

/// Extracts every entry in the 7z archive at `path` under `dest`, decoding independent blocks
/// (folders) concurrently.
///
/// Each block is opened through its own file handle and decoded on its own thread; entries
/// within a single (possibly solid) block are still written in-order. Falls back to the
/// sequential [`extractall`] path whenever parallelizing could reorder output: when there is
/// only one block, when the pack-stream count doesn't match the folder count (a folder spans
/// more than one pack stream, so blocks aren't independently seekable one-to-one), or when two
/// entries share an output path (extraction order must stay "last entry wins").
pub fn extractall_parallel(path: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    let dest = dest.as_ref();
    if !dest.exists() {
        fs::create_dir_all(dest).map_err(Error::io)?;
    }

    let archive = crate::archive::Archive::open(path)?;
    let block_count = archive.blocks.len();

    if !can_parallelize(&archive) {
        let file = File::open(path).map_err(|e| Error::file_open(e, path.to_string_lossy().to_string()))?;
        let mut reader = ArchiveReader::from_archive(archive, file)?;
        return extractall(&mut reader, dest);
    }

    let results: Vec<Result<(), Error>> = (0..block_count)
        .into_par_iter()
        .map(|block_index| -> Result<(), Error> {
            let mut file = File::open(path).map_err(|e| Error::file_open(e, path.to_string_lossy().to_string()))?;
            BlockDecoder::new(block_index, &archive, &mut file).for_each_entries(&mut |entry, data| {
                let out_path = safe_join(dest, entry.name())?;
                let mut sink = FileSink::Path(out_path);
                sink.consume(entry, data)?;
                Ok(true)
            })?;
            Ok(())
        })
        .collect();

    for result in results {
        result?;
    }

    for (file_index, file) in archive.files.iter().enumerate() {
        if archive.stream_map.file_block_index[file_index].is_none() {
            let path = safe_join(dest, file.name())?;
            let mut sink = FileSink::Path(path);
            sink.consume(file, &mut ([0u8; 0].as_slice()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn safe_join_rejects_parent_dir() {
        let dest = Path::new("/tmp/out");
        assert!(matches!(safe_join(dest, "../evil"), Err(Error::PathEscape(_))));
        assert!(matches!(safe_join(dest, "a/../../evil"), Err(Error::PathEscape(_))));
    }

    #[test]
    fn safe_join_rejects_absolute_path() {
        let dest = Path::new("/tmp/out");
        assert!(matches!(safe_join(dest, "/etc/passwd"), Err(Error::PathEscape(_))));
    }

    #[test]
    fn safe_join_accepts_nested_name() {
        let dest = Path::new("/tmp/out");
        let joined = safe_join(dest, "a/b/c.txt").unwrap();
        assert_eq!(joined, Path::new("/tmp/out/a/b/c.txt"));
    }

    #[test]
    fn safe_join_normalizes_backslashes() {
        let dest = Path::new("/tmp/out");
        let joined = safe_join(dest, "a\\b\\c.txt").unwrap();
        assert_eq!(joined, Path::new("/tmp/out/a/b/c.txt"));
    }

    #[test]
    #[cfg(unix)]
    fn symlink_entry_creates_symlink_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let link_path = dir.path().join("link");

        let mut entry = ArchiveEntry::new_file("link");
        entry.has_windows_attributes = true;
        entry.windows_attributes = 0x8000 | (0o120000u32 << 16);
        assert!(entry.is_symlink());

        let mut target_reader = Cursor::new(b"target.txt".to_vec());
        write_to_path(&entry, &mut target_reader, &link_path).unwrap();

        let target = fs::read_link(&link_path).unwrap();
        assert_eq!(target, Path::new("target.txt"));
    }

    fn copy_block(unpack_size: u64) -> crate::block::Block {
        let coder = crate::block::Coder::new(crate::archive::EncoderMethod::ID_COPY, 1, 1, Vec::new());
        crate::block::Block::new_single_coder(coder, unpack_size, 1)
    }

    #[test]
    fn can_parallelize_rejects_single_block() {
        let mut archive = crate::archive::Archive::default();
        archive.blocks = vec![copy_block(10)];
        archive.pack_sizes = vec![10];
        assert!(!can_parallelize(&archive));
    }

    #[test]
    fn can_parallelize_rejects_mismatched_pack_stream_count() {
        let mut archive = crate::archive::Archive::default();
        archive.blocks = vec![copy_block(10), copy_block(20)];
        archive.pack_sizes = vec![10]; // one pack stream for two folders
        assert!(!can_parallelize(&archive));
    }

    #[test]
    fn can_parallelize_rejects_duplicate_names() {
        let mut archive = crate::archive::Archive::default();
        archive.blocks = vec![copy_block(10), copy_block(20)];
        archive.pack_sizes = vec![10, 20];
        archive.files = vec![ArchiveEntry::new_file("dup"), ArchiveEntry::new_file("dup")];
        assert!(!can_parallelize(&archive));
    }

    #[test]
    fn can_parallelize_accepts_independent_blocks() {
        let mut archive = crate::archive::Archive::default();
        archive.blocks = vec![copy_block(10), copy_block(20)];
        archive.pack_sizes = vec![10, 20];
        archive.files = vec![ArchiveEntry::new_file("a"), ArchiveEntry::new_file("b")];
        assert!(can_parallelize(&archive));
    }

    #[test]
    fn anti_item_deletes_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let target_path = dir.path().join("stale.txt");
        fs::write(&target_path, b"old contents").unwrap();

        let mut entry = ArchiveEntry::new_file("stale.txt");
        entry.is_anti_item = true;

        let mut empty_reader: &[u8] = &[];
        write_to_path(&entry, &mut empty_reader, &target_path).unwrap();

        assert!(!target_path.exists());
    }

    #[test]
    fn regular_file_entry_writes_content() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("hello.txt");

        let entry = ArchiveEntry::new_file("hello.txt");
        let mut data_reader = Cursor::new(b"Hello\n".to_vec());
        write_to_path(&entry, &mut data_reader, &out_path).unwrap();

        assert_eq!(fs::read(&out_path).unwrap(), b"Hello\n");
    }
}

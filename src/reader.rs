use std::{
    collections::HashMap,
    fs::File,
    io::{Read, Seek, SeekFrom},
};

use crc32fast::Hasher;

use crate::{
    archive::*,
    decoder::add_decoder,
    error::Error,
    header::{read_header, read_streams_info, read_u32},
};

const MAX_MEM_LIMIT_KB: usize = usize::MAX / 1024;

/// Reads at most `max_size` bytes from `inner` before returning EOF, regardless of how much
/// more data `inner` actually has.
pub(crate) struct BoundedReader<R: Read> {
    inner: R,
    remain: usize,
}

impl<R: Read> BoundedReader<R> {
    pub(crate) fn new(inner: R, max_size: usize) -> Self {
        Self { inner, remain: max_size }
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.remain == 0 {
            return Ok(0);
        }
        let remain = self.remain;
        let buf2 = if buf.len() < remain { buf } else { &mut buf[..remain] };
        let size = self.inner.read(buf2)?;
        self.remain = self.remain.saturating_sub(size);
        Ok(size)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SeekableBoundedReader<R: Read + Seek> {
    inner: R,
    cur: u64,
    bounds: (u64, u64),
}

impl<R: Read + Seek> SeekableBoundedReader<R> {
    pub(crate) fn new(inner: R, bounds: (u64, u64)) -> Self {
        Self { inner, cur: bounds.0, bounds }
    }
}

impl<R: Read + Seek> Seek for SeekableBoundedReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(pos) => self.bounds.0 as i64 + pos as i64,
            SeekFrom::End(pos) => self.bounds.1 as i64 + pos,
            SeekFrom::Current(pos) => self.cur as i64 + pos,
        };
        if new_pos < 0 {
            return Err(std::io::Error::other("seek before start"));
        }
        self.cur = new_pos as u64;
        self.inner.seek(SeekFrom::Start(self.cur))
    }
}

impl<R: Read + Seek> Read for SeekableBoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.cur >= self.bounds.1 {
            return Ok(0);
        }
        if self.inner.stream_position()? != self.cur {
            self.inner.seek(SeekFrom::Start(self.cur))?;
        }
        let remain = (self.bounds.1 - self.cur) as usize;
        let buf2 = if buf.len() < remain { buf } else { &mut buf[..remain] };
        let size = self.inner.read(buf2)?;
        self.cur += size as u64;
        Ok(size)
    }
}

pub(crate) struct Crc32VerifyingReader<R> {
    inner: R,
    crc_digest: Hasher,
    expected_value: u64,
    remaining: i64,
}

impl<R: Read> Crc32VerifyingReader<R> {
    fn new(inner: R, remaining: usize, expected_value: u64) -> Self {
        Self {
            inner,
            crc_digest: Hasher::new(),
            expected_value,
            remaining: remaining as i64,
        }
    }
}

impl<R: Read> Read for Crc32VerifyingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.remaining <= 0 {
            return Ok(0);
        }
        let size = self.inner.read(buf)?;
        if size > 0 {
            self.remaining -= size as i64;
            self.crc_digest.update(&buf[..size]);
        }
        if self.remaining <= 0 {
            let d = std::mem::replace(&mut self.crc_digest, Hasher::new()).finalize();
            if d as u64 != self.expected_value {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    crate::error::CrcMismatch("substream CRC mismatch".into()),
                ));
            }
        }
        Ok(size)
    }
}

impl Archive {
    /// Opens a 7z file at `path` and parses its metadata header.
    #[inline]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Archive, Error> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| Error::file_open(e, path.to_string_lossy().to_string()))?;
        let default_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "contents".to_string());
        Self::read_named(&mut file, default_name)
    }

    /// Parses a 7z archive's metadata header from `reader`.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Archive, Error> {
        Self::read_named(reader, "contents".to_string())
    }

    /// Like [`Archive::read`], but with an explicit fallback name for files whose `kName` entry
    /// is empty or absent (spec-required for anonymous-stream archives).
    fn read_named<R: Read + Seek>(reader: &mut R, default_name: String) -> Result<Archive, Error> {
        reader.seek(SeekFrom::End(0)).map_err(Error::io)?;
        reader.seek(SeekFrom::Start(0)).map_err(Error::io)?;

        let mut signature = [0; 6];
        reader.read_exact(&mut signature).map_err(Error::io)?;
        if signature != SEVEN_Z_SIGNATURE {
            return Err(Error::NotSevenZ(signature));
        }
        let mut versions = [0; 2];
        reader.read_exact(&mut versions).map_err(Error::io)?;
        let version_major = versions[0];
        let version_minor = versions[1];
        if version_major != 0 {
            return Err(Error::UnsupportedVersion { major: version_major, minor: version_minor });
        }

        let start_header_crc = read_u32(reader)?;

        let header_valid = if start_header_crc == 0 {
            let current_position = reader.stream_position().map_err(Error::io)?;
            let mut buf = [0; 20];
            reader.read_exact(&mut buf).map_err(Error::io)?;
            reader.seek(SeekFrom::Start(current_position)).map_err(Error::io)?;
            buf.iter().any(|a| *a != 0)
        } else {
            true
        };

        if !header_valid {
            return Err(Error::bad_header("start header is all zero and no fallback locate is supported"));
        }

        let start_header = Self::read_start_header(reader, start_header_crc)?;
        Self::init_archive(reader, start_header, true, default_name)
    }

    fn read_start_header<R: Read>(reader: &mut R, start_header_crc: u32) -> Result<StartHeader, Error> {
        let mut buf = [0; 20];
        reader.read_exact(&mut buf).map_err(Error::io)?;
        let crc32 = crc32fast::hash(&buf);
        if crc32 != start_header_crc {
            return Err(Error::corrupt("start header CRC mismatch"));
        }
        let mut buf_read = buf.as_slice();
        let offset = read_u64le(&mut buf_read)?;
        let size = read_u64le(&mut buf_read)?;
        let crc = read_u32(&mut buf_read)?;
        Ok(StartHeader { next_header_offset: offset, next_header_size: size, next_header_crc: crc as u64 })
    }

    fn init_archive<R: Read + Seek>(
        reader: &mut R,
        start_header: StartHeader,
        verify_crc: bool,
        default_name: String,
    ) -> Result<Self, Error> {
        if start_header.next_header_size > usize::MAX as u64 {
            return Err(Error::bad_header(format!("cannot handle next_header_size {}", start_header.next_header_size)));
        }
        let next_header_size_int = start_header.next_header_size as usize;

        reader
            .seek(SeekFrom::Start(SIGNATURE_HEADER_SIZE + start_header.next_header_offset))
            .map_err(Error::io)?;

        let mut buf = vec![0; next_header_size_int];
        reader.read_exact(&mut buf).map_err(Error::io)?;
        if verify_crc && crc32fast::hash(&buf) as u64 != start_header.next_header_crc {
            return Err(Error::corrupt("next header CRC mismatch"));
        }

        if buf.is_empty() {
            // A zero-length next header means the archive has no files at all: there is no
            // kHeader byte to read.
            return Ok(Archive::default());
        }

        let mut archive = Archive { default_file_name: default_name.clone(), ..Archive::default() };
        let mut depth = 0;
        let mut nid = crate::header::read_u8(&mut buf.as_slice())?;
        while nid == K_ENCODED_HEADER {
            let mut buf_reader = &buf[1..];
            let (mut out_reader, buf_size) = Self::read_encoded_header(&mut buf_reader, reader, &mut archive, depth)?;
            let mut decoded = vec![0; buf_size];
            out_reader.read_exact(&mut decoded).map_err(Error::io)?;
            drop(out_reader);
            buf = decoded;
            archive = Archive { default_file_name: default_name.clone(), ..Archive::default() };
            depth += 1;
            let mut buf_reader = buf.as_slice();
            nid = crate::header::read_u8(&mut buf_reader)?;
        }
        let mut header = std::io::Cursor::new(&buf[1..]);
        if nid == K_HEADER {
            read_header(&mut header, &mut archive)?;
        } else {
            return Err(Error::bad_header("broken or unsupported archive: no Header"));
        }

        archive.is_solid = archive.blocks.iter().any(|block| block.num_unpack_sub_streams > 1);

        Ok(archive)
    }

    fn read_encoded_header<'r, R: Read, RI: 'r + Read + Seek>(
        header: &mut R,
        reader: &'r mut RI,
        archive: &mut Archive,
        depth: u32,
    ) -> Result<(Box<dyn Read + 'r>, usize), Error> {
        if depth >= MAX_ENCODED_HEADER_DEPTH {
            return Err(Error::bad_header("encoded header nested too deeply"));
        }
        read_streams_info(header, archive)?;
        let block = archive.blocks.first().ok_or_else(|| Error::bad_header("no blocks, can't read encoded header"))?;
        if archive.pack_sizes.is_empty() {
            return Err(Error::bad_header("no packed streams, can't read encoded header"));
        }
        let block_offset = SIGNATURE_HEADER_SIZE + archive.pack_pos;

        reader.seek(SeekFrom::Start(block_offset)).map_err(Error::io)?;
        let unpack_size = block.get_unpack_size() as usize;
        let pack_size = archive.pack_sizes[0] as usize;
        let input_reader = SeekableBoundedReader::new(reader, (block_offset, block_offset + pack_size as u64));
        let mut decoder: Box<dyn Read> = Box::new(input_reader);
        if !block.coders.is_empty() {
            if block.total_input_streams > block.total_output_streams {
                return Err(Error::unsupported_feature("multi-input-stream coder chain in encoded header"));
            }
            for (index, coder) in block.ordered_coder_iter() {
                if coder.num_in_streams != 1 || coder.num_out_streams != 1 {
                    return Err(Error::unsupported_feature("multi-input/output stream coders"));
                }
                let next = add_decoder(decoder, block.get_unpack_size_at_index(index) as usize, coder, MAX_MEM_LIMIT_KB)?;
                decoder = Box::new(next);
            }
        }
        if block.has_crc {
            decoder = Box::new(Crc32VerifyingReader::new(decoder, unpack_size, block.crc));
        }

        Ok((decoder, unpack_size))
    }
}

#[inline]
fn read_u64le<R: Read>(reader: &mut R) -> Result<u64, Error> {
    let mut buf = [0; 8];
    reader.read_exact(&mut buf).map_err(Error::io)?;
    Ok(u64::from_le_bytes(buf))
}

#[derive(Copy, Clone)]
struct IndexEntry {
    block_index: Option<usize>,
    file_index: usize,
}

/// Reads and decompresses entries from a 7z archive.
pub struct ArchiveReader<R: Read + Seek> {
    source: R,
    archive: Archive,
    index: HashMap<String, IndexEntry>,
    total_size: u64,
    thread_count: u32,
    parallel_folders: Option<bool>,
}

impl ArchiveReader<File> {
    /// Opens a 7z archive file at `path`.
    #[inline]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let file = File::open(path.as_ref()).map_err(|e| Error::file_open(e, path.as_ref().to_string_lossy().to_string()))?;
        Self::new(file)
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Creates an [`ArchiveReader`] over `source`, parsing its metadata header.
    #[inline]
    pub fn new(mut source: R) -> Result<Self, Error> {
        let archive = Archive::read(&mut source)?;
        let total_size = source.seek(SeekFrom::End(0)).map_err(Error::io)?;
        let mut reader = Self {
            source,
            archive,
            index: HashMap::default(),
            total_size,
            thread_count: 1,
            parallel_folders: None,
        };
        reader.fill_index();
        Ok(reader)
    }

    /// Creates an [`ArchiveReader`] from an already-parsed [`Archive`].
    #[inline]
    pub fn from_archive(archive: Archive, mut source: R) -> Result<Self, Error> {
        let total_size = source.seek(SeekFrom::End(0)).map_err(Error::io)?;
        let mut reader = Self {
            source,
            archive,
            index: HashMap::default(),
            total_size,
            thread_count: 1,
            parallel_folders: None,
        };
        reader.fill_index();
        Ok(reader)
    }

    /// Sets the number of threads made available to coders that can make use of more than one
    /// (currently none in this core; reserved for a future multi-threaded LZMA2 decoder).
    pub fn set_thread_count(&mut self, thread_count: u32) {
        self.thread_count = thread_count.clamp(1, 256);
    }

    /// Overrides automatic folder-level parallel decompression. `None` (the default) lets
    /// [`extractall_parallel`](crate::extractall_parallel) decide from the archive's shape.
    pub fn set_parallel_folders(&mut self, enabled: bool) {
        self.parallel_folders = Some(enabled);
    }

    /// Returns the names of every entry, in header order.
    pub fn names(&self) -> Vec<&str> {
        self.archive.files.iter().map(|f| f.name.as_str()).collect()
    }

    /// Returns a flattened, display-friendly summary of every entry, in header order.
    pub fn list(&self) -> Vec<FileInfo> {
        self.archive.files.iter().map(FileInfo::from).collect()
    }

    fn fill_index(&mut self) {
        for (file_index, file) in self.archive.files.iter().enumerate() {
            let block_index = self.archive.stream_map.file_block_index[file_index];
            self.index.insert(file.name.clone(), IndexEntry { block_index, file_index });
        }
    }

    /// Returns a reference to the parsed archive metadata.
    #[inline]
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Returns summary information about the archive.
    pub fn info(&self) -> ArchiveInfo {
        let mut method_names = Vec::new();
        for block in &self.archive.blocks {
            for coder in &block.coders {
                if let Some(m) = EncoderMethod::by_id(coder.encoder_method_id()) {
                    if !method_names.contains(&m.name()) {
                        method_names.push(m.name());
                    }
                }
            }
        }
        let header_size = self.total_size.saturating_sub(SIGNATURE_HEADER_SIZE + self.archive.pack_pos);
        ArchiveInfo {
            total_size: self.total_size,
            header_size,
            method_names,
            is_solid: self.archive.is_solid,
            folder_count: self.archive.blocks.len(),
        }
    }

    /// Reads every pack stream's raw bytes and checks its CRC (when one is present), without
    /// decompressing anything. Returns `false` if any defined pack CRC fails to match rather
    /// than raising, so callers can combine it with the per-folder decompression pass.
    pub(crate) fn verify_pack_crcs(&mut self) -> Result<bool, Error> {
        let mut ok = true;
        for i in 0..self.archive.pack_sizes.len() {
            if !self.archive.pack_crcs_defined.contains(i) {
                continue;
            }
            let offset =
                SIGNATURE_HEADER_SIZE + self.archive.pack_pos + self.archive.stream_map.pack_stream_offsets[i];
            self.source.seek(SeekFrom::Start(offset)).map_err(Error::io)?;

            let mut remaining = self.archive.pack_sizes[i] as usize;
            let mut hasher = Hasher::new();
            let mut buf = [0u8; 8192];
            while remaining > 0 {
                let n = remaining.min(buf.len());
                self.source.read_exact(&mut buf[..n]).map_err(Error::io)?;
                hasher.update(&buf[..n]);
                remaining -= n;
            }
            if hasher.finalize() as u64 != self.archive.pack_crcs[i] {
                ok = false;
            }
        }
        Ok(ok)
    }

    pub(crate) fn build_decode_stack<'r>(
        source: &'r mut R,
        archive: &Archive,
        block_index: usize,
    ) -> Result<(Box<dyn Read + 'r>, usize), Error> {
        let block = &archive.blocks[block_index];
        if block.total_input_streams > block.total_output_streams {
            return Err(Error::unsupported_feature("BCJ2 or other multi-input-stream coder chains"));
        }
        let first_pack_stream_index = archive.stream_map.block_first_pack_stream_index[block_index];
        let block_offset =
            SIGNATURE_HEADER_SIZE + archive.pack_pos + archive.stream_map.pack_stream_offsets[first_pack_stream_index];

        source.seek(SeekFrom::Start(block_offset)).map_err(Error::io)?;
        let pack_size = archive.pack_sizes[first_pack_stream_index] as usize;

        let mut decoder: Box<dyn Read> = Box::new(BoundedReader::new(source, pack_size));
        for (index, coder) in block.ordered_coder_iter() {
            if coder.num_in_streams != 1 || coder.num_out_streams != 1 {
                return Err(Error::unsupported_feature("multi-input/output stream coders"));
            }
            let next = add_decoder(decoder, block.get_unpack_size_at_index(index) as usize, coder, MAX_MEM_LIMIT_KB)?;
            decoder = Box::new(next);
        }
        if block.has_crc {
            decoder = Box::new(Crc32VerifyingReader::new(decoder, block.get_unpack_size() as usize, block.crc));
        }

        Ok((decoder, pack_size))
    }

    /// Iterates over every file entry in the archive, invoking `each` with the entry and a
    /// reader positioned over its decompressed bytes.
    ///
    /// Files within the same solid block are visited in archive order; `each` must consume
    /// each reader fully (or at least up to the point it returns) since blocks decode linearly.
    pub fn for_each_entries<F: FnMut(&ArchiveEntry, &mut dyn Read) -> Result<bool, Error>>(
        &mut self,
        mut each: F,
    ) -> Result<(), Error> {
        let block_count = self.archive.blocks.len();
        for block_index in 0..block_count {
            let block_dec = BlockDecoder::new(block_index, &self.archive, &mut self.source);
            if !block_dec.for_each_entries(&mut each)? {
                return Ok(());
            }
        }
        for file_index in 0..self.archive.files.len() {
            if self.archive.stream_map.file_block_index[file_index].is_none() {
                let file = &self.archive.files[file_index];
                let empty_reader: &mut dyn Read = &mut ([0u8; 0].as_slice());
                if !each(file, empty_reader)? {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Returns the decompressed bytes of the named file.
    ///
    /// Inefficient for solid archives: every block preceding the file's block must be decoded
    /// first.
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>, Error> {
        let index_entry = *self.index.get(name).ok_or(Error::FileNotFound)?;
        let file = &self.archive.files[index_entry.file_index];

        if !file.has_stream {
            return Ok(Vec::new());
        }

        let block_index = index_entry.block_index.ok_or_else(|| Error::bad_header("file has no associated block"))?;

        if self.archive.is_solid {
            let mut result = None;
            let target_file_ptr = file as *const _;
            BlockDecoder::new(block_index, &self.archive, &mut self.source).for_each_entries(&mut |entry, reader| {
                let mut data = Vec::with_capacity(entry.size as usize);
                reader.read_to_end(&mut data).map_err(Error::io)?;
                if std::ptr::eq(entry, target_file_ptr) {
                    result = Some(data);
                    Ok(false)
                } else {
                    Ok(true)
                }
            })?;
            result.ok_or(Error::FileNotFound)
        } else {
            let (mut block_reader, _size) = Self::build_decode_stack(&mut self.source, &self.archive, block_index)?;
            let mut data = Vec::with_capacity(file.size as usize);
            let mut decoder: Box<dyn Read> = Box::new(BoundedReader::new(&mut block_reader, file.size as usize));
            if file.has_crc {
                decoder = Box::new(Crc32VerifyingReader::new(decoder, file.size as usize, file.crc));
            }
            decoder.read_to_end(&mut data).map_err(Error::io)?;
            Ok(data)
        }
    }

    /// Returns the compression methods applied to the named file, outermost coder last.
    pub fn file_compression_methods(&self, file_name: &str, methods: &mut Vec<EncoderMethod>) -> Result<(), Error> {
        let index_entry = self.index.get(file_name).ok_or(Error::FileNotFound)?;
        let file = &self.archive.files[index_entry.file_index];
        if !file.has_stream {
            return Ok(());
        }
        let block_index = index_entry.block_index.ok_or_else(|| Error::bad_header("file has no associated block"))?;
        let block = self.archive.blocks.get(block_index).ok_or_else(|| Error::bad_header("block not found"))?;
        block
            .coders
            .iter()
            .filter_map(|coder| EncoderMethod::by_id(coder.encoder_method_id()))
            .for_each(|method| methods.push(method));
        Ok(())
    }

}

/// Decodes entries belonging to a single block (folder) of a 7z archive.
pub struct BlockDecoder<'a, R: Read + Seek> {
    block_index: usize,
    archive: &'a Archive,
    source: &'a mut R,
}

impl<'a, R: Read + Seek> BlockDecoder<'a, R> {
    /// Creates a decoder for `block_index` within `archive`, reading from `source`.
    pub fn new(block_index: usize, archive: &'a Archive, source: &'a mut R) -> Self {
        Self { block_index, archive, source }
    }

    /// Returns the archive entries contained in this block, in block order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        let start = self.archive.stream_map.block_first_file_index[self.block_index];
        let file_count = self.archive.blocks[self.block_index].num_unpack_sub_streams;
        &self.archive.files[start..(file_count + start)]
    }

    /// Returns the number of entries contained in this block.
    pub fn entry_count(&self) -> usize {
        self.archive.blocks[self.block_index].num_unpack_sub_streams
    }

    /// Invokes `each` for every file in this block in order, slicing the block's decompressed
    /// output by each file's running offset.
    pub fn for_each_entries<F: FnMut(&ArchiveEntry, &mut dyn Read) -> Result<bool, Error>>(
        self,
        each: &mut F,
    ) -> Result<bool, Error> {
        let Self { block_index, archive, source } = self;
        let (mut block_reader, _size) = ArchiveReader::build_decode_stack(source, archive, block_index)?;
        let start = archive.stream_map.block_first_file_index[block_index];
        let file_count = archive.blocks[block_index].num_unpack_sub_streams;

        for file_index in start..(file_count + start) {
            let file = &archive.files[file_index];
            if file.has_stream && file.size > 0 {
                let mut decoder: Box<dyn Read> = Box::new(BoundedReader::new(&mut block_reader, file.size as usize));
                if file.has_crc {
                    decoder = Box::new(Crc32VerifyingReader::new(decoder, file.size as usize, file.crc));
                }
                if !each(file, &mut decoder)? {
                    return Ok(false);
                }
            } else {
                let empty_reader: &mut dyn Read = &mut ([0u8; 0].as_slice());
                if !each(file, empty_reader)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn verify_pack_crcs_detects_mismatch() {
        let payload = b"pack bytes".to_vec();
        let correct_crc = crc32fast::hash(&payload) as u64;

        let mut bytes = vec![0u8; SIGNATURE_HEADER_SIZE as usize];
        bytes.extend_from_slice(&payload);

        let mut archive = Archive::default();
        archive.pack_sizes = vec![payload.len() as u64];
        archive.pack_crcs = vec![correct_crc];
        let mut defined = crate::bitset::BitSet::with_capacity(1);
        defined.insert(0);
        archive.pack_crcs_defined = defined;
        archive.stream_map.pack_stream_offsets = vec![0];

        let mut reader = ArchiveReader::from_archive(archive.clone(), Cursor::new(bytes.clone())).unwrap();
        assert!(reader.verify_pack_crcs().unwrap());

        let mut corrupt_archive = archive;
        corrupt_archive.pack_crcs = vec![correct_crc.wrapping_add(1)];
        let mut reader = ArchiveReader::from_archive(corrupt_archive, Cursor::new(bytes)).unwrap();
        assert!(!reader.verify_pack_crcs().unwrap());
    }

    #[test]
    fn crc_match_reads_cleanly() {
        let data = b"hello!".to_vec();
        let crc = crc32fast::hash(&data) as u64;
        let mut r = Crc32VerifyingReader::new(Cursor::new(data.clone()), data.len(), crc);
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn crc_mismatch_maps_to_corrupt_error() {
        let data = b"hello!".to_vec();
        let wrong_crc = crc32fast::hash(b"different bytes") as u64;
        let mut r = Crc32VerifyingReader::new(Cursor::new(data.clone()), data.len(), wrong_crc);
        let mut buf = Vec::new();
        let io_err = r.read_to_end(&mut buf).unwrap_err();
        assert!(matches!(Error::io(io_err), Error::Corrupt(_)));
    }

    #[test]
    fn empty_next_header_yields_empty_archive() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(SEVEN_Z_SIGNATURE);
        bytes.push(0);
        bytes.push(4);
        let start_header = [0u8; 20];
        let crc = crc32fast::hash(&start_header);
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&start_header);

        let mut cursor = Cursor::new(bytes);
        let archive = Archive::read(&mut cursor).unwrap();
        assert!(archive.files.is_empty());
        assert!(archive.blocks.is_empty());
    }
}

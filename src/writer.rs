//! Minimal single-folder writer, kept narrow on purpose: one coder chain, one solid block, no
//! per-entry or per-block CRCs. Exists for round-trip tests, not for write parity with the
//! reader's full feature set.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use byteorder::WriteBytesExt;

use crate::{
    archive::*,
    bitset::{write_bit_set, BitSet},
    block::{Block, Coder},
    error::Error,
    time::NtTime,
};

/// Writes a 7z archive containing a single, solid block.
pub struct ArchiveWriter<W: Write + Seek> {
    output: W,
    entries: Vec<ArchiveEntry>,
    contents: Vec<u8>,
    content_method: EncoderMethod,
}

impl ArchiveWriter<File> {
    /// Creates a file to write a 7z archive to.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::create(path.as_ref()).map_err(|e| Error::file_open(e, path.as_ref().to_string_lossy().to_string()))?;
        Self::new(file)
    }
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// Prepares `output` to receive a 7z archive.
    pub fn new(mut output: W) -> Result<Self, Error> {
        output.seek(SeekFrom::Start(SIGNATURE_HEADER_SIZE)).map_err(Error::io)?;
        Ok(Self {
            output,
            entries: Vec::new(),
            contents: Vec::new(),
            content_method: EncoderMethod::COPY,
        })
    }

    /// Sets the compression method applied to the archive's single solid block. Only `COPY` and
    /// `LZMA2` are accepted.
    pub fn set_content_method(&mut self, method: EncoderMethod) -> Result<(), Error> {
        if method.id() != EncoderMethod::ID_COPY && method.id() != EncoderMethod::ID_LZMA2 {
            return Err(Error::unsupported_feature("writer only supports COPY or LZMA2 content methods"));
        }
        self.content_method = method;
        Ok(())
    }

    /// Adds a single file or directory at `path` under archive name `arcname`.
    pub fn write(&mut self, path: impl AsRef<Path>, arcname: impl Into<String>) -> Result<(), Error> {
        let path = path.as_ref();
        let name = arcname.into();
        let metadata = std::fs::metadata(path).map_err(Error::io)?;
        let last_modified_date = metadata
            .modified()
            .map_err(Error::io)
            .and_then(|m| NtTime::try_from(m).map_err(|e| Error::bad_header(e.to_string())))
            .unwrap_or_default();

        if metadata.is_dir() {
            let mut entry = ArchiveEntry::new_directory(&name);
            entry.has_last_modified_date = true;
            entry.last_modified_date = last_modified_date;
            self.entries.push(entry);
            return Ok(());
        }

        let mut file = File::open(path).map_err(|e| Error::file_open(e, path.to_string_lossy().to_string()))?;
        let mut data = Vec::with_capacity(metadata.len() as usize);
        file.read_to_end(&mut data).map_err(Error::io)?;

        let mut entry = ArchiveEntry::new_file(&name);
        entry.size = data.len() as u64;
        entry.has_last_modified_date = true;
        entry.last_modified_date = last_modified_date;
        self.contents.extend_from_slice(&data);
        self.entries.push(entry);
        Ok(())
    }

    /// Recursively adds every file and directory under `dir`, with archive names relative to
    /// `dir` (so `dir` itself is not pushed as an entry).
    pub fn writeall(&mut self, dir: impl AsRef<Path>) -> Result<(), Error> {
        let root = dir.as_ref();
        self.write_dir_contents(root, root)
    }

    fn write_dir_contents(&mut self, path: &Path, root: &Path) -> Result<(), Error> {
        for child in path.read_dir().map_err(Error::io)? {
            let child = child.map_err(Error::io)?;
            let child_path = child.path();
            let file_type = child.file_type().map_err(Error::io)?;
            if !file_type.is_dir() && !file_type.is_file() {
                continue;
            }
            let arcname = child_path
                .strip_prefix(root)
                .map_err(|e| Error::other(e.to_string()))?
                .to_string_lossy()
                .replace('\\', "/");
            self.write(&child_path, arcname)?;
            if file_type.is_dir() {
                self.write_dir_contents(&child_path, root)?;
            }
        }
        Ok(())
    }

    /// Finishes the archive: encodes the solid block, writes the metadata header, and rewrites
    /// the signature header with the true offsets, sizes, and CRCs.
    pub fn finish(mut self) -> Result<W, Error> {
        let unpack_size = self.contents.len() as u64;
        let (encoded, coder) = encode_content(&self.contents, &self.content_method)?;
        let pack_size = encoded.len() as u64;
        self.output.write_all(&encoded).map_err(Error::io)?;

        let num_unpack_sub_streams = self.entries.iter().filter(|e| e.has_stream).count();
        let block = Block::new_single_coder(coder, unpack_size, num_unpack_sub_streams);

        let mut header_buf = Vec::with_capacity(4096);
        write_header(&mut header_buf, &self.entries, &block, pack_size).map_err(Error::io)?;

        let header_pos = self.output.stream_position().map_err(Error::io)?;
        self.output.write_all(&header_buf).map_err(Error::io)?;
        let header_crc = crc32fast::hash(&header_buf);

        let mut start_header = [0u8; 20];
        {
            let mut w = start_header.as_mut_slice();
            w.write_u64::<byteorder::LittleEndian>(header_pos - SIGNATURE_HEADER_SIZE).map_err(Error::io)?;
            w.write_u64::<byteorder::LittleEndian>(header_buf.len() as u64).map_err(Error::io)?;
            w.write_u32::<byteorder::LittleEndian>(header_crc).map_err(Error::io)?;
        }
        let start_header_crc = crc32fast::hash(&start_header);

        self.output.seek(SeekFrom::Start(0)).map_err(Error::io)?;
        self.output.write_all(SEVEN_Z_SIGNATURE).map_err(Error::io)?;
        self.output.write_u8(0).map_err(Error::io)?;
        self.output.write_u8(4).map_err(Error::io)?;
        self.output.write_u32::<byteorder::LittleEndian>(start_header_crc).map_err(Error::io)?;
        self.output.write_all(&start_header).map_err(Error::io)?;
        self.output.flush().map_err(Error::io)?;
        Ok(self.output)
    }
}

fn encode_content(data: &[u8], method: &EncoderMethod) -> Result<(Vec<u8>, Coder), Error> {
    match method.id() {
        EncoderMethod::ID_LZMA2 => {
            let mut encoded = Vec::new();
            {
                let mut w = lzma_rust2::LZMA2Writer::new(&mut encoded, &lzma_rust2::LZMA2Options::with_preset(6));
                w.write_all(data).map_err(Error::io)?;
                w.finish().map_err(Error::io)?;
            }
            // dict size bits = 24 (16 MiB), matching `LZMA2Options::with_preset(6)`'s default.
            Ok((encoded, Coder::new(EncoderMethod::ID_LZMA2, 1, 1, vec![24])))
        }
        _ => Ok((data.to_vec(), Coder::new(EncoderMethod::ID_COPY, 1, 1, Vec::new()))),
    }
}

fn write_u64<W: Write>(w: &mut W, mut value: u64) -> std::io::Result<()> {
    let mut first = 0u8;
    let mut mask = 0x80u8;
    let mut extra_bytes = 0;
    while extra_bytes < 8 {
        if value < (1u64 << (7 * (extra_bytes + 1))) {
            first |= (value >> (8 * extra_bytes)) as u8;
            break;
        }
        first |= mask;
        mask >>= 1;
        extra_bytes += 1;
    }
    w.write_u8(first)?;
    for _ in 0..extra_bytes {
        w.write_u8((value & 0xFF) as u8)?;
        value >>= 8;
    }
    Ok(())
}

fn write_header<W: Write>(header: &mut W, entries: &[ArchiveEntry], block: &Block, pack_size: u64) -> std::io::Result<()> {
    header.write_u8(K_HEADER)?;

    if block.num_unpack_sub_streams > 0 {
        header.write_u8(K_MAIN_STREAMS_INFO)?;

        header.write_u8(K_PACK_INFO)?;
        write_u64(header, 0)?;
        write_u64(header, 1)?;
        header.write_u8(K_SIZE)?;
        write_u64(header, pack_size)?;
        header.write_u8(K_END)?;

        header.write_u8(K_UNPACK_INFO)?;
        header.write_u8(K_FOLDER)?;
        write_u64(header, 1)?;
        header.write_u8(0)?;
        write_u64(header, block.coders.len() as u64)?;
        for coder in &block.coders {
            let id = coder.encoder_method_id();
            let has_attributes = !coder.properties.is_empty();
            let mut bits = id.len() as u8;
            if has_attributes {
                bits |= 0x20;
            }
            header.write_u8(bits)?;
            header.write_all(id)?;
            if has_attributes {
                write_u64(header, coder.properties.len() as u64)?;
                header.write_all(&coder.properties)?;
            }
        }
        header.write_u8(K_CODERS_UNPACK_SIZE)?;
        write_u64(header, block.get_unpack_size())?;
        header.write_u8(K_END)?;

        // Always emit the kSubStreamsInfo tag, even with an implicit single substream: its mere
        // presence is what makes a reader treat the block as holding one unpack stream.
        header.write_u8(K_SUB_STREAMS_INFO)?;
        if block.num_unpack_sub_streams != 1 {
            header.write_u8(K_NUM_UNPACK_STREAM)?;
            write_u64(header, block.num_unpack_sub_streams as u64)?;
            header.write_u8(K_SIZE)?;
            let sizes: Vec<u64> = entries.iter().filter(|e| e.has_stream).map(|e| e.size).collect();
            for size in sizes.iter().take(sizes.len().saturating_sub(1)) {
                write_u64(header, *size)?;
            }
        }
        header.write_u8(K_END)?;
        header.write_u8(K_END)?;
    }

    write_files_info(header, entries)?;
    header.write_u8(K_END)?;
    Ok(())
}

fn write_files_info<W: Write>(header: &mut W, entries: &[ArchiveEntry]) -> std::io::Result<()> {
    header.write_u8(K_FILES_INFO)?;
    write_u64(header, entries.len() as u64)?;

    let empty_streams: BitSet = {
        let mut bits = BitSet::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if !entry.has_stream {
                bits.insert(i);
            }
        }
        bits
    };
    if empty_streams.len() > 0 {
        header.write_u8(K_EMPTY_STREAM)?;
        let mut buf = Vec::new();
        write_bit_set(&mut buf, &empty_streams)?;
        write_u64(header, buf.len() as u64)?;
        header.write_all(&buf)?;
    }

    header.write_u8(K_NAME)?;
    let mut name_buf = Vec::new();
    name_buf.write_u8(0)?;
    for entry in entries {
        for unit in entry.name.encode_utf16() {
            name_buf.write_all(&unit.to_le_bytes())?;
        }
        name_buf.write_all(&[0u8; 2])?;
    }
    write_u64(header, name_buf.len() as u64)?;
    header.write_all(&name_buf)?;

    write_times(header, entries, K_M_TIME, |e| (e.has_last_modified_date, e.last_modified_date))?;

    // Terminates the per-file property loop; write_header writes a second kEnd to terminate
    // the header itself.
    header.write_u8(K_END)?;
    Ok(())
}

fn write_times<W: Write>(
    header: &mut W,
    entries: &[ArchiveEntry],
    nid: u8,
    get: impl Fn(&ArchiveEntry) -> (bool, NtTime),
) -> std::io::Result<()> {
    let num_present = entries.iter().filter(|e| get(e).0).count();
    if num_present == 0 {
        return Ok(());
    }
    header.write_u8(nid)?;
    let mut buf = Vec::new();
    if num_present != entries.len() {
        buf.write_u8(0)?;
        let mut bits = BitSet::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if get(entry).0 {
                bits.insert(i);
            }
        }
        write_bit_set(&mut buf, &bits)?;
    } else {
        buf.write_u8(1)?;
    }
    buf.write_u8(0)?;
    for entry in entries {
        let (present, value) = get(entry);
        if present {
            buf.write_u64::<byteorder::LittleEndian>(value.into())?;
        }
    }
    write_u64(header, buf.len() as u64)?;
    header.write_all(&buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_roundtrips_through_header_reader() {
        let mut buf = Vec::new();
        write_u64(&mut buf, 300).unwrap();
        let decoded = crate::header::read_u64(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, 300);
    }

    #[test]
    fn varint_zero() {
        let mut buf = Vec::new();
        write_u64(&mut buf, 0).unwrap();
        assert_eq!(buf, vec![0]);
    }
}

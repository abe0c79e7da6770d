use std::io::{Read, Seek, SeekFrom};

use crate::{archive::*, bitset::BitSet, block::*, error::Error};

pub(crate) fn read_header<R: Read + Seek>(header: &mut R, archive: &mut Archive) -> Result<(), Error> {
    let mut nid = read_u8(header)?;
    if nid == K_ARCHIVE_PROPERTIES {
        read_archive_properties(header)?;
        nid = read_u8(header)?;
    }

    if nid == K_ADDITIONAL_STREAMS_INFO {
        return Err(Error::unsupported_feature("additional streams info"));
    }
    if nid == K_MAIN_STREAMS_INFO {
        read_streams_info(header, archive)?;
        nid = read_u8(header)?;
    }
    if nid == K_FILES_INFO {
        read_files_info(header, archive)?;
        nid = read_u8(header)?;
    }
    if nid != K_END {
        return Err(Error::bad_header(format!("expected kEnd after header, got {nid}")));
    }

    Ok(())
}

fn read_archive_properties<R: Read + Seek>(header: &mut R) -> Result<(), Error> {
    let mut nid = read_u8(header)?;
    while nid != K_END {
        let property_size = read_usize(header, "propertySize")?;
        header
            .seek(SeekFrom::Current(property_size as i64))
            .map_err(Error::io)?;
        nid = read_u8(header)?;
    }
    Ok(())
}

pub(crate) fn read_streams_info<R: Read>(header: &mut R, archive: &mut Archive) -> Result<(), Error> {
    let mut nid = read_u8(header)?;
    if nid == K_PACK_INFO {
        read_pack_info(header, archive)?;
        nid = read_u8(header)?;
    }

    if nid == K_UNPACK_INFO {
        read_unpack_info(header, archive)?;
        nid = read_u8(header)?;
    } else {
        archive.blocks.clear();
    }
    if nid == K_SUB_STREAMS_INFO {
        read_sub_streams_info(header, archive)?;
        nid = read_u8(header)?;
    }
    if nid != K_END {
        return Err(Error::bad_header(format!("streamsInfo not terminated, got {nid}")));
    }

    Ok(())
}

fn read_files_info<R: Read + Seek>(header: &mut R, archive: &mut Archive) -> Result<(), Error> {
    let num_files = read_usize(header, "num files")?;
    let mut files: Vec<ArchiveEntry> = vec![Default::default(); num_files];

    let mut is_empty_stream: Option<BitSet> = None;
    let mut is_empty_file: Option<BitSet> = None;
    let mut is_anti: Option<BitSet> = None;
    loop {
        let prop_type = read_u8(header)?;
        if prop_type == 0 {
            break;
        }
        let size = read_u64(header)?;
        match prop_type {
            K_EMPTY_STREAM => {
                is_empty_stream = Some(read_bits(header, num_files)?);
            }
            K_EMPTY_FILE => {
                let n = if let Some(s) = &is_empty_stream {
                    s.len()
                } else {
                    return Err(Error::bad_header(
                        "kEmptyStream must appear before kEmptyFile",
                    ));
                };
                is_empty_file = Some(read_bits(header, n)?);
            }
            K_ANTI => {
                let n = if let Some(s) = is_empty_stream.as_ref() {
                    s.len()
                } else {
                    return Err(Error::bad_header("kEmptyStream must appear before kAnti"));
                };
                is_anti = Some(read_bits(header, n)?);
            }
            K_NAME => {
                let external = read_u8(header)?;
                if external != 0 {
                    return Err(Error::unsupported_feature("external file names"));
                }
                if (size - 1) & 1 != 0 {
                    return Err(Error::bad_header("file names length invalid"));
                }

                let size = assert_usize(size, "file names length")?;
                let names_reader = NamesReader::new(header, size - 1);

                let mut next_file = 0;
                for s in names_reader {
                    files[next_file].name = s?;
                    next_file += 1;
                }

                if next_file != files.len() {
                    return Err(Error::bad_header("error parsing file names"));
                }
            }
            K_C_TIME => {
                let times_defined = read_all_or_bits(header, num_files)?;
                let external = read_u8(header)?;
                if external != 0 {
                    return Err(Error::unsupported_feature("external kCTime"));
                }
                for (i, file) in files.iter_mut().enumerate() {
                    file.has_creation_date = times_defined.contains(i);
                    if file.has_creation_date {
                        file.creation_date = read_u64le(header)?.into();
                    }
                }
            }
            K_A_TIME => {
                let times_defined = read_all_or_bits(header, num_files)?;
                let external = read_u8(header)?;
                if external != 0 {
                    return Err(Error::unsupported_feature("external kATime"));
                }
                for (i, file) in files.iter_mut().enumerate() {
                    file.has_access_date = times_defined.contains(i);
                    if file.has_access_date {
                        file.access_date = read_u64le(header)?.into();
                    }
                }
            }
            K_M_TIME => {
                let times_defined = read_all_or_bits(header, num_files)?;
                let external = read_u8(header)?;
                if external != 0 {
                    return Err(Error::unsupported_feature("external kMTime"));
                }
                for (i, file) in files.iter_mut().enumerate() {
                    file.has_last_modified_date = times_defined.contains(i);
                    if file.has_last_modified_date {
                        file.last_modified_date = read_u64le(header)?.into();
                    }
                }
            }
            K_WIN_ATTRIBUTES => {
                let defined = read_all_or_bits(header, num_files)?;
                let external = read_u8(header)?;
                if external != 0 {
                    return Err(Error::unsupported_feature("external kWinAttributes"));
                }
                for (i, file) in files.iter_mut().enumerate() {
                    file.has_windows_attributes = defined.contains(i);
                    if file.has_windows_attributes {
                        file.windows_attributes = read_u32(header)?;
                    }
                }
            }
            K_START_POS => return Err(Error::unsupported_feature("kStartPos")),
            K_DUMMY => {
                header
                    .seek(SeekFrom::Current(size as i64))
                    .map_err(Error::io)?;
            }
            _ => {
                header
                    .seek(SeekFrom::Current(size as i64))
                    .map_err(Error::io)?;
            }
        };
    }

    let mut non_empty_file_counter = 0;
    let mut empty_file_counter = 0;
    for (i, file) in files.iter_mut().enumerate() {
        file.has_stream = is_empty_stream.as_ref().map(|s| !s.contains(i)).unwrap_or(true);
        if file.has_stream {
            let sub_stream_info = archive
                .sub_streams_info
                .as_ref()
                .ok_or_else(|| Error::bad_header("file has stream but no subStreamsInfo"))?;
            file.is_directory = false;
            file.is_anti_item = false;
            file.has_crc = sub_stream_info.has_crc.contains(non_empty_file_counter);
            file.crc = sub_stream_info.crcs[non_empty_file_counter];
            file.size = sub_stream_info.unpack_sizes[non_empty_file_counter];
            non_empty_file_counter += 1;
        } else {
            file.is_directory = if let Some(s) = &is_empty_file {
                !s.contains(empty_file_counter)
            } else {
                true
            };
            file.is_anti_item = is_anti.as_ref().map(|s| s.contains(empty_file_counter)).unwrap_or(false);
            file.has_crc = false;
            file.size = 0;
            empty_file_counter += 1;
        }
    }

    for file in files.iter_mut() {
        // No creation time stored: mirror last-write time into creation/access time rather
        // than leaving them zeroed. See `ArchiveEntry::creation_date` doc comment.
        if !file.has_creation_date {
            file.creation_date = file.last_modified_date;
        }
        if !file.has_access_date {
            file.access_date = file.last_modified_date;
        }
        // kName missing or empty for this entry: fall back to the archive's base name, or
        // `contents` when reading from a stream with no path of its own.
        if file.name.is_empty() {
            file.name = archive.default_file_name.clone();
        }
    }
    archive.files = files;

    calculate_stream_map(archive)?;
    Ok(())
}

fn calculate_stream_map(archive: &mut Archive) -> Result<(), Error> {
    let mut stream_map = StreamMap::default();

    let mut next_block_pack_stream_index = 0;
    let num_blocks = archive.blocks.len();
    stream_map.block_first_pack_stream_index = vec![0; num_blocks];
    for i in 0..num_blocks {
        stream_map.block_first_pack_stream_index[i] = next_block_pack_stream_index;
        next_block_pack_stream_index += archive.blocks[i].packed_streams.len();
    }

    let mut next_pack_stream_offset = 0;
    let num_pack_sizes = archive.pack_sizes.len();
    stream_map.pack_stream_offsets = vec![0; num_pack_sizes];
    for i in 0..num_pack_sizes {
        stream_map.pack_stream_offsets[i] = next_pack_stream_offset;
        next_pack_stream_offset += archive.pack_sizes[i];
    }

    stream_map.block_first_file_index = vec![0; num_blocks];
    stream_map.file_block_index = vec![None; archive.files.len()];
    let mut next_block_index = 0;
    let mut next_block_unpack_stream_index = 0;
    for i in 0..archive.files.len() {
        if !archive.files[i].has_stream && next_block_unpack_stream_index == 0 {
            stream_map.file_block_index[i] = None;
            continue;
        }
        if next_block_unpack_stream_index == 0 {
            while next_block_index < archive.blocks.len() {
                stream_map.block_first_file_index[next_block_index] = i;
                if archive.blocks[next_block_index].num_unpack_sub_streams > 0 {
                    break;
                }
                next_block_index += 1;
            }
            if next_block_index >= archive.blocks.len() {
                return Err(Error::bad_header("too few blocks in archive"));
            }
        }
        stream_map.file_block_index[i] = Some(next_block_index);
        if !archive.files[i].has_stream {
            continue;
        }

        if stream_map.block_first_file_index[next_block_index] == i
            && archive.blocks[next_block_index].num_unpack_sub_streams == 1
        {
            let first_pack_stream_index = stream_map.block_first_pack_stream_index[next_block_index];
            let pack_size = archive.pack_sizes[first_pack_stream_index];
            archive.files[i].compressed_size = pack_size;
        }

        next_block_unpack_stream_index += 1;
        if next_block_unpack_stream_index >= archive.blocks[next_block_index].num_unpack_sub_streams {
            next_block_index += 1;
            next_block_unpack_stream_index = 0;
        }
    }

    for (block_index, block) in archive.blocks.iter_mut().enumerate() {
        if block.num_unpack_sub_streams > 1 {
            let first = stream_map.block_first_pack_stream_index[block_index];
            let count = block.packed_streams.len();
            block.solid_max_pack_size =
                Some(archive.pack_sizes[first..first + count].iter().sum());
        }
    }

    archive.stream_map = stream_map;
    Ok(())
}

fn read_pack_info<R: Read>(header: &mut R, archive: &mut Archive) -> Result<(), Error> {
    archive.pack_pos = read_u64(header)?;
    let num_pack_streams = read_usize(header, "num pack streams")?;
    let mut nid = read_u8(header)?;
    if nid == K_SIZE {
        archive.pack_sizes = vec![0u64; num_pack_streams];
        for i in 0..archive.pack_sizes.len() {
            archive.pack_sizes[i] = read_u64(header)?;
        }
        nid = read_u8(header)?;
    }

    if nid == K_CRC {
        archive.pack_crcs_defined = read_all_or_bits(header, num_pack_streams)?;
        archive.pack_crcs = vec![0; num_pack_streams];
        for i in 0..num_pack_streams {
            if archive.pack_crcs_defined.contains(i) {
                archive.pack_crcs[i] = read_u32(header)? as u64;
            }
        }
        nid = read_u8(header)?;
    }

    if nid != K_END {
        return Err(Error::bad_header(format!("packInfo not terminated, got {nid}")));
    }

    Ok(())
}

fn read_unpack_info<R: Read>(header: &mut R, archive: &mut Archive) -> Result<(), Error> {
    let nid = read_u8(header)?;
    if nid != K_FOLDER {
        return Err(Error::bad_header(format!("expected kFolder, got {nid}")));
    }
    let num_blocks = read_usize(header, "num blocks")?;

    archive.blocks.reserve_exact(num_blocks);
    let external = read_u8(header)?;
    if external != 0 {
        return Err(Error::unsupported_feature("external folder definitions"));
    }

    for _ in 0..num_blocks {
        archive.blocks.push(read_block(header)?);
    }

    let nid = read_u8(header)?;
    if nid != K_CODERS_UNPACK_SIZE {
        return Err(Error::bad_header(format!("expected kCodersUnpackSize, got {nid}")));
    }

    for block in archive.blocks.iter_mut() {
        let tos = block.total_output_streams;
        block.unpack_sizes.reserve_exact(tos);
        for _ in 0..tos {
            block.unpack_sizes.push(read_u64(header)?);
        }
    }

    let mut nid = read_u8(header)?;
    if nid == K_CRC {
        let crcs_defined = read_all_or_bits(header, num_blocks)?;
        for i in 0..num_blocks {
            if crcs_defined.contains(i) {
                archive.blocks[i].has_crc = true;
                archive.blocks[i].crc = read_u32(header)? as u64;
            } else {
                archive.blocks[i].has_crc = false;
            }
        }
        nid = read_u8(header)?;
    }
    if nid != K_END {
        return Err(Error::bad_header("unpackInfo not terminated"));
    }

    Ok(())
}

fn read_sub_streams_info<R: Read>(header: &mut R, archive: &mut Archive) -> Result<(), Error> {
    for block in archive.blocks.iter_mut() {
        block.num_unpack_sub_streams = 1;
    }
    let mut total_unpack_streams = archive.blocks.len();

    let mut nid = read_u8(header)?;
    if nid == K_NUM_UNPACK_STREAM {
        total_unpack_streams = 0;
        for block in archive.blocks.iter_mut() {
            let num_streams = read_usize(header, "numStreams")?;
            block.num_unpack_sub_streams = num_streams;
            total_unpack_streams += num_streams;
        }
        nid = read_u8(header)?;
    }

    let mut sub_streams_info = SubStreamsInfo::default();
    sub_streams_info.unpack_sizes.resize(total_unpack_streams, Default::default());
    sub_streams_info.has_crc.reserve_len_exact(total_unpack_streams);
    sub_streams_info.crcs = vec![0; total_unpack_streams];

    let mut next_unpack_stream = 0;
    for block in archive.blocks.iter() {
        if block.num_unpack_sub_streams == 0 {
            continue;
        }
        let mut sum = 0;
        if nid == K_SIZE {
            for _i in 0..block.num_unpack_sub_streams - 1 {
                let size = read_u64(header)?;
                sub_streams_info.unpack_sizes[next_unpack_stream] = size;
                next_unpack_stream += 1;
                sum += size;
            }
        }
        if sum > block.get_unpack_size() {
            return Err(Error::bad_header("sum of unpack sizes of block exceeds total unpack size"));
        }
        sub_streams_info.unpack_sizes[next_unpack_stream] = block.get_unpack_size() - sum;
        next_unpack_stream += 1;
    }
    if nid == K_SIZE {
        nid = read_u8(header)?;
    }

    let mut num_digests = 0;
    for block in archive.blocks.iter() {
        if block.num_unpack_sub_streams != 1 || !block.has_crc {
            num_digests += block.num_unpack_sub_streams;
        }
    }

    if nid == K_CRC {
        let has_missing_crc = read_all_or_bits(header, num_digests)?;
        let mut missing_crcs = vec![0; num_digests];
        for (i, missing_crc) in missing_crcs.iter_mut().enumerate() {
            if has_missing_crc.contains(i) {
                *missing_crc = read_u32(header)? as u64;
            }
        }
        let mut next_crc = 0;
        let mut next_missing_crc = 0;
        for block in archive.blocks.iter() {
            if block.num_unpack_sub_streams == 1 && block.has_crc {
                sub_streams_info.has_crc.insert(next_crc);
                sub_streams_info.crcs[next_crc] = block.crc;
                next_crc += 1;
            } else {
                for _i in 0..block.num_unpack_sub_streams {
                    if has_missing_crc.contains(next_missing_crc) {
                        sub_streams_info.has_crc.insert(next_crc);
                    } else {
                        sub_streams_info.has_crc.remove(next_crc);
                    }
                    sub_streams_info.crcs[next_crc] = missing_crcs[next_missing_crc];
                    next_crc += 1;
                    next_missing_crc += 1;
                }
            }
        }

        nid = read_u8(header)?;
    }

    if nid != K_END {
        return Err(Error::bad_header("subStreamsInfo not terminated"));
    }

    archive.sub_streams_info = Some(sub_streams_info);
    Ok(())
}

fn read_block<R: Read>(header: &mut R) -> Result<Block, Error> {
    let mut block = Block::default();

    let num_coders = read_usize(header, "num coders")?;
    let mut coders = Vec::with_capacity(num_coders);
    let mut total_in_streams = 0;
    let mut total_out_streams = 0;
    for _i in 0..num_coders {
        let mut coder = Coder::default();
        let bits = read_u8(header)?;
        let id_size = bits & 0xF;
        let is_simple = (bits & 0x10) == 0;
        let has_attributes = (bits & 0x20) != 0;
        let more_alternative_methods = (bits & 0x80) != 0;

        coder.id_size = id_size as usize;

        header
            .read(coder.decompression_method_id_mut())
            .map_err(Error::io)?;
        if is_simple {
            coder.num_in_streams = 1;
            coder.num_out_streams = 1;
        } else {
            coder.num_in_streams = read_u64(header)?;
            coder.num_out_streams = read_u64(header)?;
        }
        total_in_streams += coder.num_in_streams;
        total_out_streams += coder.num_out_streams;
        if has_attributes {
            let properties_size = read_usize(header, "properties size")?;
            let mut props = vec![0u8; properties_size];
            header.read(&mut props).map_err(Error::io)?;
            coder.properties = props;
        }
        coders.push(coder);
        if more_alternative_methods {
            return Err(Error::unsupported_feature("alternative coder methods"));
        }
    }
    block.coders = coders;
    let total_in_streams = assert_usize(total_in_streams, "totalInStreams")?;
    let total_out_streams = assert_usize(total_out_streams, "totalOutStreams")?;
    block.total_input_streams = total_in_streams;
    block.total_output_streams = total_out_streams;

    if total_out_streams == 0 {
        return Err(Error::bad_header("total output streams can't be 0"));
    }
    let num_bind_pairs = total_out_streams - 1;
    let mut bind_pairs = Vec::with_capacity(num_bind_pairs);
    for _ in 0..num_bind_pairs {
        let bp = BindPair {
            in_index: read_u64(header)?,
            out_index: read_u64(header)?,
        };
        bind_pairs.push(bp);
    }
    block.bind_pairs = bind_pairs;

    if total_in_streams < num_bind_pairs {
        return Err(Error::bad_header(
            "total input streams can't be less than the number of bind pairs",
        ));
    }
    let num_packed_streams = total_in_streams - num_bind_pairs;
    let mut packed_streams = vec![0; num_packed_streams];
    if num_packed_streams == 1 {
        let mut index = u64::MAX;
        for i in 0..total_in_streams {
            if block.find_bind_pair_for_in_stream(i).is_none() {
                index = i as u64;
                break;
            }
        }
        if index == u64::MAX {
            return Err(Error::bad_header("couldn't find stream's bind pair index"));
        }
        packed_streams[0] = index;
    } else {
        for packed_stream in packed_streams.iter_mut() {
            *packed_stream = read_u64(header)?;
        }
    }
    block.packed_streams = packed_streams;

    Ok(block)
}

#[inline]
fn read_usize<R: Read>(reader: &mut R, field: &str) -> Result<usize, Error> {
    let size = read_u64(reader)?;
    assert_usize(size, field)
}

#[inline]
fn assert_usize(size: u64, field: &str) -> Result<usize, Error> {
    if size > usize::MAX as u64 {
        return Err(Error::bad_header(format!("cannot handle {field} {size}")));
    }
    Ok(size as usize)
}

#[inline]
fn read_u64le<R: Read>(reader: &mut R) -> Result<u64, Error> {
    let mut buf = [0; 8];
    reader.read_exact(&mut buf).map_err(Error::io)?;
    Ok(u64::from_le_bytes(buf))
}

/// Decodes a 7z variable-length integer: a leading byte whose high bits (MSB-first) count how
/// many extra little-endian bytes follow, with the remaining low bits contributing the top byte
/// of the value.
pub(crate) fn read_u64<R: Read>(reader: &mut R) -> Result<u64, Error> {
    let first = read_u8(reader)? as u64;
    let mut mask = 0x80_u64;
    let mut value = 0;
    for i in 0..8 {
        if (first & mask) == 0 {
            return Ok(value | ((first & (mask - 1)) << (8 * i)));
        }
        let b = read_u8(reader)? as u64;
        value |= b << (8 * i);
        mask >>= 1;
    }
    Ok(value)
}

#[inline(always)]
pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32, Error> {
    let mut buf = [0; 4];
    reader.read_exact(&mut buf).map_err(Error::io)?;
    Ok(u32::from_le_bytes(buf))
}

#[inline(always)]
pub(crate) fn read_u8<R: Read>(reader: &mut R) -> Result<u8, Error> {
    let mut buf = [0];
    reader.read_exact(&mut buf).map_err(Error::io)?;
    Ok(buf[0])
}

fn read_all_or_bits<R: Read>(header: &mut R, size: usize) -> Result<BitSet, Error> {
    let all = read_u8(header)?;
    if all != 0 {
        let mut bits = BitSet::with_capacity(size);
        for i in 0..size {
            bits.insert(i);
        }
        Ok(bits)
    } else {
        read_bits(header, size)
    }
}

fn read_bits<R: Read>(header: &mut R, size: usize) -> Result<BitSet, Error> {
    let mut bits = BitSet::with_capacity(size);
    let mut mask = 0u32;
    let mut cache = 0u32;
    for i in 0..size {
        if mask == 0 {
            mask = 0x80;
            cache = read_u8(header)? as u32;
        }
        if (cache & mask) != 0 {
            bits.insert(i);
        }
        mask >>= 1;
    }
    Ok(bits)
}

struct NamesReader<'a, R: Read> {
    max_bytes: usize,
    read_bytes: usize,
    cache: Vec<u16>,
    reader: &'a mut R,
}

impl<'a, R: Read> NamesReader<'a, R> {
    fn new(reader: &'a mut R, max_bytes: usize) -> Self {
        Self {
            max_bytes,
            reader,
            read_bytes: 0,
            cache: Vec::with_capacity(16),
        }
    }
}

impl<R: Read> Iterator for NamesReader<'_, R> {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.max_bytes <= self.read_bytes {
            return None;
        }
        self.cache.clear();
        let mut buf = [0; 2];
        while self.read_bytes < self.max_bytes {
            let r = self.reader.read_exact(&mut buf).map_err(Error::io);
            self.read_bytes += 2;
            if let Err(e) = r {
                return Some(Err(e));
            }
            let u = u16::from_le_bytes(buf);
            if u == 0 {
                break;
            }
            self.cache.push(u);
        }

        Some(String::from_utf16(&self.cache).map_err(|e| Error::bad_header(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn varint_single_byte() {
        let mut c = Cursor::new(vec![0x05]);
        assert_eq!(read_u64(&mut c).unwrap(), 5);
    }

    #[test]
    fn varint_two_bytes() {
        // 0b1000_0000 then one trailing byte: value = trailing byte.
        let mut c = Cursor::new(vec![0x80, 0x2A]);
        assert_eq!(read_u64(&mut c).unwrap(), 0x2A);
    }

    #[test]
    fn varint_all_ones_prefix() {
        // 0xFF means 8 trailing bytes follow, full little-endian u64.
        let mut c = Cursor::new(vec![0xFF, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(read_u64(&mut c).unwrap(), 1);
    }

    #[test]
    fn missing_name_falls_back_to_archive_default() {
        let mut buf = Vec::new();
        buf.push(0x01); // num_files = 1
        buf.push(K_NAME);
        buf.push(0x03); // size: 1 external byte + 2 name bytes
        buf.push(0x00); // external = false
        buf.extend_from_slice(&0u16.to_le_bytes()); // empty name: just the terminator
        buf.push(0x00); // kEnd of files_info properties

        let mut archive = Archive { default_file_name: "myarchive".to_string(), ..Archive::default() };
        archive.sub_streams_info = Some(SubStreamsInfo {
            unpack_sizes: vec![4],
            has_crc: BitSet::default(),
            crcs: vec![0],
        });

        let mut cursor = Cursor::new(buf);
        read_files_info(&mut cursor, &mut archive).unwrap();

        assert_eq!(archive.files.len(), 1);
        assert_eq!(archive.files[0].name, "myarchive");
    }

    #[test]
    fn names_reader_splits_on_null_terminators() {
        let mut buf = Vec::new();
        for ch in "ab".encode_utf16() {
            buf.extend_from_slice(&ch.to_le_bytes());
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
        for ch in "c".encode_utf16() {
            buf.extend_from_slice(&ch.to_le_bytes());
        }
        buf.extend_from_slice(&0u16.to_le_bytes());

        let mut cursor = Cursor::new(buf.clone());
        let names: Vec<_> = NamesReader::new(&mut cursor, buf.len())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(names, vec!["ab".to_string(), "c".to_string()]);
    }
}

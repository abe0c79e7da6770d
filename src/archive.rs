use crate::{bitset::BitSet, block::*, time::NtTime};

pub(crate) const SIGNATURE_HEADER_SIZE: u64 = 32;
pub(crate) const SEVEN_Z_SIGNATURE: &[u8] = &[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C];

pub(crate) const K_END: u8 = 0x00;
pub(crate) const K_HEADER: u8 = 0x01;
pub(crate) const K_ARCHIVE_PROPERTIES: u8 = 0x02;
pub(crate) const K_ADDITIONAL_STREAMS_INFO: u8 = 0x03;
pub(crate) const K_MAIN_STREAMS_INFO: u8 = 0x04;
pub(crate) const K_FILES_INFO: u8 = 0x05;
pub(crate) const K_PACK_INFO: u8 = 0x06;
pub(crate) const K_UNPACK_INFO: u8 = 0x07;
pub(crate) const K_SUB_STREAMS_INFO: u8 = 0x08;
pub(crate) const K_SIZE: u8 = 0x09;
pub(crate) const K_CRC: u8 = 0x0A;
pub(crate) const K_FOLDER: u8 = 0x0B;
pub(crate) const K_CODERS_UNPACK_SIZE: u8 = 0x0C;
pub(crate) const K_NUM_UNPACK_STREAM: u8 = 0x0D;
pub(crate) const K_EMPTY_STREAM: u8 = 0x0E;
pub(crate) const K_EMPTY_FILE: u8 = 0x0F;
pub(crate) const K_ANTI: u8 = 0x10;
pub(crate) const K_NAME: u8 = 0x11;
pub(crate) const K_C_TIME: u8 = 0x12;
pub(crate) const K_A_TIME: u8 = 0x13;
pub(crate) const K_M_TIME: u8 = 0x14;
pub(crate) const K_WIN_ATTRIBUTES: u8 = 0x15;
pub(crate) const K_ENCODED_HEADER: u8 = 0x17;
pub(crate) const K_START_POS: u8 = 0x18;
pub(crate) const K_DUMMY: u8 = 0x19;

/// Highest allowed nesting depth of an `EncodedHeader` wrapping another `EncodedHeader`.
pub(crate) const MAX_ENCODED_HEADER_DEPTH: u32 = 2;

/// Windows `FILE_ATTRIBUTE_DIRECTORY` bit in `ArchiveEntry::windows_attributes`.
pub(crate) const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;
/// Marker bit that tells readers the upper 16 bits of `windows_attributes` hold a POSIX
/// `st_mode` value, following 7-Zip's own `kAttributes` convention for archives written on
/// Unix-like systems.
pub(crate) const FILE_ATTRIBUTE_UNIX_EXTENSION: u32 = 0x8000;
pub(crate) const S_IFMT: u32 = 0o170000;
pub(crate) const S_IFLNK: u32 = 0o120000;
pub(crate) const S_IFDIR: u32 = 0o040000;

/// Represents a parsed 7z archive structure.
///
/// Contains metadata about the archive including files, compression blocks,
/// and internal structure information necessary for decompression.
#[derive(Debug, Default, Clone)]
pub struct Archive {
    /// Offset from beginning of file + SIGNATURE_HEADER_SIZE to packed streams.
    pub(crate) pack_pos: u64,
    pub(crate) pack_sizes: Vec<u64>,
    pub(crate) pack_crcs_defined: BitSet,
    pub(crate) pack_crcs: Vec<u64>,
    pub(crate) sub_streams_info: Option<SubStreamsInfo>,
    /// Compression blocks (folders) in the archive.
    pub blocks: Vec<Block>,
    /// File and directory entries in the archive.
    pub files: Vec<ArchiveEntry>,
    /// Mapping between files, blocks, and pack streams.
    pub stream_map: StreamMap,
    /// Whether this is a solid archive (better compression, slower random access).
    pub is_solid: bool,
    /// Name substituted for a file whose `kName` entry is empty or absent: the archive's own
    /// base name (without extension) when opened from a path, or the literal `contents` when
    /// opened from an arbitrary stream.
    pub(crate) default_file_name: String,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct SubStreamsInfo {
    pub(crate) unpack_sizes: Vec<u64>,
    pub(crate) has_crc: BitSet,
    pub(crate) crcs: Vec<u64>,
}

/// Represents a single file or directory entry within a 7z archive.
///
/// Contains metadata about the entry including name, timestamps, attributes,
/// and size information.
#[derive(Debug, Default, Clone)]
pub struct ArchiveEntry {
    /// Name/path of the entry within the archive.
    pub name: String,
    /// Whether this entry has an associated data stream.
    pub has_stream: bool,
    /// Whether this entry is a directory.
    pub is_directory: bool,
    /// Whether this is an anti-item (a tombstone meaning "delete this path on extraction").
    pub is_anti_item: bool,
    /// Whether creation date is present.
    pub has_creation_date: bool,
    /// Whether last modified date is present.
    pub has_last_modified_date: bool,
    /// Whether access date is present.
    pub has_access_date: bool,
    /// Creation date and time.
    ///
    /// The source this format was distilled from sets this equal to `last_modified_date`
    /// whenever no creation time is stored in the archive. That is very likely a mislabel
    /// (the evident intent is "use mtime for both atime and mtime when ctime is absent"),
    /// but the behavior is preserved here rather than corrected. See DESIGN.md.
    pub creation_date: NtTime,
    /// Last modified date and time.
    pub last_modified_date: NtTime,
    /// Last access date and time.
    pub access_date: NtTime,
    /// Whether Windows file attributes are present.
    pub has_windows_attributes: bool,
    /// Windows file attributes (or, with `FILE_ATTRIBUTE_UNIX_EXTENSION` set, a POSIX mode in
    /// the upper 16 bits).
    pub windows_attributes: u32,
    /// Whether CRC is present.
    pub has_crc: bool,
    /// CRC32 checksum of uncompressed data.
    pub crc: u64,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Compressed size in bytes. Only meaningful when the owning block holds exactly one
    /// substream; `0` for solid blocks, where a single file's share of the packed bytes is
    /// not defined.
    pub compressed_size: u64,
}

impl ArchiveEntry {
    /// Creates a new default archive entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new archive entry representing a file.
    pub fn new_file(entry_name: &str) -> Self {
        Self {
            name: entry_name.to_string(),
            has_stream: true,
            is_directory: false,
            ..Default::default()
        }
    }

    /// Creates a new archive entry representing a directory.
    pub fn new_directory(entry_name: &str) -> Self {
        Self {
            name: entry_name.to_string(),
            has_stream: false,
            is_directory: true,
            ..Default::default()
        }
    }

    /// Returns the name/path of this entry within the archive.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Returns whether this entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Returns whether this entry has an associated data stream.
    pub fn has_stream(&self) -> bool {
        self.has_stream
    }

    /// Returns the creation date of this entry.
    pub fn creation_date(&self) -> NtTime {
        self.creation_date
    }

    /// Returns the last modified date of this entry.
    pub fn last_modified_date(&self) -> NtTime {
        self.last_modified_date
    }

    /// Returns the uncompressed size of this entry in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the Windows file attributes of this entry.
    pub fn windows_attributes(&self) -> u32 {
        self.windows_attributes
    }

    /// Returns the last access date of this entry.
    pub fn access_date(&self) -> NtTime {
        self.access_date
    }

    /// Returns whether this entry is an anti-item.
    pub fn is_anti_item(&self) -> bool {
        self.is_anti_item
    }

    /// Returns the POSIX `st_mode` carried in the upper 16 bits of `windows_attributes`, when
    /// `FILE_ATTRIBUTE_UNIX_EXTENSION` is set.
    pub fn unix_mode(&self) -> Option<u32> {
        if !self.has_windows_attributes {
            return None;
        }
        if self.windows_attributes & FILE_ATTRIBUTE_UNIX_EXTENSION == 0 {
            return None;
        }
        Some(self.windows_attributes >> 16)
    }

    /// Returns whether this entry is a POSIX symbolic link (`empty_stream == false` and the
    /// POSIX mode's file-type bits are `S_IFLNK`).
    pub fn is_symlink(&self) -> bool {
        self.has_stream && matches!(self.unix_mode(), Some(m) if m & S_IFMT == S_IFLNK)
    }
}

/// Encoder/decoder method identified by its name and 7z method id.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Hash)]
pub struct EncoderMethod(&'static str, &'static [u8]);

impl EncoderMethod {
    /// Method ID for COPY (no compression).
    pub const ID_COPY: &'static [u8] = &[0x00];
    /// Method ID for Delta filter.
    pub const ID_DELTA: &'static [u8] = &[0x03];
    /// Method ID for LZMA compression.
    pub const ID_LZMA: &'static [u8] = &[0x03, 0x01, 0x01];
    /// Method ID for BCJ x86 filter.
    pub const ID_BCJ_X86: &'static [u8] = &[0x03, 0x03, 0x01, 0x03];
    /// Method ID for BCJ2 filter (multi-input; unsupported, see DESIGN.md).
    pub const ID_BCJ2: &'static [u8] = &[0x03, 0x03, 0x01, 0x1B];
    /// Method ID for BCJ PowerPC filter.
    pub const ID_BCJ_PPC: &'static [u8] = &[0x03, 0x03, 0x02, 0x05];
    /// Method ID for BCJ IA64 filter.
    pub const ID_BCJ_IA64: &'static [u8] = &[0x03, 0x03, 0x04, 0x01];
    /// Method ID for BCJ ARM filter.
    pub const ID_BCJ_ARM: &'static [u8] = &[0x03, 0x03, 0x05, 0x01];
    /// Method ID for BCJ ARM64 filter.
    pub const ID_BCJ_ARM64: &'static [u8] = &[0xA];
    /// Method ID for BCJ ARM Thumb filter.
    pub const ID_BCJ_ARM_THUMB: &'static [u8] = &[0x03, 0x03, 0x07, 0x01];
    /// Method ID for BCJ SPARC filter.
    pub const ID_BCJ_SPARC: &'static [u8] = &[0x03, 0x03, 0x08, 0x05];
    /// Method ID for PPMd compression.
    pub const ID_PPMD: &'static [u8] = &[0x03, 0x04, 0x01];
    /// Method ID for LZMA2 compression.
    pub const ID_LZMA2: &'static [u8] = &[0x21];
    /// Method ID for BZip2 compression.
    pub const ID_BZIP2: &'static [u8] = &[0x04, 0x02, 0x02];
    /// Method ID for Zstandard compression.
    pub const ID_ZSTD: &'static [u8] = &[0x04, 0xF7, 0x11, 0x01];
    /// Method ID for Deflate compression.
    pub const ID_DEFLATE: &'static [u8] = &[0x04, 0x01, 0x08];

    /// COPY method (no compression).
    pub const COPY: Self = Self("COPY", Self::ID_COPY);
    /// LZMA compression method.
    pub const LZMA: Self = Self("LZMA", Self::ID_LZMA);
    /// LZMA2 compression method.
    pub const LZMA2: Self = Self("LZMA2", Self::ID_LZMA2);
    /// PPMd compression method.
    pub const PPMD: Self = Self("PPMD", Self::ID_PPMD);
    /// BZip2 compression method.
    pub const BZIP2: Self = Self("BZIP2", Self::ID_BZIP2);
    /// Zstandard compression method.
    pub const ZSTD: Self = Self("ZSTD", Self::ID_ZSTD);
    /// Deflate compression method.
    pub const DEFLATE: Self = Self("DEFLATE", Self::ID_DEFLATE);
    /// BCJ x86 filter method.
    pub const BCJ_X86_FILTER: Self = Self("BCJ_X86", Self::ID_BCJ_X86);
    /// BCJ PowerPC filter method.
    pub const BCJ_PPC_FILTER: Self = Self("BCJ_PPC", Self::ID_BCJ_PPC);
    /// BCJ IA64 filter method.
    pub const BCJ_IA64_FILTER: Self = Self("BCJ_IA64", Self::ID_BCJ_IA64);
    /// BCJ ARM filter method.
    pub const BCJ_ARM_FILTER: Self = Self("BCJ_ARM", Self::ID_BCJ_ARM);
    /// BCJ ARM64 filter method.
    pub const BCJ_ARM64_FILTER: Self = Self("BCJ_ARM64", Self::ID_BCJ_ARM64);
    /// BCJ ARM Thumb filter method.
    pub const BCJ_ARM_THUMB_FILTER: Self = Self("BCJ_ARM_THUMB", Self::ID_BCJ_ARM_THUMB);
    /// BCJ SPARC filter method.
    pub const BCJ_SPARC_FILTER: Self = Self("BCJ_SPARC", Self::ID_BCJ_SPARC);
    /// Delta filter method.
    pub const DELTA_FILTER: Self = Self("DELTA", Self::ID_DELTA);
    /// BCJ2 filter method (topology is recognized; decoding is unsupported).
    pub const BCJ2_FILTER: Self = Self("BCJ2", Self::ID_BCJ2);

    const METHODS: &'static [&'static EncoderMethod] = &[
        &Self::COPY,
        &Self::LZMA,
        &Self::LZMA2,
        &Self::PPMD,
        &Self::BZIP2,
        &Self::ZSTD,
        &Self::DEFLATE,
        &Self::BCJ_X86_FILTER,
        &Self::BCJ_PPC_FILTER,
        &Self::BCJ_IA64_FILTER,
        &Self::BCJ_ARM_FILTER,
        &Self::BCJ_ARM64_FILTER,
        &Self::BCJ_ARM_THUMB_FILTER,
        &Self::BCJ_SPARC_FILTER,
        &Self::DELTA_FILTER,
        &Self::BCJ2_FILTER,
    ];

    /// Returns the human-readable name of this encoder method.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.0
    }

    /// Returns the binary ID of this encoder method.
    #[inline]
    pub const fn id(&self) -> &'static [u8] {
        self.1
    }

    /// Finds an encoder method by its binary ID.
    #[inline]
    pub fn by_id(id: &[u8]) -> Option<Self> {
        Self::METHODS.iter().find(|item| item.id() == id).cloned().cloned()
    }
}

/// Mapping structure that correlates files, blocks, and pack streams within an archive.
#[derive(Debug, Default, Clone)]
pub struct StreamMap {
    pub(crate) block_first_pack_stream_index: Vec<usize>,
    pub(crate) pack_stream_offsets: Vec<u64>,
    /// Index of first file for each block.
    pub block_first_file_index: Vec<usize>,
    /// Block index for each file (`None` if the file has no data stream).
    pub file_block_index: Vec<Option<usize>>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct StartHeader {
    pub(crate) next_header_offset: u64,
    pub(crate) next_header_size: u64,
    pub(crate) next_header_crc: u64,
}

/// Flattened, display-friendly view of an [`ArchiveEntry`], as returned by
/// [`ArchiveReader::list`](crate::ArchiveReader::list).
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Name/path of the entry within the archive.
    pub name: String,
    /// Uncompressed size in bytes.
    pub uncompressed_size: u64,
    /// Compressed size in bytes, when meaningful (see [`ArchiveEntry::compressed_size`]).
    pub compressed_size: Option<u64>,
    /// Whether this entry is a directory.
    pub is_directory: bool,
    /// Whether this entry's data stream (if any) can be extracted; `false` for anti-items.
    pub archivable: bool,
    /// Last-write timestamp.
    pub last_modified_date: NtTime,
}

impl From<&ArchiveEntry> for FileInfo {
    fn from(entry: &ArchiveEntry) -> Self {
        Self {
            name: entry.name.clone(),
            uncompressed_size: entry.size,
            compressed_size: (!entry.is_directory && entry.compressed_size > 0).then_some(entry.compressed_size),
            is_directory: entry.is_directory,
            archivable: !entry.is_anti_item,
            last_modified_date: entry.last_modified_date,
        }
    }
}

/// Summary information about an opened archive, independent of any individual file.
#[derive(Debug, Clone, Default)]
pub struct ArchiveInfo {
    /// Total size of the archive file in bytes.
    pub total_size: u64,
    /// Size in bytes of the (decoded) metadata header.
    pub header_size: u64,
    /// Names of the distinct coder methods used across all blocks, in first-seen order.
    pub method_names: Vec<&'static str>,
    /// Whether any block in the archive is solid (holds more than one substream).
    pub is_solid: bool,
    /// Number of blocks (folders) in the archive.
    pub folder_count: usize,
}

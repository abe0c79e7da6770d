//! A reader (and minimal single-folder writer) for the 7z archive container format.
//!
//! This is a narrowed, from-scratch reimplementation covering the parts of the format needed to
//! open a 7z archive, reconstruct its file list from folder/substream metadata, and decompress
//! entries — including solid archives, multi-coder filter chains (BCJ/Delta + a backend codec),
//! and optional parallel-across-folder extraction.
//!
//! ## Supported codecs & filters
//!
//! | Codec   | Decompression |
//! |---------|---------------|
//! | COPY    | always        |
//! | LZMA    | always        |
//! | LZMA2   | always        |
//! | DELTA   | always        |
//! | BCJ (x86, ARM, ARM64, ARM Thumb, PPC, IA64, SPARC) | always |
//! | BZIP2   | `bzip2` feature (default) |
//! | DEFLATE | `deflate` feature (default) |
//! | PPMD    | `ppmd` feature (default) |
//! | ZSTD    | `zstd` feature |
//!
//! BCJ2 (the one multi-input-stream filter) and encrypted archives are intentionally out of
//! scope; see `DESIGN.md` for why.
#![warn(missing_docs)]

pub(crate) mod archive;
pub(crate) mod bitset;
pub(crate) mod block;
pub(crate) mod decoder;
mod error;
pub(crate) mod header;
mod reader;
mod time;
#[cfg(feature = "util")]
mod util;
mod worker;
mod writer;

pub use archive::{Archive, ArchiveEntry, ArchiveInfo, EncoderMethod, FileInfo, StreamMap};
pub use block::{Block, Coder};
pub use error::Error;
pub use reader::{ArchiveReader, BlockDecoder};
pub use time::{NtTime, NtTimeError};
#[cfg(feature = "util")]
pub use util::{decompress, decompress_file};
pub use worker::{extractall, extractall_parallel, test, FileSink};
pub use writer::ArchiveWriter;

use std::{borrow::Cow, fmt::Display};

/// The error type of the crate.
#[derive(Debug)]
pub enum Error {
    /// Invalid 7z signature found in file header.
    NotSevenZ([u8; 6]),
    /// Unsupported 7z format version.
    UnsupportedVersion {
        /// Major version number.
        major: u8,
        /// Minor version number.
        minor: u8,
    },
    /// Structural violation encountered while decoding the metadata header.
    BadHeader(Cow<'static, str>),
    /// A CRC check failed: start header, next header, pack stream, unpack stream, or substream.
    Corrupt(Cow<'static, str>),
    /// End of the underlying source was reached before the expected number of bytes was read.
    Truncated,
    /// A coder's method id has no registered decoder.
    UnsupportedMethod(String),
    /// A feature this core intentionally narrows is not implemented.
    UnsupportedFeature(Cow<'static, str>),
    /// IO error with optional context message.
    Io(std::io::Error, Cow<'static, str>),
    /// Error opening a file.
    FileOpen(std::io::Error, String),
    /// An archive entry name would extract outside of the target directory.
    PathEscape(String),
    /// Memory limit exceeded.
    MaxMemLimited {
        /// Maximum allowed memory in KB.
        max_kb: usize,
        /// Actual required memory in KB.
        actual_kb: usize,
    },
    /// A named file was not found in the archive.
    FileNotFound,
    /// Other error with description, used for conditions not otherwise classified.
    Other(Cow<'static, str>),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::io(value)
    }
}

impl Error {
    #[inline]
    pub(crate) fn other<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Self::Other(s.into())
    }

    #[inline]
    pub(crate) fn bad_header<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Self::BadHeader(s.into())
    }

    #[inline]
    pub(crate) fn corrupt<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Self::Corrupt(s.into())
    }

    #[inline]
    pub(crate) fn unsupported_feature<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Self::UnsupportedFeature(s.into())
    }

    #[inline]
    pub(crate) fn io(e: std::io::Error) -> Self {
        Self::io_msg(e, "")
    }

    #[inline]
    pub(crate) fn io_msg(e: std::io::Error, msg: impl Into<Cow<'static, str>>) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Self::Truncated;
        }
        if let Some(crc) = e.get_ref().and_then(|inner| inner.downcast_ref::<CrcMismatch>()) {
            return Self::Corrupt(crc.0.clone());
        }
        Self::Io(e, msg.into())
    }

    #[inline]
    pub(crate) fn file_open(e: std::io::Error, filename: impl Into<Cow<'static, str>>) -> Self {
        Self::FileOpen(e, filename.into().into_owned())
    }
}

/// Carried inside a `std::io::Error` by [`crate::reader::Crc32VerifyingReader`] so that
/// `Error::io`/`io_msg` can recover a precise [`Error::Corrupt`] instead of a generic `Error::Io`
/// once the failure has crossed a `Read` boundary.
#[derive(Debug)]
pub(crate) struct CrcMismatch(pub(crate) Cow<'static, str>);

impl Display for CrcMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for CrcMismatch {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self, f)
    }
}

impl std::error::Error for Error {}

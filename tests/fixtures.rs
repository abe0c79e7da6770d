//! Integration tests driven by hand-built archive bytes, for scenarios `ArchiveWriter` can't
//! produce on its own (it never writes CRCs or Windows/POSIX attributes; see its doc comment).
//! These exercise the full parse -> reconstruct -> extract pipeline through the public
//! `ArchiveReader`/`extractall`/`test` API, just starting from a fixture instead of a writer.

use std::{fs, io::Cursor};

use sevenz_core::{extractall, test as test_archive, ArchiveReader, Error};
use tempfile::tempdir;

const K_HEADER: u8 = 0x01;
const K_MAIN_STREAMS_INFO: u8 = 0x04;
const K_FILES_INFO: u8 = 0x05;
const K_PACK_INFO: u8 = 0x06;
const K_UNPACK_INFO: u8 = 0x07;
const K_SUB_STREAMS_INFO: u8 = 0x08;
const K_SIZE: u8 = 0x09;
const K_CRC: u8 = 0x0A;
const K_FOLDER: u8 = 0x0B;
const K_CODERS_UNPACK_SIZE: u8 = 0x0C;
const K_NAME: u8 = 0x11;
const K_WIN_ATTRIBUTES: u8 = 0x15;
const K_END: u8 = 0x00;
const SIGNATURE_HEADER_SIZE: usize = 32;

fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
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
    buf.push(first);
    for _ in 0..extra_bytes {
        buf.push((value & 0xFF) as u8);
        value >>= 8;
    }
}

/// Builds a single-block, single-file, COPY-method 7z archive as raw bytes, with optional
/// pack-stream/folder CRCs and Windows/POSIX attributes that the public writer never emits.
struct FixtureArchive {
    name: &'static str,
    content: Vec<u8>,
    pack_crc: Option<u32>,
    block_crc: Option<u32>,
    win_attributes: Option<u32>,
}

impl FixtureArchive {
    fn build(&self) -> Vec<u8> {
        let mut header_body = Vec::new();
        header_body.push(K_MAIN_STREAMS_INFO);

        header_body.push(K_PACK_INFO);
        write_varint(&mut header_body, 0); // pack_pos
        write_varint(&mut header_body, 1); // num pack streams
        header_body.push(K_SIZE);
        write_varint(&mut header_body, self.content.len() as u64);
        if let Some(crc) = self.pack_crc {
            header_body.push(K_CRC);
            header_body.push(1); // all defined
            header_body.extend_from_slice(&crc.to_le_bytes());
        }
        header_body.push(K_END);

        header_body.push(K_UNPACK_INFO);
        header_body.push(K_FOLDER);
        write_varint(&mut header_body, 1); // num blocks
        header_body.push(0); // external
        write_varint(&mut header_body, 1); // num coders
        header_body.push(1); // bits: id_size = 1, simple coder, no attributes
        header_body.push(0x00); // COPY method id
        header_body.push(K_CODERS_UNPACK_SIZE);
        write_varint(&mut header_body, self.content.len() as u64);
        if let Some(crc) = self.block_crc {
            header_body.push(K_CRC);
            header_body.push(1); // all defined
            header_body.extend_from_slice(&crc.to_le_bytes());
        }
        header_body.push(K_END);

        header_body.push(K_SUB_STREAMS_INFO);
        header_body.push(K_END);

        header_body.push(K_END); // terminates MainStreamsInfo

        header_body.push(K_FILES_INFO);
        write_varint(&mut header_body, 1); // num files

        header_body.push(K_NAME);
        let mut name_buf = Vec::new();
        name_buf.push(0); // external
        for unit in self.name.encode_utf16() {
            name_buf.extend_from_slice(&unit.to_le_bytes());
        }
        name_buf.extend_from_slice(&[0u8; 2]);
        write_varint(&mut header_body, name_buf.len() as u64);
        header_body.extend_from_slice(&name_buf);

        if let Some(attrs) = self.win_attributes {
            header_body.push(K_WIN_ATTRIBUTES);
            write_varint(&mut header_body, 6);
            header_body.push(1); // all defined
            header_body.push(0); // external
            header_body.extend_from_slice(&attrs.to_le_bytes());
        }

        header_body.push(K_END); // terminates per-file property loop
        header_body.push(K_END); // terminates top-level header

        let mut next_header = Vec::new();
        next_header.push(K_HEADER);
        next_header.extend_from_slice(&header_body);
        let next_header_crc = crc32fast::hash(&next_header);

        let mut start_header = Vec::new();
        start_header.extend_from_slice(&(self.content.len() as u64).to_le_bytes()); // next_header_offset
        start_header.extend_from_slice(&(next_header.len() as u64).to_le_bytes());
        start_header.extend_from_slice(&next_header_crc.to_le_bytes());
        let start_header_crc = crc32fast::hash(&start_header);

        let mut out = Vec::with_capacity(SIGNATURE_HEADER_SIZE + self.content.len() + next_header.len());
        out.extend_from_slice(&[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C]);
        out.push(0); // major version
        out.push(4); // minor version
        out.extend_from_slice(&start_header_crc.to_le_bytes());
        out.extend_from_slice(&start_header);
        out.extend_from_slice(&self.content);
        out.extend_from_slice(&next_header);
        out
    }
}

#[test]
fn corrupted_pack_crc_fails_test_and_extraction() {
    let content = b"Hello\n".to_vec();
    let pack_crc = crc32fast::hash(&content);

    let fixture = FixtureArchive {
        name: "hello.txt",
        content: content.clone(),
        pack_crc: Some(pack_crc),
        block_crc: Some(pack_crc), // COPY: unpack bytes == pack bytes, same CRC
        win_attributes: None,
    };
    let mut bytes = fixture.build();

    // Flip one byte inside the packed region (right after the 32-byte signature header).
    bytes[SIGNATURE_HEADER_SIZE] ^= 0xFF;

    let mut reader = ArchiveReader::new(Cursor::new(bytes.clone())).unwrap();
    assert!(!test_archive(&mut reader).unwrap());

    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    let dir = tempdir().unwrap();
    let result = extractall(&mut reader, dir.path());
    assert!(matches!(result, Err(Error::Corrupt(_))));
}

#[test]
fn symlink_entry_round_trips_through_extraction() {
    const FILE_ATTRIBUTE_UNIX_EXTENSION: u32 = 0x8000;
    const S_IFLNK: u32 = 0o120000;

    let fixture = FixtureArchive {
        name: "link",
        content: b"target.txt".to_vec(),
        pack_crc: None,
        block_crc: None,
        win_attributes: Some(FILE_ATTRIBUTE_UNIX_EXTENSION | (S_IFLNK << 16)),
    };
    let bytes = fixture.build();

    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.names(), vec!["link"]);

    let dir = tempdir().unwrap();
    extractall(&mut reader, dir.path()).unwrap();

    let link_path = dir.path().join("link");
    #[cfg(unix)]
    {
        let target = fs::read_link(&link_path).unwrap();
        assert_eq!(target, std::path::Path::new("target.txt"));
    }
    #[cfg(not(unix))]
    {
        assert_eq!(fs::read(&link_path).unwrap(), b"target.txt");
    }
}

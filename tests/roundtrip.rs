use std::{
    fs,
    io::Cursor,
};

use sevenz_core::{extractall, test as test_archive, ArchiveReader, ArchiveWriter, Error};
use tempfile::tempdir;

fn write_to_vec(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    for (name, content) in entries {
        let dir = tempdir().unwrap();
        let path = dir.path().join("src");
        fs::write(&path, content).unwrap();
        writer.write(&path, *name).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn empty_archive_has_no_entries() {
    let bytes = write_to_vec(&[]);
    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    assert!(reader.names().is_empty());
    assert!(reader.list().is_empty());
    assert!(test_archive(&mut reader).unwrap());
}

#[test]
fn single_stored_file_round_trips() {
    let bytes = write_to_vec(&[("hello.txt", b"Hello\n")]);

    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.names(), vec!["hello.txt"]);

    let list = reader.list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "hello.txt");
    assert_eq!(list[0].uncompressed_size, 6);
    assert!(!list[0].is_directory);

    let dir = tempdir().unwrap();
    extractall(&mut reader, dir.path()).unwrap();
    assert_eq!(fs::read(dir.path().join("hello.txt")).unwrap(), b"Hello\n");
}

#[test]
fn solid_two_file_folder_extracts_in_order() {
    let bytes = write_to_vec(&[("a", b"AAAA"), ("b", b"BBBB")]);

    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.names(), vec!["a", "b"]);

    let list = reader.list();
    assert_eq!(list[0].compressed_size, None);
    assert_eq!(list[1].compressed_size, None);

    let dir = tempdir().unwrap();
    extractall(&mut reader, dir.path()).unwrap();
    assert_eq!(fs::read(dir.path().join("a")).unwrap(), b"AAAA");
    assert_eq!(fs::read(dir.path().join("b")).unwrap(), b"BBBB");
}

#[test]
fn path_escape_is_rejected_without_writing() {
    let bytes = write_to_vec(&[("../evil", b"nope")]);
    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();

    let dir = tempdir().unwrap();
    let result = extractall(&mut reader, dir.path());
    assert!(matches!(result, Err(Error::PathEscape(_))));

    let escaped = dir.path().parent().unwrap().join("evil");
    assert!(!escaped.exists());
}

#[test]
fn writeall_walks_nested_directories() {
    let src = tempdir().unwrap();
    fs::create_dir_all(src.path().join("sub")).unwrap();
    fs::write(src.path().join("top.txt"), b"top").unwrap();
    fs::write(src.path().join("sub/nested.txt"), b"nested").unwrap();

    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new())).unwrap();
    writer.writeall(src.path()).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = ArchiveReader::new(Cursor::new(bytes)).unwrap();
    let mut names = reader.names();
    names.sort_unstable();
    assert_eq!(names, vec!["sub", "sub/nested.txt", "top.txt"]);

    let dest = tempdir().unwrap();
    extractall(&mut reader, dest.path()).unwrap();
    assert_eq!(fs::read(dest.path().join("top.txt")).unwrap(), b"top");
    assert_eq!(fs::read(dest.path().join("sub/nested.txt")).unwrap(), b"nested");
}

//! Line iteration over text and binary files (spec §4.6, §8 scenario 4).

use asyncfiles::{Line, RuntimeBuilder};

fn runtime() -> asyncfiles::Runtime {
    RuntimeBuilder::new().enable_fs().build()
}

#[test]
fn text_lines_reconstruct_a_thousand_numbered_records() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("numbers.txt");

    let content: String = (0..1000).map(|i| format!("{i}\n")).collect();
    std::fs::write(&path, &content).unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "r").await.expect("open");
        let mut lines = file.lines();

        for i in 0..1000 {
            let line = lines.next().await.unwrap().expect("line should exist");
            match line {
                Line::Text(s) => assert_eq!(s, format!("{i}\n")),
                Line::Bytes(_) => panic!("expected text lines"),
            }
        }

        assert!(lines.next().await.unwrap().is_none(), "iteration must terminate at EOF");
    });
}

#[test]
fn trailing_residue_without_newline_is_yielded_once_then_iteration_ends() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("no-trailing-newline.txt");
    std::fs::write(&path, "first\nsecond\nthird-no-newline").unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "r").await.expect("open");
        let mut lines = file.lines();

        let mut collected = Vec::new();
        while let Some(line) = lines.next().await.unwrap() {
            match line {
                Line::Text(s) => collected.push(s),
                Line::Bytes(_) => panic!("expected text lines"),
            }
        }

        assert_eq!(collected, vec!["first\n", "second\n", "third-no-newline"]);
    });
}

#[test]
fn empty_file_yields_no_lines() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("empty.txt");
    std::fs::write(&path, "").unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "r").await.expect("open");
        let mut lines = file.lines();
        assert!(lines.next().await.unwrap().is_none());
    });
}

#[test]
fn binary_lines_include_the_trailing_newline_byte() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("binary-lines.bin");
    std::fs::write(&path, b"alpha\nbeta\ngamma").unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "rb").await.expect("open");
        let mut lines = file.lines();

        let first = lines.next().await.unwrap().unwrap();
        let second = lines.next().await.unwrap().unwrap();
        let third = lines.next().await.unwrap().unwrap();
        assert!(lines.next().await.unwrap().is_none());

        match (first, second, third) {
            (Line::Bytes(a), Line::Bytes(b), Line::Bytes(c)) => {
                assert_eq!(a, b"alpha\n");
                assert_eq!(b, b"beta\n");
                assert_eq!(c, b"gamma");
            }
            _ => panic!("expected binary lines"),
        }
    });
}

#[test]
fn line_iteration_is_non_restartable() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("one-shot.txt");
    std::fs::write(&path, "only-line\n").unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "r").await.expect("open");
        let mut lines = file.lines();

        let first = lines.next().await.unwrap();
        assert!(matches!(first, Some(Line::Text(ref s)) if s == "only-line\n"));

        // The record already consumed is never re-delivered.
        assert!(lines.next().await.unwrap().is_none());
    });
}

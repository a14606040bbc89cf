//! Buffered binary file: seek/tell consistency, truncate semantics, and the
//! read<->write mode-transition flush (spec §4.4, §8 scenario 6).

mod common;

use asyncfiles::{ReadData, RuntimeBuilder};
use std::io::SeekFrom;

fn runtime() -> asyncfiles::Runtime {
    common::init_tracing();
    RuntimeBuilder::new().enable_fs().build()
}

#[test]
fn seek_tell_consistency() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("digits.bin");
    std::fs::write(&path, b"0123456789").unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "rb").await.expect("open");

        let read5 = match file.read(5).await.unwrap() {
            ReadData::Bytes(b) => b,
            _ => unreachable!(),
        };
        assert_eq!(read5, b"01234");
        assert_eq!(file.tell(), 5);

        file.seek(SeekFrom::Start(0)).await.unwrap();
        let read3 = match file.read(3).await.unwrap() {
            ReadData::Bytes(b) => b,
            _ => unreachable!(),
        };
        assert_eq!(read3, b"012");

        let pos = file.seek(SeekFrom::Current(2)).await.unwrap();
        assert_eq!(pos, 5);
        assert_eq!(file.tell(), 5);

        let pos = file.seek(SeekFrom::End(-3)).await.unwrap();
        assert_eq!(pos, 7);
        assert_eq!(file.tell(), 7);

        file.close().await.unwrap();
    });
}

#[test]
fn truncate_shrinks_and_pads_per_posix_semantics() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trunc.bin");
    std::fs::write(&path, b"0123456789").unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "r+b").await.expect("open");

        file.truncate(Some(4)).await.unwrap();
        file.close().await.unwrap();
    });

    assert_eq!(std::fs::read(&path).unwrap(), b"0123");

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "r+b").await.expect("open");
        file.truncate(Some(8)).await.unwrap();
        file.close().await.unwrap();
    });

    let grown = std::fs::read(&path).unwrap();
    assert_eq!(grown.len(), 8);
    assert_eq!(&grown[..4], b"0123");
    assert_eq!(&grown[4..], &[0u8; 4]);
}

#[test]
fn write_after_read_flushes_and_corrects_the_os_offset() {
    // A small read-ahead buffer overshoots the logical position; switching
    // to write must discard that overshoot rather than write past it.
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mode-switch.bin");
    std::fs::write(&path, b"AAAAAAAAAA").unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open_with_capacity(&path, "r+b", 4)
            .await
            .expect("open with a small buffer");

        // Reads 2 bytes but the engine read-ahead pulls a full 4-byte chunk,
        // leaving the read buffer 2 bytes ahead of `position`.
        let read = match file.read(2).await.unwrap() {
            ReadData::Bytes(b) => b,
            _ => unreachable!(),
        };
        assert_eq!(read, b"AA");
        assert_eq!(file.tell(), 2);

        file.write_bytes(b"BB").await.unwrap();
        file.close().await.unwrap();
    });

    let contents = std::fs::read(&path).unwrap();
    assert_eq!(&contents[..4], b"AABB");
}

#[test]
fn read_after_write_flushes_before_reading() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("write-then-read.bin");
    std::fs::write(&path, b"0000000000").unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "r+b").await.expect("open");

        file.write_bytes(b"XYZ").await.unwrap();
        file.seek(SeekFrom::Start(0)).await.unwrap();

        let read = match file.read(3).await.unwrap() {
            ReadData::Bytes(b) => b,
            _ => unreachable!(),
        };
        assert_eq!(read, b"XYZ");

        file.close().await.unwrap();
    });
}

#[test]
fn unbounded_read_across_many_small_buffer_refills() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("big.bin");

    let payload: Vec<u8> = (0..10_000u32).map(|n| (n % 251) as u8).collect();
    std::fs::write(&path, &payload).unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open_with_capacity(&path, "rb", 16)
            .await
            .expect("open with a tiny buffer");

        let all = match file.read(-1).await.unwrap() {
            ReadData::Bytes(b) => b,
            _ => unreachable!(),
        };
        assert_eq!(all, payload);

        // Further reads at EOF return zero-length, not an error.
        let again = match file.read(-1).await.unwrap() {
            ReadData::Bytes(b) => b,
            _ => unreachable!(),
        };
        assert!(again.is_empty());

        file.close().await.unwrap();
    });
}

#[test]
fn append_mode_always_lands_at_end_of_file() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("append.bin");
    std::fs::write(&path, b"start-").unwrap();

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "ab").await.expect("open append");
        file.write_bytes(b"end").await.unwrap();
        let tell = file.tell();
        file.close().await.unwrap();
        assert_eq!(tell, 9); // "start-end".len()
    });

    assert_eq!(std::fs::read(&path).unwrap(), b"start-end");
}

#[test]
fn fsync_flushes_buffered_writes_to_disk() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("synced.bin");

    rt.block_on(async {
        let mut file = asyncfiles::open_with_capacity(&path, "wb", 65536)
            .await
            .expect("open");

        // Well under the write-coalescing capacity, so without an explicit
        // fsync (which flushes first) nothing would be on disk yet.
        file.write_bytes(b"durable").await.unwrap();
        file.fsync().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"durable");

        file.close().await.unwrap();
    });
}

#[test]
fn already_closed_file_rejects_further_operations() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("closed.bin");

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "wb").await.expect("open");
        file.close().await.unwrap();

        let err = file.write_bytes(b"late").await.err().unwrap();
        assert!(matches!(err, asyncfiles::Error::AlreadyClosed));
    });
}

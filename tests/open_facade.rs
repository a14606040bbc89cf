//! The scoped-open facade: guaranteed close on every exit path, and the
//! asymmetric close-error policy (surfaced on success, suppressed on
//! failure so the original cause isn't masked) from spec §4.7/§7.

use asyncfiles::{Error, ReadData, RuntimeBuilder};

fn runtime() -> asyncfiles::Runtime {
    RuntimeBuilder::new().enable_fs().build()
}

#[test]
fn with_open_closes_on_the_success_path() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("success.txt");

    rt.block_on(async {
        asyncfiles::with_open(&path, "w", |f| async move { f.write_str("done").await.map(|_| ()) })
            .await
            .expect("with_open should succeed");
    });

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "done");
}

#[test]
fn with_open_still_flushes_and_closes_when_the_body_errors() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("failure.txt");

    rt.block_on(async {
        let result = asyncfiles::with_open::<(), _, _>(&path, "w", |f| async move {
            f.write_str("partial").await?;
            Err(Error::AlreadyClosed) // stand-in for a body-level failure
        })
        .await;

        assert!(matches!(result, Err(Error::AlreadyClosed)));
    });

    // The scope-exit close still ran and flushed the buffered write before
    // the original error was propagated -- the write isn't lost just
    // because the body's own logic failed afterward.
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "partial");
}

#[test]
fn with_open_propagates_open_errors_without_invoking_the_body() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing.txt");

    rt.block_on(async {
        let err = asyncfiles::with_open::<(), _, _>(&path, "r", |_f| async move {
            panic!("body must not run when open() itself fails");
        })
        .await
        .err()
        .expect("expected an error");

        assert!(matches!(err, Error::FileNotFound { .. }));
    });
}

#[test]
fn explicit_open_requires_an_explicit_close() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("manual.txt");

    rt.block_on(async {
        let mut file = asyncfiles::open(&path, "w").await.expect("open");
        file.write_str("manual").await.expect("write");
        file.close().await.expect("close");

        // Close is idempotent.
        file.close().await.expect("second close should be a no-op");
    });

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "manual");
}

#[test]
fn custom_buffer_size_does_not_change_observable_contents() {
    let mut rt = runtime();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tiny-buffer.txt");

    let payload = "x".repeat(10_000);

    rt.block_on(async {
        let mut file = asyncfiles::open_with_capacity(&path, "w", 7)
            .await
            .expect("open with a 7-byte buffer");
        file.write_str(&payload).await.expect("write");
        file.close().await.expect("close");

        let mut reader = asyncfiles::open_with_capacity(&path, "r", 7)
            .await
            .expect("reopen with a 7-byte buffer");
        let data = match reader.read(-1).await.expect("read") {
            ReadData::Text(s) => s,
            _ => unreachable!(),
        };
        assert_eq!(data, payload);
        reader.close().await.expect("close");
    });
}

//! A future dropped mid-await must poison the file object rather than
//! leaving it half-updated (spec §5, §9): the outstanding engine request is
//! left to complete and its result discarded, and every subsequent
//! operation but the scoped close fails with [`Error::Cancelled`].

use asyncfiles::{Error, RuntimeBuilder};
use std::future::Future;
use std::io::SeekFrom;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

fn noop_raw_waker() -> RawWaker {
    fn clone(_: *const ()) -> RawWaker {
        noop_raw_waker()
    }
    fn no_op(_: *const ()) {}

    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
    RawWaker::new(std::ptr::null(), &VTABLE)
}

fn noop_waker() -> Waker {
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

#[test]
fn dropping_a_suspended_operation_poisons_the_file() {
    let mut rt = RuntimeBuilder::new().enable_fs().build();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cancel.bin");

    rt.block_on(async {
        asyncfiles::with_open(&path, "wb", |f| async move {
            f.write_bytes(b"ab").await?;

            // `seek` must flush the non-empty write buffer first, which is
            // a genuine engine round-trip: poll it once (guaranteed Pending,
            // since the completion channel has had no chance to fire yet)
            // and drop it before it resolves, simulating a cancelled caller.
            {
                let mut fut = Box::pin(f.seek(SeekFrom::Start(0)));
                let waker = noop_waker();
                let mut cx = Context::from_waker(&waker);
                let first_poll = fut.as_mut().poll(&mut cx);
                assert!(
                    matches!(first_poll, Poll::Pending),
                    "flushing a buffered write should suspend on its first poll"
                );
            }

            // `tell` never touches the kernel, so it still works poisoned.
            let _ = f.tell();

            let err = f.read(1).await.err().expect("poisoned file should reject reads");
            assert!(matches!(err, Error::Cancelled));

            let err = f.write_bytes(b"more").await.err().expect("poisoned file should reject writes");
            assert!(matches!(err, Error::Cancelled));

            Ok(())
        })
        .await
        .expect("scoped close must still run on a poisoned file");
    });
}

#[test]
fn discarded_completion_does_not_crash_the_engine() {
    // A dropped future's completion still arrives on the channel later
    // (the worker thread runs the syscall to completion regardless); the
    // engine must discard it quietly rather than panic on a missing slot.
    let mut rt = RuntimeBuilder::new().enable_fs().build();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("discard.bin");
    std::fs::write(&path, b"some content").unwrap();

    rt.block_on(async {
        {
            let mut file = asyncfiles::open(&path, "rb").await.expect("open");
            let mut fut = Box::pin(file.read(4));
            let waker = noop_waker();
            let mut cx = Context::from_waker(&waker);
            let _ = fut.as_mut().poll(&mut cx);
            // `fut` and then `file` are dropped here without ever being
            // awaited to completion.
        }

        // The engine (and the runtime driving it) must still be usable
        // afterwards -- a later, unrelated operation should complete fine.
        let mut other = asyncfiles::open(&path, "rb").await.expect("open after discard");
        let data = other.read(4).await.expect("read after a discarded completion");
        assert!(!data.is_empty());
        other.close().await.unwrap();
    });
}

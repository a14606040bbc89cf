//! Directory creation helpers.
//!
//! Rounds out the file-I/O surface alongside [`crate::open`]. Unlike a
//! naive `libc::mkdir` call made directly inside an `async fn` (which would
//! block the loop thread for the syscall's duration), `Directory::create`/
//! `create_all` route through the same [`crate::engine::Engine`] every file
//! operation uses, keeping the loop thread free.

use crate::engine::RequestKind;
use crate::error::Error;
use crate::handle::to_cstring;
use crate::runtime::context::current_engine;

use std::path::{Component, Path, PathBuf};

/// A directory that has been created (or already existed, for
/// [`Directory::create_all`]) on disk.
pub struct Directory {
    path: PathBuf,
}

impl Directory {
    /// Creates a single directory at `path`. Fails with
    /// [`Error::FileExists`] if it already exists, or if any parent
    /// component is missing. For `mkdir -p` semantics use
    /// [`Directory::create_all`].
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        mkdir_one(&path).await?;
        Ok(Self { path })
    }

    /// Recursively creates every missing directory along `path`, like
    /// `mkdir -p`. Existing components are not an error.
    pub async fn create_all(path: impl AsRef<Path>) -> Result<Self, Error> {
        let target = path.as_ref();

        if target.as_os_str().is_empty() {
            return Err(Error::Io {
                errno: libc::EINVAL,
                source: std::io::Error::from_raw_os_error(libc::EINVAL),
            });
        }

        let mut acc = PathBuf::new();
        if target.is_absolute() {
            acc.push(Path::new("/"));
        }

        for component in target.components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(segment) => {
                    acc.push(segment);
                    match mkdir_one(&acc).await {
                        Ok(()) => {}
                        Err(Error::FileExists { .. }) => {}
                        Err(err) => return Err(err),
                    }
                }
                Component::ParentDir => {
                    return Err(Error::Io {
                        errno: libc::EINVAL,
                        source: std::io::Error::from_raw_os_error(libc::EINVAL),
                    });
                }
                Component::Prefix(_) => unreachable!("no path prefixes on POSIX"),
            }
        }

        Ok(Self {
            path: target.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this path currently exists and is a directory. Checked
    /// synchronously via `std::path::Path` — this is metadata already
    /// cached by the OS dentry cache, not worth routing through the engine.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }
}

async fn mkdir_one(path: &Path) -> Result<(), Error> {
    let engine = current_engine();
    let cpath = to_cstring(path)?;

    let request = RequestKind::Mkdir {
        path: cpath,
        mode: 0o777,
    };

    engine.submit(request, Some(path.to_path_buf())).await?;
    Ok(())
}

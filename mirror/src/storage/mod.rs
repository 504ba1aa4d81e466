//! Storage capability consumed by the mirror engine
//!
//! The engine never touches a backing store directly. Everything it needs is
//! expressed through [`Storage`], so the same algorithm runs against the local
//! filesystem ([`LocalStorage`]), an in-memory tree ([`MemoryStorage`]) or any
//! other backend that honours the contracts below.

mod local;
mod memory;

use std::sync::Arc;

use crate::error::Result;
use crate::path::Location;
use crate::signature::Signature;

pub use local::LocalStorage;
pub use memory::{MemoryStorage, OperationCounts};

/// Operations the engine performs against a backing store.
///
/// Implementations are called sequentially and need not be thread-safe.
pub trait Storage {
    /// Create `dir` and any missing parents. Succeeds if it already exists.
    fn create_directory(&self, dir: &Location) -> Result<()>;

    /// All files beneath `dir`, recursively. Empty if `dir` does not exist.
    fn enumerate_files(&self, dir: &Location) -> Result<Vec<Location>>;

    /// All subdirectories beneath `dir`, recursively, excluding `dir` itself.
    /// Empty if `dir` does not exist.
    fn enumerate_directories(&self, dir: &Location) -> Result<Vec<Location>>;

    /// Copy the full content of `source` to `target`, overwriting `target`.
    ///
    /// Fails if `source` is missing or unreadable, or if the parent of
    /// `target` does not exist.
    fn copy_file(&self, source: &Location, target: &Location) -> Result<()>;

    /// Remove a single file. Fails if it does not exist.
    fn delete_file(&self, file: &Location) -> Result<()>;

    /// Remove a directory and everything beneath it. Fails if it does not exist.
    fn delete_directory(&self, dir: &Location) -> Result<()>;

    /// Content signature of `file`. Equal content must yield equal signatures
    /// within one backend.
    fn signature(&self, file: &Location) -> Result<Signature>;
}

macro_rules! forward_storage {
    ($($ty:ty),*) => {
        $(
            impl<S: Storage + ?Sized> Storage for $ty {
                fn create_directory(&self, dir: &Location) -> Result<()> {
                    (**self).create_directory(dir)
                }

                fn enumerate_files(&self, dir: &Location) -> Result<Vec<Location>> {
                    (**self).enumerate_files(dir)
                }

                fn enumerate_directories(&self, dir: &Location) -> Result<Vec<Location>> {
                    (**self).enumerate_directories(dir)
                }

                fn copy_file(&self, source: &Location, target: &Location) -> Result<()> {
                    (**self).copy_file(source, target)
                }

                fn delete_file(&self, file: &Location) -> Result<()> {
                    (**self).delete_file(file)
                }

                fn delete_directory(&self, dir: &Location) -> Result<()> {
                    (**self).delete_directory(dir)
                }

                fn signature(&self, file: &Location) -> Result<Signature> {
                    (**self).signature(file)
                }
            }
        )*
    };
}

forward_storage!(&S, Box<S>, Arc<S>);

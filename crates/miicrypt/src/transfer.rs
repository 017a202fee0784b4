//! Fixed-size file transfer.
//!
//! Every profile file has exactly one valid length for its role, so reads
//! enforce an exact byte count and writes emit the whole blob in one shot.
//! There is no retry and no durability guarantee; a failed pipeline is
//! reported and the next one starts from the files as they are.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use common::profile::{PackedMii, UnpackedMii, PACKED_MII_LEN, UNPACKED_MII_LEN};
use common::MiiError;

/// Read exactly `expected` bytes from the front of `path`.
///
/// Bytes past `expected` are ignored; a file shorter than `expected` is a
/// [`MiiError::SizeMismatch`]. One read pass, no retry.
///
/// # Errors
///
/// [`MiiError::Io`] if the file cannot be opened or read,
/// [`MiiError::Allocation`] if the working buffer cannot be allocated,
/// [`MiiError::SizeMismatch`] if the file is short.
pub fn read_exact_file(path: &Path, expected: usize) -> Result<Vec<u8>, MiiError> {
    let file = File::open(path).map_err(|source| MiiError::Io {
        path: path.to_owned(),
        source,
    })?;

    let mut buf = Vec::new();
    buf.try_reserve_exact(expected)
        .map_err(|_| MiiError::Allocation)?;

    let actual = file
        .take(expected as u64)
        .read_to_end(&mut buf)
        .map_err(|source| MiiError::Io {
            path: path.to_owned(),
            source,
        })?;

    if actual != expected {
        return Err(MiiError::SizeMismatch {
            path: path.to_owned(),
            expected,
            actual,
        });
    }
    Ok(buf)
}

/// Write the whole blob to `path`, creating or truncating the file.
///
/// # Errors
///
/// [`MiiError::Io`] if the file cannot be created or written. No partial
/// write recovery; a failed write leaves whatever made it to disk.
pub fn write_exact_file(path: &Path, blob: &[u8]) -> Result<(), MiiError> {
    let mut file = File::create(path).map_err(|source| MiiError::Io {
        path: path.to_owned(),
        source,
    })?;
    file.write_all(blob).map_err(|source| MiiError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Read a wrapped profile file into its typed form.
pub fn read_packed(path: &Path) -> Result<PackedMii, MiiError> {
    let blob = read_exact_file(path, PACKED_MII_LEN)?;
    PackedMii::from_bytes(&blob).ok_or(MiiError::SizeMismatch {
        path: path.to_owned(),
        expected: PACKED_MII_LEN,
        actual: blob.len(),
    })
}

/// Read an unwrapped profile file into its typed form.
pub fn read_unpacked(path: &Path) -> Result<UnpackedMii, MiiError> {
    let blob = read_exact_file(path, UNPACKED_MII_LEN)?;
    UnpackedMii::from_bytes(&blob).ok_or(MiiError::SizeMismatch {
        path: path.to_owned(),
        expected: UNPACKED_MII_LEN,
        actual: blob.len(),
    })
}

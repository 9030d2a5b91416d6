//! Persistence of training state as a single opaque file.
//!
//! Any serde serializable state can be stored, the encoding is `bincode`. Writes go straight to
//! the destination, a crash mid-write can leave a truncated file behind.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use log::{debug, info};
use serde::{Serialize, de::DeserializeOwned};

/// Writes `state` to `path`, replacing the file if it already exists.
///
/// # Arguments
/// * `state` - The state to persist.
/// * `path` - Where to write it.
///
/// # Errors
/// Returns an I/O error if the file can't be created or written.
pub fn save<T, P>(state: &T, path: P) -> io::Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    bincode::serialize_into(&mut writer, state).map_err(into_io)?;
    writer.flush()?;

    info!("saved checkpoint to {}", path.display());
    Ok(())
}

/// Reads back a state written by `save`.
///
/// # Arguments
/// * `path` - The checkpoint file.
///
/// # Errors
/// Returns an I/O error if the file is missing, or `InvalidData` if its content can't be
/// decoded as a `T`.
pub fn load<T, P>(path: P) -> io::Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let state = bincode::deserialize_from(reader).map_err(into_io)?;

    debug!("loaded checkpoint from {}", path.display());
    Ok(state)
}

fn into_io(e: bincode::Error) -> io::Error {
    match *e {
        bincode::ErrorKind::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

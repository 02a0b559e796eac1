pub mod decode;
pub mod encode;
pub mod info;

use std::{fs::File, io::Write, path::Path};

/// Writes a file through a temporary sibling so a failed write never leaves a
/// partial output behind.
pub fn write_atomically<F>(path: &Path, write: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut File) -> anyhow::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
    write(temp_file.as_file_mut())?;
    temp_file.flush()?;
    temp_file.persist(path)?;

    Ok(())
}

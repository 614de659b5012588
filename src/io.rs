use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;

/// Write-then-rename wrapper for atomic outputs.
pub struct PendingWrite {
    target: PathBuf,
    tmp: NamedTempFile,
}

pub fn open_for_write(target: &Path, force: bool) -> Result<PendingWrite> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    if !force && target.exists() {
        bail!("Refusing to overwrite existing file: {} (use --force)", target.display());
    }
    let dir = target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let tmp = NamedTempFile::new_in(dir).context("create temp file")?;
    Ok(PendingWrite { target: target.to_path_buf(), tmp })
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.tmp.write(buf) }

    fn flush(&mut self) -> std::io::Result<()> { self.tmp.flush() }
}

pub fn finalize_write(pending: PendingWrite) -> Result<()> {
    let PendingWrite { target, tmp } = pending;
    tmp.as_file().sync_all().ok(); // best-effort fsync file
    tmp.persist(&target).with_context(|| format!("rename to {}", target.display()))?;
    if let Some(dir) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        let _ = File::open(dir).and_then(|f| f.sync_all());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let mut pending = open_for_write(&path, false).unwrap();
        pending.write_all(b"{}").unwrap();
        finalize_write(pending).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");

        assert!(open_for_write(&path, false).is_err());
        assert!(open_for_write(&path, true).is_ok());
    }
}

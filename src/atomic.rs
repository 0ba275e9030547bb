// src/atomic.rs

use anyhow::{anyhow, Context, Result};
use std::{fs, fs::File, path::Path};
use tempfile::{Builder, NamedTempFile};

/// Hidden temporary file in `dest`'s directory. Removed on drop unless persisted.
fn temp_beside(dest: &Path) -> Result<NamedTempFile> {
    let name = dest
        .file_name()
        .ok_or_else(|| anyhow!("output path has no file name: {}", dest.display()))?;
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = format!(".{}.", name.to_string_lossy());
    let mut builder = Builder::new();
    builder.prefix(&prefix).suffix(".tmp");
    // tempfile defaults to 0600; outputs are ordinary files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    builder
        .tempfile_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))
}

/// Write `dest` through a temporary sibling: `fill` writes the content, then the
/// file is synced and renamed into place. On any error the temporary file is
/// removed and `dest` is left as it was. Returns the size on disk.
pub fn write_atomic<F>(dest: &Path, fill: F) -> Result<u64>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let mut tmp = temp_beside(dest)?;
    fill(tmp.as_file_mut())?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("syncing {}", tmp.path().display()))?;

    let tmp_display = tmp.path().display().to_string();
    tmp.persist(dest)
        .with_context(|| format!("renaming {} -> {}", tmp_display, dest.display()))?;

    let metadata = fs::metadata(dest)
        .with_context(|| format!("reading metadata of {}", dest.display()))?;
    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn entries(dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    #[test]
    fn writes_and_leaves_only_the_target() -> Result<()> {
        let tmp = tempdir()?;
        let dest = tmp.path().join("out.plt");
        let bytes = write_atomic(&dest, |f| Ok(f.write_all(b"1\ntempo\n")?))?;
        assert_eq!(bytes, 8);
        assert_eq!(fs::read_to_string(&dest)?, "1\ntempo\n");
        assert_eq!(entries(tmp.path())?, vec!["out.plt"]);
        Ok(())
    }

    #[test]
    fn failed_fill_removes_the_temp_file() -> Result<()> {
        let tmp = tempdir()?;
        let dest = tmp.path().join("out.plt");
        let err = write_atomic(&dest, |f| {
            f.write_all(b"partial")?;
            Err(anyhow!("encoder gave up"))
        })
        .unwrap_err();
        assert!(err.to_string().contains("encoder gave up"));
        assert!(entries(tmp.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn failed_rename_removes_the_temp_file() -> Result<()> {
        let tmp = tempdir()?;
        // a non-empty directory in the way makes the final rename fail
        let dest = tmp.path().join("out.plt");
        fs::create_dir(&dest)?;
        fs::write(dest.join("keep"), "x")?;

        assert!(write_atomic(&dest, |f| Ok(f.write_all(b"data")?)).is_err());
        assert_eq!(entries(tmp.path())?, vec!["out.plt"]);
        assert!(dest.join("keep").exists());
        Ok(())
    }
}

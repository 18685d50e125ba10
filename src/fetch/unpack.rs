//! Archive unpacking
//!
//! Entries that would land outside the destination (absolute paths, `..`)
//! are rejected by the underlying readers: `tar::Entry::unpack_in` and
//! `zip::read::ZipFile::enclosed_name`.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{Result, SourcemarkError, fetch};
use crate::link;

/// Unpack `archive` into `dest` and return the source tree root
///
/// When the archive holds a single top-level directory (the usual sdist
/// layout) that directory is the root.
pub fn unpack(archive: &Path, dest: &Path) -> Result<PathBuf> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix =
        link::archive_suffix(&name).ok_or_else(|| fetch::unsupported_archive(archive.display().to_string()))?;

    fs::create_dir_all(dest)?;
    debug!(archive = %archive.display(), dest = %dest.display(), "unpacking");

    let file = File::open(archive).map_err(|e| unpack_failed(archive, &e))?;
    match suffix {
        ".tar.gz" | ".tgz" => unpack_tar(tar::Archive::new(GzDecoder::new(file)), archive, dest)?,
        ".tar" => unpack_tar(tar::Archive::new(file), archive, dest)?,
        ".zip" | ".whl" => unpack_zip(file, archive, dest)?,
        _ => return Err(fetch::unsupported_archive(archive.display().to_string())),
    }

    single_top_level_dir(dest)
}

fn unpack_failed(archive: &Path, reason: &dyn std::fmt::Display) -> SourcemarkError {
    fetch::failed(
        link::path_to_url(archive).unwrap_or_else(|_| archive.display().to_string()),
        format!("failed to unpack: {reason}"),
    )
}

fn unpack_tar<R: io::Read>(mut tar: tar::Archive<R>, archive: &Path, dest: &Path) -> Result<()> {
    let entries = tar.entries().map_err(|e| unpack_failed(archive, &e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| unpack_failed(archive, &e))?;
        let kind = entry.header().entry_type();
        if !(kind.is_file() || kind.is_dir()) {
            // Links and device nodes never belong in a source archive
            continue;
        }
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| unpack_failed(archive, &e))?;
        if !unpacked {
            let path = entry.path().map(|p| p.display().to_string()).unwrap_or_default();
            return Err(unpack_failed(archive, &format!("unsafe entry path {path}")));
        }
    }
    Ok(())
}

fn unpack_zip(file: File, archive: &Path, dest: &Path) -> Result<()> {
    let mut zip = zip::ZipArchive::new(file).map_err(|e| unpack_failed(archive, &e))?;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| unpack_failed(archive, &e))?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(unpack_failed(
                archive,
                &format!("unsafe entry path {}", entry.name()),
            ));
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out).map_err(|e| unpack_failed(archive, &e))?;
    }
    Ok(())
}

fn single_top_level_dir(dest: &Path) -> Result<PathBuf> {
    let mut entries = fs::read_dir(dest)?.collect::<io::Result<Vec<_>>>()?;
    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        if let Some(only) = entries.pop() {
            return Ok(only.path());
        }
    }
    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{create_temp_dir, write_package_tree, write_tar_gz, write_zip};

    #[test]
    fn test_unpack_tar_gz_strips_top_dir() {
        let temp = create_temp_dir();
        let tree = temp.path().join("tree");
        write_package_tree(&tree, "simple", "2.0");
        let archive = write_tar_gz(&tree, &temp.path().join("simple-2.0.tar.gz"), "simple-2.0");

        let root = unpack(&archive, &temp.path().join("out")).unwrap();

        assert_eq!(root, temp.path().join("out/simple-2.0"));
        assert!(root.join("PKG-INFO").exists());
        assert!(root.join("simple.py").exists());
    }

    #[test]
    fn test_unpack_zip() {
        let temp = create_temp_dir();
        let tree = temp.path().join("tree");
        write_package_tree(&tree, "simple", "2.0");
        let archive = write_zip(&tree, &temp.path().join("simple-2.0.zip"), "simple-2.0");

        let root = unpack(&archive, &temp.path().join("out")).unwrap();
        assert!(root.join("PKG-INFO").exists());
    }

    #[test]
    fn test_unpack_flat_archive_keeps_dest_as_root() {
        let temp = create_temp_dir();
        let archive = temp.path().join("simple-2.0-py3-none-any.whl");
        {
            use std::io::Write;
            let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
            let options = zip::write::FileOptions::default();
            zip.start_file("simple/__init__.py", options).unwrap();
            zip.start_file("simple-2.0.dist-info/METADATA", options).unwrap();
            zip.write_all(b"Name: simple\n").unwrap();
            zip.finish().unwrap();
        }

        let out = temp.path().join("out");
        let root = unpack(&archive, &out).unwrap();
        assert_eq!(root, out);
        assert!(root.join("simple/__init__.py").exists());
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let temp = create_temp_dir();
        let archive = temp.path().join("simple-2.0.rar");
        fs::write(&archive, "not an archive").unwrap();

        let err = unpack(&archive, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, SourcemarkError::UnsupportedArchive { .. }));
    }

    #[test]
    fn test_corrupt_archive_is_fetch_failed() {
        let temp = create_temp_dir();
        let archive = temp.path().join("simple-2.0.tar.gz");
        fs::write(&archive, "definitely not gzip").unwrap();

        let err = unpack(&archive, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, SourcemarkError::FetchFailed { .. }));
    }
}

//! Archive extraction (tar.gz, tar, zip) from a forward-only stream.
use std::fs::{self, File};
use std::io::{self, Read, Seek as _, SeekFrom};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::ExtractError;

/// Archive containers understood by [`extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tar (`.tar.gz`, `.tgz`).
    TarGz,
    /// Uncompressed tar (`.tar`).
    Tar,
    /// Zip container (`.zip`).
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from a naming hint's suffix, case-insensitively.
    ///
    /// The content is never sniffed.
    ///
    /// # Examples
    ///
    /// ```
    /// use provision_cli::resources::archive::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::from_name_hint("go.tar.gz"), Some(ArchiveFormat::TarGz));
    /// assert_eq!(ArchiveFormat::from_name_hint("KAFKA.TGZ"), Some(ArchiveFormat::TarGz));
    /// assert_eq!(ArchiveFormat::from_name_hint("appengine.zip"), Some(ArchiveFormat::Zip));
    /// assert_eq!(ArchiveFormat::from_name_hint("go.rar"), None);
    /// ```
    #[must_use]
    pub fn from_name_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_ascii_lowercase();
        if hint.ends_with(".tar.gz") || hint.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if hint.ends_with(".tar") {
            Some(Self::Tar)
        } else if hint.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// What an extraction produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractSummary {
    /// Number of entries written (files, directories and links).
    pub entries: usize,
}

/// Unpack `stream` into `dest`, choosing the container format from
/// `name_hint`.
///
/// `dest` is created if needed, but only after the format has been resolved:
/// an unsupported hint leaves the filesystem untouched. On failure `dest` may
/// be partially written; callers extract into disposable scratch space.
///
/// # Errors
///
/// Returns [`ExtractError::UnsupportedFormat`] for an unknown suffix,
/// [`ExtractError::PathTraversal`] for an entry that would land outside
/// `dest`, [`ExtractError::InvalidArchive`] for a corrupt container and
/// [`ExtractError::Io`] for read or write failures.
pub fn extract(
    stream: impl Read,
    name_hint: &str,
    dest: &Path,
) -> Result<ExtractSummary, ExtractError> {
    let format =
        ArchiveFormat::from_name_hint(name_hint).ok_or_else(|| ExtractError::UnsupportedFormat {
            hint: name_hint.to_string(),
        })?;

    fs::create_dir_all(dest).map_err(io_error(format!("create {}", dest.display())))?;
    let root = dest
        .canonicalize()
        .map_err(io_error(format!("resolve {}", dest.display())))?;

    let summary = match format {
        ArchiveFormat::TarGz => extract_tar(GzDecoder::new(stream), &root)?,
        ArchiveFormat::Tar => extract_tar(stream, &root)?,
        ArchiveFormat::Zip => extract_zip(stream, &root)?,
    };
    tracing::debug!(
        "extracted {} entries ({format:?}) into {}",
        summary.entries,
        dest.display()
    );
    Ok(summary)
}

fn extract_tar(reader: impl Read, root: &Path) -> Result<ExtractSummary, ExtractError> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    let mut summary = ExtractSummary::default();
    let mut deferred_dirs = Vec::new();

    for entry in archive.entries().map_err(read_error)? {
        let mut entry = entry.map_err(read_error)?;
        let raw = entry.path().map_err(read_error)?.into_owned();
        let Some(relative) = sanitize(&raw.to_string_lossy())? else {
            continue;
        };
        let target = root.join(&relative);

        if entry.header().entry_type().is_dir() {
            ensure_confined(root, &target, &relative)?;
            fs::create_dir_all(&target)
                .map_err(io_error(format!("create {}", relative.display())))?;
            ensure_resolves_within(root, &target, &relative)?;
            if let Ok(mode) = entry.header().mode() {
                deferred_dirs.push((target, mode));
            }
        } else {
            // unpack_in creates missing parents and re-checks confinement
            // after resolving symlinks.
            let unpacked = entry
                .unpack_in(root)
                .map_err(io_error(format!("unpack {}", relative.display())))?;
            if !unpacked {
                return Err(ExtractError::PathTraversal {
                    entry: raw.to_string_lossy().into_owned(),
                });
            }
        }
        summary.entries += 1;
    }

    apply_dir_modes(root, deferred_dirs)?;
    Ok(summary)
}

fn extract_zip(mut stream: impl Read, root: &Path) -> Result<ExtractSummary, ExtractError> {
    // The central directory sits at the end of the container.
    let mut spool = tempfile::tempfile().map_err(io_error("create zip spool file"))?;
    io::copy(&mut stream, &mut spool).map_err(io_error("spool zip stream"))?;
    spool
        .seek(SeekFrom::Start(0))
        .map_err(io_error("rewind zip spool file"))?;

    let mut archive = zip::ZipArchive::new(spool).map_err(invalid_zip)?;
    let mut summary = ExtractSummary::default();
    let mut deferred_dirs = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(invalid_zip)?;
        let Some(relative) = sanitize(file.name())? else {
            continue;
        };
        let target = root.join(&relative);
        ensure_confined(root, &target, &relative)?;
        let mode = file.unix_mode();

        if file.is_dir() {
            fs::create_dir_all(&target)
                .map_err(io_error(format!("create {}", relative.display())))?;
            ensure_resolves_within(root, &target, &relative)?;
            if let Some(mode) = mode {
                deferred_dirs.push((target, mode));
            }
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(io_error(format!("create parent of {}", relative.display())))?;
                ensure_confined(root, &target, &relative)?;
            }
            clear_slot(&target, &relative)?;
            if mode.is_some_and(is_symlink_mode) {
                write_zip_symlink(&mut file, &target, &relative)?;
            } else {
                write_zip_file(&mut file, &target, &relative, mode)?;
            }
        }
        summary.entries += 1;
    }

    apply_dir_modes(root, deferred_dirs)?;
    Ok(summary)
}

fn write_zip_file(
    file: &mut impl Read,
    target: &Path,
    relative: &Path,
    mode: Option<u32>,
) -> Result<(), ExtractError> {
    let mut out = File::options()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(io_error(format!("create {}", relative.display())))?;
    io::copy(file, &mut out).map_err(io_error(format!("write {}", relative.display())))?;
    if let Some(mode) = mode {
        set_mode(target, mode & 0o7777)
            .map_err(io_error(format!("chmod {}", relative.display())))?;
    }
    Ok(())
}

#[cfg(unix)]
fn write_zip_symlink(
    file: &mut impl Read,
    target: &Path,
    relative: &Path,
) -> Result<(), ExtractError> {
    let mut link_target = String::new();
    file.read_to_string(&mut link_target)
        .map_err(io_error(format!("read link {}", relative.display())))?;
    std::os::unix::fs::symlink(&link_target, target)
        .map_err(io_error(format!("symlink {}", relative.display())))
}

#[cfg(not(unix))]
fn write_zip_symlink(
    file: &mut impl Read,
    target: &Path,
    relative: &Path,
) -> Result<(), ExtractError> {
    write_zip_file(file, target, relative, None)
}

/// Unlink whatever non-directory sits at `target` so the next write creates
/// a fresh entry instead of following an earlier symlink.
fn clear_slot(target: &Path, relative: &Path) -> Result<(), ExtractError> {
    match fs::symlink_metadata(target) {
        Ok(meta) if !meta.is_dir() => {
            fs::remove_file(target).map_err(io_error(format!("replace {}", relative.display())))
        }
        Ok(_) => Err(ExtractError::Io {
            context: format!("create {}", relative.display()),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "a directory is in the way"),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ExtractError::Io {
            context: format!("inspect {}", relative.display()),
            source: e,
        }),
    }
}

const fn is_symlink_mode(mode: u32) -> bool {
    mode & 0o170_000 == 0o120_000
}

/// Turn an archive entry name into a relative path below the destination.
///
/// Leading and embedded `.` segments are dropped; `..`, absolute paths and
/// drive prefixes are rejected. Returns `None` for names that reduce to the
/// destination itself (such as `./`).
fn sanitize(name: &str) -> Result<Option<PathBuf>, ExtractError> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::PathTraversal {
                    entry: name.to_string(),
                });
            }
        }
    }
    Ok((!relative.as_os_str().is_empty()).then_some(relative))
}

/// Reject `target` if its deepest existing ancestor resolves outside `root`.
///
/// Catches entries routed through a symlink unpacked earlier in the same
/// archive.
fn ensure_confined(root: &Path, target: &Path, relative: &Path) -> Result<(), ExtractError> {
    let Some(existing) = target.ancestors().skip(1).find(|p| p.exists()) else {
        return Ok(());
    };
    let resolved = existing
        .canonicalize()
        .map_err(io_error(format!("resolve {}", existing.display())))?;
    if resolved.starts_with(root) {
        Ok(())
    } else {
        Err(ExtractError::PathTraversal {
            entry: relative.to_string_lossy().into_owned(),
        })
    }
}

/// Reject `target` itself if it resolves outside `root`, as happens when a
/// directory entry names an earlier symlink.
fn ensure_resolves_within(
    root: &Path,
    target: &Path,
    relative: &Path,
) -> Result<(), ExtractError> {
    let resolved = target
        .canonicalize()
        .map_err(io_error(format!("resolve {}", relative.display())))?;
    if resolved.starts_with(root) {
        Ok(())
    } else {
        Err(ExtractError::PathTraversal {
            entry: relative.to_string_lossy().into_owned(),
        })
    }
}

/// Apply directory permissions once their contents are in place, deepest
/// first.
///
/// Each directory must still resolve inside `root` when its mode is set.
fn apply_dir_modes(root: &Path, dirs: Vec<(PathBuf, u32)>) -> Result<(), ExtractError> {
    for (dir, mode) in dirs.into_iter().rev() {
        let relative = dir.strip_prefix(root).unwrap_or(dir.as_path()).to_path_buf();
        ensure_resolves_within(root, &dir, &relative)?;
        set_mode(&dir, mode & 0o7777).map_err(io_error(format!("chmod {}", dir.display())))?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt as _;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

fn io_error(context: impl Into<String>) -> impl FnOnce(io::Error) -> ExtractError {
    let context = context.into();
    move |source| ExtractError::Io { context, source }
}

/// Classify an error raised while decoding the container.
fn read_error(e: io::Error) -> ExtractError {
    match e.kind() {
        io::ErrorKind::InvalidData
        | io::ErrorKind::InvalidInput
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::Other => ExtractError::InvalidArchive {
            reason: e.to_string(),
        },
        _ => ExtractError::Io {
            context: "read archive".to_string(),
            source: e,
        },
    }
}

fn invalid_zip(e: zip::result::ZipError) -> ExtractError {
    match e {
        zip::result::ZipError::Io(source) => ExtractError::Io {
            context: "read zip archive".to_string(),
            source,
        },
        other => ExtractError::InvalidArchive {
            reason: other.to_string(),
        },
    }
}

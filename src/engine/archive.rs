//! Tar construction for image build contexts.
//!
//! Each listed file or directory lands at the root of the archive under its
//! own name. A source without a final name (`.`, `..`, `/`) contributes its
//! contents instead. Directories are walked in sorted order so identical
//! inputs produce identical archives.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Metadata;
use cap_std::fs_utf8::Dir;
use tar::{Builder, EntryType, Header};

use crate::error::EngineError;

const DEFAULT_DIRECTORY_MODE: u32 = 0o755;
const DEFAULT_FILE_MODE: u32 = 0o644;
const SYMLINK_MODE: u32 = 0o777;

/// Pack `sources` into an in-memory tar archive.
///
/// Symbolic links inside a directory are stored as links with their target
/// unchanged. A source that is itself a link is followed.
///
/// # Errors
///
/// Returns `EngineError::InvalidArgument` if a source cannot be read.
pub fn build_context_archive(sources: &[Utf8PathBuf]) -> Result<Vec<u8>, EngineError> {
    let mut builder = Builder::new(vec![]);
    for source in sources {
        append_source(&mut builder, source).map_err(|e| {
            EngineError::invalid_argument("build image", format!("cannot archive {source}: {e}"))
        })?;
    }
    builder
        .finish()
        .and_then(|()| builder.into_inner())
        .map_err(|e| EngineError::invalid_argument("build image", e.to_string()))
}

fn append_source(builder: &mut Builder<Vec<u8>>, source: &Utf8Path) -> io::Result<()> {
    let parent = source
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let Some(name) = source.file_name() else {
        let dir = Dir::open_ambient_dir(source, ambient_authority())?;
        return append_directory_contents(builder, &dir, Utf8Path::new(""));
    };
    let parent_dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    let metadata = parent_dir.metadata(name)?;
    let archive_path = Utf8PathBuf::from(name);

    if metadata.is_dir() {
        append_directory_header(builder, &archive_path, &metadata)?;
        let dir = parent_dir.open_dir(name)?;
        append_directory_contents(builder, &dir, &archive_path)
    } else {
        append_file(builder, &parent_dir, name, &archive_path)
    }
}

fn append_directory_contents(
    builder: &mut Builder<Vec<u8>>,
    current_dir: &Dir,
    current_path: &Utf8Path,
) -> io::Result<()> {
    for entry in sorted_entries(current_dir)? {
        let entry_path = current_path.join(&entry.file_name);
        match entry.kind {
            EntryKind::Directory => {
                let metadata = current_dir.metadata(&entry.file_name)?;
                append_directory_header(builder, &entry_path, &metadata)?;
                let child = current_dir.open_dir(&entry.file_name)?;
                append_directory_contents(builder, &child, &entry_path)?;
            }
            EntryKind::File => append_file(builder, current_dir, &entry.file_name, &entry_path)?,
            EntryKind::Symlink => {
                let target = current_dir.read_link_contents(&entry.file_name)?;
                append_symlink(builder, &entry_path, &target)?;
            }
            EntryKind::Other => {
                tracing::debug!(path = %entry_path, "skipping special file in build context");
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
    Symlink,
    Other,
}

struct Entry {
    file_name: String,
    kind: EntryKind,
}

fn sorted_entries(directory: &Dir) -> io::Result<Vec<Entry>> {
    let mut entries = vec![];
    for entry_result in directory.entries()? {
        let entry = entry_result?;
        let file_type = entry.file_type()?;
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        };
        entries.push(Entry {
            file_name: entry.file_name()?,
            kind,
        });
    }
    entries.sort_unstable_by(|left, right| left.file_name.cmp(&right.file_name));
    Ok(entries)
}

fn append_directory_header(
    builder: &mut Builder<Vec<u8>>,
    path: &Utf8Path,
    metadata: &Metadata,
) -> io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Directory);
    header.set_size(0);
    header.set_mode(metadata_mode(metadata, DEFAULT_DIRECTORY_MODE));
    header.set_cksum();
    builder.append_data(&mut header, format!("{}/", archive_name(path)), io::empty())
}

fn append_file(
    builder: &mut Builder<Vec<u8>>,
    parent_dir: &Dir,
    file_name: &str,
    path: &Utf8Path,
) -> io::Result<()> {
    let metadata = parent_dir.metadata(file_name)?;
    let mut file = parent_dir.open(file_name)?;

    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(metadata.len());
    header.set_mode(metadata_mode(&metadata, DEFAULT_FILE_MODE));
    header.set_cksum();
    builder.append_data(&mut header, archive_name(path), &mut file)
}

fn append_symlink(
    builder: &mut Builder<Vec<u8>>,
    path: &Utf8Path,
    target: &Utf8Path,
) -> io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Symlink);
    header.set_size(0);
    header.set_mode(SYMLINK_MODE);
    builder.append_link(&mut header, archive_name(path), target.as_std_path())
}

fn archive_name(path: &Utf8Path) -> String {
    path.as_str().replace('\\', "/")
}

#[cfg(unix)]
fn metadata_mode(metadata: &Metadata, _fallback: u32) -> u32 {
    use cap_std::fs::PermissionsExt;

    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn metadata_mode(_metadata: &Metadata, fallback: u32) -> u32 {
    fallback
}

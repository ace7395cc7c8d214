//! Selective extraction from gzipped tar archives.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::{flog_debug, flog_trace, Error, Result};

fn open(archive: &Path) -> Result<Archive<GzDecoder<File>>> {
    Ok(Archive::new(GzDecoder::new(File::open(archive)?)))
}

/// Member name as stored, without leading `./` components.
fn member_name(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect::<PathBuf>()
        .to_string_lossy()
        .into_owned()
}

fn ensure_relative(path: &Path) -> Result<()> {
    let unsafe_component = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if unsafe_component || path.as_os_str().is_empty() {
        return Err(Error::UnsafeArchivePath(path.display().to_string()));
    }
    Ok(())
}

fn scan(archive: &Path) -> Result<HashMap<String, EntryType>> {
    let mut reader = open(archive)?;
    let mut kinds = HashMap::new();
    for entry in reader.entries()? {
        let entry = entry?;
        kinds.insert(member_name(&entry.path()?), entry.header().entry_type());
    }
    Ok(kinds)
}

/// Names of all entries in the archive.
pub fn list_members(archive: &Path) -> Result<HashSet<String>> {
    Ok(scan(archive)?.into_keys().collect())
}

fn ensure_regular(name: &str, kind: EntryType) -> Result<()> {
    if kind.is_file() {
        Ok(())
    } else {
        Err(Error::UnsafeArchivePath(format!(
            "{} is not a regular file ({:?})",
            name, kind
        )))
    }
}

/// Extract `members` from `archive` into `dest_dir`.
///
/// Every member is resolved before anything is written: if one is absent the
/// call fails with [`Error::MissingArchiveMember`] and `dest_dir` is left
/// untouched. Links, directories and other non-regular members are rejected
/// the same way with [`Error::UnsafeArchivePath`]. `rename` maps each member path to its path under `dest_dir`.
/// Returns the written paths in archive order.
pub fn extract_members<F>(
    archive: &Path,
    dest_dir: &Path,
    members: &[&str],
    rename: F,
) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> PathBuf,
{
    for member in members {
        ensure_relative(Path::new(member))?;
        ensure_relative(&rename(Path::new(member)))?;
    }

    let present = scan(archive)?;
    for member in members {
        match present.get(*member) {
            Some(kind) => ensure_regular(member, *kind)?,
            None => {
                return Err(Error::MissingArchiveMember {
                    archive: archive.to_path_buf(),
                    member: member.to_string(),
                })
            }
        }
    }

    let wanted: HashSet<&str> = members.iter().copied().collect();
    let mut written = Vec::new();
    let mut reader = open(archive)?;
    for entry in reader.entries()? {
        let mut entry = entry?;
        let name = member_name(&entry.path()?);
        if !wanted.contains(name.as_str()) {
            continue;
        }
        ensure_regular(&name, entry.header().entry_type())?;

        let target = dest_dir.join(rename(Path::new(&name)));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        flog_trace!("extract {} -> {}", name, target.display());
        entry.unpack(&target)?;
        if !written.contains(&target) {
            written.push(target);
        }
    }

    flog_debug!(
        "Extracted {} member(s) from {} into {}",
        written.len(),
        archive.display(),
        dest_dir.display()
    );
    Ok(written)
}

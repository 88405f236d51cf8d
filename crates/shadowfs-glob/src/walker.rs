//! Depth-first glob expansion over a path-based filesystem.

use crate::error::{GlobError, WalkerError};
use crate::flags::GlobFlags;
use crate::pattern::{SegmentMatcher, compile};

/// Minimal read-only view of a filesystem needed to expand a pattern.
///
/// Paths handed to the walker are absolute and slash-separated.
pub trait WalkerFs {
    /// Names of the entries directly inside `path` (no `.` / `..`).
    fn list_dir(&self, path: &str) -> Result<Vec<String>, WalkerError>;

    /// Returns true if `path` is a directory (following links).
    fn is_dir(&self, path: &str) -> bool;
}

/// Expand `pattern` against `fs`.
///
/// Relative patterns are anchored at `cwd` for the walk and the results
/// are made relative again before returning.
#[tracing::instrument(level = "debug", skip(fs, flags), fields(flags = flags.bits()))]
pub fn glob<F>(fs: &F, cwd: &str, pattern: &str, flags: GlobFlags) -> Result<Vec<String>, GlobError>
where
    F: WalkerFs + ?Sized,
{
    let relative = !pattern.starts_with('/');
    let base = cwd.trim_end_matches('/');
    let absolute = if relative {
        format!("{base}/{pattern}")
    } else {
        pattern.to_string()
    };

    let matchers = compile(&absolute, flags)?;
    let mut matches = Vec::new();
    walk(fs, "", &matchers, flags, &mut matches)?;

    if !flags.contains(GlobFlags::NOSORT) {
        matches.sort();
    }
    if flags.contains(GlobFlags::ONLYDIR) {
        matches.retain(|path| fs.is_dir(path));
    }
    if flags.contains(GlobFlags::MARK) {
        for path in matches.iter_mut() {
            if fs.is_dir(path) {
                path.push('/');
            }
        }
    }
    if matches.is_empty() && flags.contains(GlobFlags::NOCHECK) {
        matches.push(absolute);
    }
    if relative {
        let prefix = format!("{base}/");
        for path in matches.iter_mut() {
            if let Some(stripped) = path.strip_prefix(&prefix) {
                *path = stripped.to_string();
            }
        }
    }

    tracing::debug!(count = matches.len(), "glob expanded");
    Ok(matches)
}

/// `dir` is `""` for the root so that children join as `/name`.
fn walk<F>(
    fs: &F,
    dir: &str,
    matchers: &[SegmentMatcher],
    flags: GlobFlags,
    out: &mut Vec<String>,
) -> Result<(), GlobError>
where
    F: WalkerFs + ?Sized,
{
    let Some((current, rest)) = matchers.split_first() else {
        return Ok(());
    };

    let listing = if dir.is_empty() { "/" } else { dir };
    let names = match fs.list_dir(listing) {
        Ok(names) => names,
        Err(WalkerError::PermissionDenied(path)) if flags.contains(GlobFlags::ERR) => {
            return Err(GlobError::Unreadable { path });
        }
        Err(e) => {
            tracing::trace!(dir = listing, error = %e, "skipping unlistable directory");
            Vec::new()
        }
    };

    for name in names {
        if !current.is_match(&name) {
            continue;
        }
        let child = format!("{dir}/{name}");
        if rest.is_empty() {
            out.push(child);
        } else {
            walk(fs, &child, rest, flags, out)?;
        }
    }
    Ok(())
}

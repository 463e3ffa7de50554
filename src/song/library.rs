use super::SongError;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};

pub const SONG_SUFFIX: &str = "mid";

/// Files directly inside `dir` whose extension matches `suffix`
/// (case-insensitive), sorted by path.
pub fn list_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, SongError> {
    if !dir.is_dir() {
        return Err(SongError::DirectoryNotFound(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|source| SongError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(suffix))
        })
        .collect();
    files.sort();

    Ok(files)
}

/// Calls `on_change` whenever something inside `dir` is created, removed or
/// renamed. The returned watcher must be kept alive.
pub fn watch_dir<F>(dir: &Path, on_change: F) -> notify::Result<RecommendedWatcher>
where
    F: Fn() + Send + 'static,
{
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if event.kind.is_create() || event.kind.is_remove() || event.kind.is_modify() {
                    on_change();
                }
            }
            Err(e) => tracing::warn!("song directory watch error: {}", e),
        },
        Config::default(),
    )?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("watching {}", dir.display());

    Ok(watcher)
}

//! Config-driven asset source: files on disk plus command output

use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};

use crate::codec::AssetRecords;
use crate::config::{FilterMode, PublisherConfig};
use crate::error::{Result, ShmCastError};

use super::DataSource;

/// Loads configured paths and commands into publishable records
///
/// Files load first, keyed by their path; commands run afterwards, keyed
/// by their configured name, and only when execution is enabled. A file
/// appearing under several configured roots simply produces duplicate
/// records; the decoder's last-write-wins rule makes that harmless.
#[derive(Debug, Clone)]
pub struct AssetSource {
    paths: Vec<PathBuf>,
    commands: Vec<(String, String)>,
    filter: FilterMode,
    file_types: Vec<String>,
    exec_enabled: bool,
    ignore_missing: bool,
}

impl AssetSource {
    /// Empty source; populate through the builder methods
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            commands: Vec::new(),
            filter: FilterMode::None,
            file_types: Vec::new(),
            exec_enabled: false,
            ignore_missing: false,
        }
    }

    /// Source configured from a loaded publisher config
    pub fn from_config(config: &PublisherConfig) -> Self {
        Self {
            paths: config.data.paths.clone(),
            commands: config
                .data
                .commands
                .iter()
                .map(|(name, command)| (name.clone(), command.clone()))
                .collect(),
            filter: config.settings.filter,
            file_types: config.settings.file_types.clone(),
            exec_enabled: config.settings.exec_enabled,
            ignore_missing: config.settings.ignore_missing,
        }
    }

    /// Add filesystem roots to walk
    pub fn with_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.paths.extend(paths);
        self
    }

    /// Add named shell commands whose stdout becomes a record
    pub fn with_commands(
        mut self,
        commands: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.commands.extend(commands);
        self
    }

    /// Set the extension filter applied to walked files
    pub fn with_filter(mut self, filter: FilterMode, file_types: Vec<String>) -> Self {
        self.filter = filter;
        self.file_types = file_types;
        self
    }

    /// Enable or disable command execution
    pub fn with_exec_enabled(mut self, exec_enabled: bool) -> Self {
        self.exec_enabled = exec_enabled;
        self
    }

    /// Skip unreadable files instead of failing the whole load
    pub fn with_ignore_missing(mut self, ignore_missing: bool) -> Self {
        self.ignore_missing = ignore_missing;
        self
    }

    fn filter_allows(&self, path: &Path) -> bool {
        if self.filter == FilterMode::None {
            return true;
        }
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let listed = self
            .file_types
            .iter()
            .any(|t| t.trim_start_matches('.').eq_ignore_ascii_case(extension));
        match self.filter {
            FilterMode::Whitelist => listed,
            FilterMode::Blacklist => !listed,
            FilterMode::None => true,
        }
    }

    fn load_files(&self, records: &mut AssetRecords) -> Result<()> {
        for root in &self.paths {
            for file in walk(root, self.ignore_missing)? {
                if !self.filter_allows(&file) {
                    debug!("filtered out {}", file.display());
                    continue;
                }
                match fs::read(&file) {
                    Ok(bytes) => {
                        debug!("loaded {} ({} bytes)", file.display(), bytes.len());
                        records.push((file.as_os_str().as_bytes().to_vec(), bytes));
                    }
                    Err(e) if self.ignore_missing => {
                        warn!("skipping unreadable file {}: {}", file.display(), e);
                    }
                    Err(e) => {
                        return Err(ShmCastError::data_source(
                            format!("failed to read {}", file.display()),
                            Some(e),
                        ))
                    }
                }
            }
        }
        Ok(())
    }

    fn load_commands(&self, records: &mut AssetRecords) -> Result<()> {
        if !self.exec_enabled {
            if !self.commands.is_empty() {
                debug!(
                    "command execution disabled, skipping {} configured commands",
                    self.commands.len()
                );
            }
            return Ok(());
        }
        for (name, command) in &self.commands {
            let output = Command::new("/bin/sh")
                .arg("-c")
                .arg(command)
                .output()
                .map_err(|e| {
                    ShmCastError::data_source(format!("failed to spawn command '{}'", name), Some(e))
                })?;
            if !output.status.success() {
                return Err(ShmCastError::data_source(
                    format!("command '{}' exited with {}", name, output.status),
                    None,
                ));
            }
            debug!("command '{}' produced {} bytes", name, output.stdout.len());
            records.push((name.clone().into_bytes(), output.stdout));
        }
        Ok(())
    }
}

impl Default for AssetSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSource for AssetSource {
    fn load(&mut self) -> Result<AssetRecords> {
        let mut records = AssetRecords::new();
        self.load_files(&mut records)?;
        self.load_commands(&mut records)?;
        Ok(records)
    }
}

/// Collect every regular file under `root`, sorted for a deterministic
/// record order across hosts
fn walk(root: &Path, ignore_missing: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(target) = pending.pop() {
        let meta = match fs::metadata(&target) {
            Ok(meta) => meta,
            Err(e) if ignore_missing => {
                warn!("skipping missing path {}: {}", target.display(), e);
                continue;
            }
            Err(e) => {
                return Err(ShmCastError::data_source(
                    format!("cannot stat {}", target.display()),
                    Some(e),
                ))
            }
        };
        if meta.is_dir() {
            let entries = fs::read_dir(&target).map_err(|e| {
                ShmCastError::data_source(format!("cannot list {}", target.display()), Some(e))
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| {
                    ShmCastError::data_source(
                        format!("cannot list {}", target.display()),
                        Some(e),
                    )
                })?;
                pending.push(entry.path());
            }
        } else {
            files.push(target);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dir_with(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            let mut file = fs::File::create(path).unwrap();
            file.write_all(content.as_bytes()).unwrap();
        }
        dir
    }

    #[test]
    fn test_loads_files_keyed_by_path() {
        let dir = dir_with(&[("a.txt", "alpha"), ("b.txt", "beta")]);
        let mut source = AssetSource::new().with_paths([dir.path().to_path_buf()]);
        let records = source.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1, b"alpha");
        assert_eq!(records[1].1, b"beta");
        assert!(records[0].0.ends_with(b"a.txt"));
    }

    #[test]
    fn test_whitelist_keeps_only_listed_extensions() {
        let dir = dir_with(&[("a.txt", "alpha"), ("b.bin", "beta")]);
        let mut source = AssetSource::new()
            .with_paths([dir.path().to_path_buf()])
            .with_filter(FilterMode::Whitelist, vec!["txt".to_string()]);
        let records = source.load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].0.ends_with(b"a.txt"));
    }

    #[test]
    fn test_blacklist_drops_listed_extensions() {
        let dir = dir_with(&[("a.txt", "alpha"), ("b.bin", "beta")]);
        let mut source = AssetSource::new()
            .with_paths([dir.path().to_path_buf()])
            .with_filter(FilterMode::Blacklist, vec![".bin".to_string()]);
        let records = source.load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].0.ends_with(b"a.txt"));
    }

    #[test]
    fn test_missing_path_fails_unless_ignored() {
        let mut strict = AssetSource::new().with_paths([PathBuf::from("/nonexistent/assets")]);
        assert!(matches!(
            strict.load().unwrap_err(),
            ShmCastError::DataSource { .. }
        ));

        let mut lenient = AssetSource::new()
            .with_paths([PathBuf::from("/nonexistent/assets")])
            .with_ignore_missing(true);
        assert!(lenient.load().unwrap().is_empty());
    }

    #[test]
    fn test_commands_only_run_when_enabled() {
        let mut disabled = AssetSource::new()
            .with_commands([("greeting".to_string(), "echo hello".to_string())]);
        assert!(disabled.load().unwrap().is_empty());

        let mut enabled = AssetSource::new()
            .with_commands([("greeting".to_string(), "printf hello".to_string())])
            .with_exec_enabled(true);
        let records = enabled.load().unwrap();
        assert_eq!(records, vec![(b"greeting".to_vec(), b"hello".to_vec())]);
    }

    #[test]
    fn test_failing_command_is_a_data_source_error() {
        let mut source = AssetSource::new()
            .with_commands([("boom".to_string(), "exit 3".to_string())])
            .with_exec_enabled(true);
        assert!(matches!(
            source.load().unwrap_err(),
            ShmCastError::DataSource { .. }
        ));
    }
}

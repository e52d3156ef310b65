use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;

/// Global data-directory key shared by every dataset.
pub const DATA_KEY: &str = "MNE_DATA";

/// Dataset-specific root key, e.g. `MNE_DATASETS_BEETLSLEEP_PATH`.
pub fn dataset_key(code: &str) -> String {
    format!("MNE_DATASETS_{}_PATH", code.to_uppercase())
}

/// Name of the per-dataset cache directory under the root.
pub fn dataset_dir_name(code: &str) -> String {
    format!("MNE-{}-data", code.to_lowercase())
}

// ---------------------------------------------------------------------------
// ConfigFile – flat JSON key/value store
// ---------------------------------------------------------------------------

/// JSON settings file holding string keys and values.
///
/// ```json
/// { "MNE_DATA": "/data/mne", "MNE_DATASETS_BEETLSLEEP_PATH": "/data/beetl" }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl ConfigFile {
    /// `~/.mne/mne-python.json`, or `None` when no home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".mne").join("mne-python.json"))
    }

    /// Read the file at `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Write the store back to disk, creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config – resolved dataset root
// ---------------------------------------------------------------------------

/// Where a dataset's cache directory lives. Owned by the dataset handle and
/// passed explicitly; nothing here touches process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
}

impl Config {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the root for `code` from the environment and the default
    /// config file.
    pub fn resolve(code: &str) -> Result<Self> {
        let file = match ConfigFile::default_path() {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        Ok(Self::resolve_with(code, &file, |key| std::env::var(key).ok()))
    }

    /// Resolution order: dataset key (env, then file), `MNE_DATA` (env, then
    /// file), then `~/mne_data`.
    pub fn resolve_with(
        code: &str,
        file: &ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let key = dataset_key(code);
        let lookup = |k: &str| {
            env(k)
                .filter(|v| !v.is_empty())
                .or_else(|| file.get(k).filter(|v| !v.is_empty()).map(str::to_owned))
        };

        let root = match lookup(&key).or_else(|| lookup(DATA_KEY)) {
            Some(value) => PathBuf::from(value),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mne_data"),
        };
        debug!("{key} resolved to {}", root.display());
        Self { root }
    }

    /// `<root>/MNE-<code>-data`.
    pub fn dataset_dir(&self, code: &str) -> PathBuf {
        self.root.join(dataset_dir_name(code))
    }

    /// Record this root as both the global data directory and the dataset
    /// path in `file`, then save it.
    pub fn persist(&self, code: &str, file: &mut ConfigFile) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let root = self.root.to_string_lossy().into_owned();
        file.set(DATA_KEY, root.clone());
        file.set(dataset_key(code), root);
        file.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_key_and_dir_names() {
        assert_eq!(dataset_key("beetlsleep"), "MNE_DATASETS_BEETLSLEEP_PATH");
        assert_eq!(dataset_dir_name("BeetlSleep"), "MNE-beetlsleep-data");
        let cfg = Config::new("/tmp/root");
        assert_eq!(
            cfg.dataset_dir("beetlsleep"),
            PathBuf::from("/tmp/root/MNE-beetlsleep-data")
        );
    }

    #[test]
    fn test_env_dataset_key_wins() {
        let mut file = ConfigFile::default();
        file.set("MNE_DATASETS_BEETLSLEEP_PATH", "/from/file");
        file.set(DATA_KEY, "/data/file");
        let env = |k: &str| match k {
            "MNE_DATASETS_BEETLSLEEP_PATH" => Some("/from/env".to_string()),
            "MNE_DATA" => Some("/data/env".to_string()),
            _ => None,
        };
        let cfg = Config::resolve_with("beetlsleep", &file, env);
        assert_eq!(cfg.root, PathBuf::from("/from/env"));
    }

    #[test]
    fn test_file_dataset_key_beats_global() {
        let mut file = ConfigFile::default();
        file.set("MNE_DATASETS_BEETLSLEEP_PATH", "/from/file");
        let env = |k: &str| (k == DATA_KEY).then(|| "/data/env".to_string());
        let cfg = Config::resolve_with("beetlsleep", &file, env);
        assert_eq!(cfg.root, PathBuf::from("/from/file"));
    }

    #[test]
    fn test_global_fallbacks() {
        let mut file = ConfigFile::default();
        file.set(DATA_KEY, "/data/file");
        let cfg = Config::resolve_with("beetlsleep", &file, no_env);
        assert_eq!(cfg.root, PathBuf::from("/data/file"));

        let cfg = Config::resolve_with("beetlsleep", &ConfigFile::default(), no_env);
        assert!(cfg.root.ends_with("mne_data"));
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let mut file = ConfigFile::default();
        file.set(DATA_KEY, "/data/file");
        let env = |_: &str| Some(String::new());
        let cfg = Config::resolve_with("beetlsleep", &file, env);
        assert_eq!(cfg.root, PathBuf::from("/data/file"));
    }

    #[test]
    fn test_empty_file_value_is_ignored() {
        let mut file = ConfigFile::default();
        file.set("MNE_DATASETS_BEETLSLEEP_PATH", "");
        file.set(DATA_KEY, "/data/file");
        let cfg = Config::resolve_with("beetlsleep", &file, no_env);
        assert_eq!(cfg.root, PathBuf::from("/data/file"));

        file.set(DATA_KEY, "");
        let cfg = Config::resolve_with("beetlsleep", &file, no_env);
        assert!(cfg.root.ends_with("mne_data"));
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".mne").join("mne-python.json");
        let mut file = ConfigFile::load(&path).unwrap();
        assert!(file.get(DATA_KEY).is_none());

        let root = dir.path().join("store");
        Config::new(&root).persist("beetlsleep", &mut file).unwrap();
        // Persisting twice over an existing root must not fail.
        Config::new(&root).persist("beetlsleep", &mut file).unwrap();

        let reloaded = ConfigFile::load(&path).unwrap();
        let cfg = Config::resolve_with("beetlsleep", &reloaded, no_env);
        assert_eq!(cfg.root, root);
        assert_eq!(reloaded.get(DATA_KEY), Some(root.to_string_lossy().as_ref()));
    }
}

use std::ops::Range;
use std::path::PathBuf;

use crate::config::Config;
use crate::data::remote::{FigshareClient, RemoteSource};
use crate::error::Result;

/// Static description of a figshare-hosted dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub article_id: u64,
    pub code: &'static str,
    pub subjects: Range<usize>,
}

pub const BEETL_SLEEP: DatasetInfo = DatasetInfo {
    article_id: 14779407,
    code: "beetlsleep",
    subjects: 0..10,
};

/// Handle on the BEETL sleep dataset: what to fetch, where to cache it, and
/// which remote to fetch it from.
///
/// Fetching lives in [`crate::data::fetch`], loading in [`crate::data::loader`].
pub struct BeetlSleepDataset<R = FigshareClient> {
    pub(crate) info: DatasetInfo,
    pub(crate) config: Config,
    pub(crate) remote: R,
}

impl BeetlSleepDataset<FigshareClient> {
    /// Figshare remote with the root resolved from env and config file.
    pub fn new() -> Result<Self> {
        let config = Config::resolve(BEETL_SLEEP.code)?;
        Ok(Self::with_remote(config, FigshareClient::new()?))
    }
}

impl<R: RemoteSource> BeetlSleepDataset<R> {
    pub fn with_remote(config: Config, remote: R) -> Self {
        Self {
            info: BEETL_SLEEP,
            config,
            remote,
        }
    }

    pub fn info(&self) -> &DatasetInfo {
        &self.info
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// `<root>/MNE-beetlsleep-data` under the current config.
    pub fn dataset_dir(&self) -> PathBuf {
        self.config.dataset_dir(self.info.code)
    }

    pub(crate) fn all_subjects(&self) -> Vec<usize> {
        self.info.subjects.clone().collect()
    }
}

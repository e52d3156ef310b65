use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const FIGSHARE_API: &str = "https://api.figshare.com/v2/articles/";
pub const FIGSHARE_FILES: &str = "https://ndownloader.figshare.com/files/";

// ---------------------------------------------------------------------------
// Manifest – remote file listing of one article
// ---------------------------------------------------------------------------

/// One file of a figshare article, as returned by `/articles/{id}/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub computed_md5: String,
}

impl ManifestEntry {
    /// Identifier used both in the download URL and as the local archive name.
    pub fn storage_id(&self) -> String {
        self.id.to_string()
    }

    pub fn hash(&self) -> String {
        format!("md5:{}", self.computed_md5)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub files: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self> {
        let files: Vec<ManifestEntry> = serde_json::from_str(text)?;
        Ok(Manifest { files })
    }

    /// File name → storage id.
    pub fn ids(&self) -> BTreeMap<&str, String> {
        self.files
            .iter()
            .map(|f| (f.name.as_str(), f.storage_id()))
            .collect()
    }

    /// Storage id → `md5:<hex>`.
    pub fn hashes(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .map(|f| (f.storage_id(), f.hash()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// RemoteSource – the file host
// ---------------------------------------------------------------------------

/// Narrow contract with the remote file host.
pub trait RemoteSource {
    /// List the files of `article_id`.
    fn manifest(&self, article_id: u64) -> Result<Manifest>;

    /// Stream the bytes of `entry` into `dest`, returning the byte count.
    fn fetch(&self, entry: &ManifestEntry, dest: &mut dyn Write) -> Result<u64>;
}

/// Blocking figshare client with a progress bar on downloads.
pub struct FigshareClient {
    client: reqwest::blocking::Client,
    progress: bool,
}

impl FigshareClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("beetl-sleep/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            progress: true,
        })
    }

    /// Disable the download progress bar.
    pub fn quiet(mut self) -> Self {
        self.progress = false;
        self
    }

    fn progress_bar(&self, len: Option<u64>) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        match len {
            Some(len) => {
                let bar = ProgressBar::new(len);
                let style = ProgressStyle::default_bar()
                    .template("{bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-");
                bar.set_style(style);
                bar
            }
            None => ProgressBar::new_spinner(),
        }
    }
}

impl RemoteSource for FigshareClient {
    fn manifest(&self, article_id: u64) -> Result<Manifest> {
        let url = format!("{FIGSHARE_API}{article_id}/files");
        debug!("GET {url}");
        let text = self.client.get(&url).send()?.error_for_status()?.text()?;
        Manifest::from_json(&text)
    }

    fn fetch(&self, entry: &ManifestEntry, dest: &mut dyn Write) -> Result<u64> {
        let url = format!("{FIGSHARE_FILES}{}", entry.storage_id());
        info!("Downloading {} from {url}", entry.name);
        let response = self.client.get(&url).send()?.error_for_status()?;

        let bar = self.progress_bar(response.content_length());
        let mut reader = bar.wrap_read(response);
        let written = io::copy(&mut reader, dest)?;
        bar.finish_and_clear();
        Ok(written)
    }
}

/// Lowercase hex MD5 of the file at `path`.
pub fn file_md5(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Md5::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#![allow(dead_code)]

use std::cell::Cell;
use std::io::{Cursor, Write};
use std::path::Path;

use beetl_sleep::data::model::{features_file_name, labels_file_name, HEADER_FILE};
use beetl_sleep::{BeetlSleepDataset, Config, Manifest, ManifestEntry, RemoteSource};
use md5::{Digest, Md5};
use ndarray::{array, Array1, Array3};
use ndarray_npy::WriteNpyExt;
use zip::write::SimpleFileOptions;

/// Trials per subject in the fake archive.
pub const TRIALS: [usize; 10] = [3, 1, 4, 1, 5, 9, 2, 6, 5, 3];
pub const ELECTRODES: usize = 2;
pub const SAMPLES: usize = 4;
pub const STORAGE_ID: u64 = 28_340_367;

/// Feature value at `(row, ch, t)` of `subject`.
pub fn feature_value(subject: usize, row: usize, ch: usize, t: usize) -> f32 {
    (subject * 1000 + row * 10 + ch * 4 + t) as f32
}

pub fn label_value(subject: usize, row: usize) -> i64 {
    (subject * 100 + row) as i64
}

fn npy_bytes<T: WriteNpyExt>(arr: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    arr.write_npy(&mut buf).unwrap();
    buf
}

/// Zip holding every subject's X/y plus the shared header, flat.
pub fn build_archive() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (subject, &n) in TRIALS.iter().enumerate() {
        let x = Array3::from_shape_fn((n, ELECTRODES, SAMPLES), |(r, c, t)| {
            feature_value(subject, r, c, t)
        });
        let y = Array1::from_shape_fn(n, |r| label_value(subject, r));

        zip.start_file(features_file_name(subject), options).unwrap();
        zip.write_all(&npy_bytes(&x)).unwrap();
        zip.start_file(labels_file_name(subject), options).unwrap();
        zip.write_all(&npy_bytes(&y)).unwrap();
    }

    zip.start_file(HEADER_FILE, options).unwrap();
    zip.write_all(&npy_bytes(&array![100.0f64, 2.0, 4.0])).unwrap();

    zip.finish().unwrap().into_inner()
}

pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}

/// In-memory file host that counts every call.
pub struct FakeRemote {
    pub archive: Vec<u8>,
    pub entries: Vec<ManifestEntry>,
    pub manifest_calls: Cell<usize>,
    pub fetch_calls: Cell<usize>,
    /// Break the connection after this many bytes.
    pub fail_after: Option<usize>,
}

impl FakeRemote {
    pub fn new() -> Self {
        let archive = build_archive();
        let entry = ManifestEntry {
            id: STORAGE_ID,
            name: "sleep_target.zip".to_string(),
            size: archive.len() as u64,
            computed_md5: md5_hex(&archive),
        };
        Self {
            archive,
            entries: vec![entry],
            manifest_calls: Cell::new(0),
            fetch_calls: Cell::new(0),
            fail_after: None,
        }
    }

    /// Same archive, but the manifest advertises a wrong checksum.
    pub fn with_bad_checksum() -> Self {
        let mut remote = Self::new();
        remote.entries[0].computed_md5 = "0".repeat(32);
        remote
    }

    /// Manifest listing the archive twice under different storage ids.
    pub fn with_two_archives() -> Self {
        let mut remote = Self::new();
        let mut second = remote.entries[0].clone();
        second.id = STORAGE_ID + 1;
        second.name = "sleep_target_copy.zip".to_string();
        remote.entries.push(second);
        remote
    }

    /// Sends half of the archive, then errors.
    pub fn dropping_connection() -> Self {
        let mut remote = Self::new();
        remote.fail_after = Some(remote.archive.len() / 2);
        remote
    }

    pub fn calls(&self) -> (usize, usize) {
        (self.manifest_calls.get(), self.fetch_calls.get())
    }
}

impl RemoteSource for FakeRemote {
    fn manifest(&self, _article_id: u64) -> beetl_sleep::Result<Manifest> {
        self.manifest_calls.set(self.manifest_calls.get() + 1);
        Ok(Manifest {
            files: self.entries.clone(),
        })
    }

    fn fetch(&self, _entry: &ManifestEntry, dest: &mut dyn Write) -> beetl_sleep::Result<u64> {
        self.fetch_calls.set(self.fetch_calls.get() + 1);
        if let Some(n) = self.fail_after {
            dest.write_all(&self.archive[..n])?;
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )
            .into());
        }
        dest.write_all(&self.archive)?;
        Ok(self.archive.len() as u64)
    }
}

pub fn dataset(root: &Path) -> BeetlSleepDataset<FakeRemote> {
    BeetlSleepDataset::with_remote(Config::new(root), FakeRemote::new())
}

pub fn dataset_with(root: &Path, remote: FakeRemote) -> BeetlSleepDataset<FakeRemote> {
    BeetlSleepDataset::with_remote(Config::new(root), remote)
}

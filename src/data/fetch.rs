use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use zip::ZipArchive;

use super::model::{features_file_name, labels_file_name, SubjectFiles, HEADER_FILE};
use super::remote::{file_md5, ManifestEntry, RemoteSource};
use crate::config::Config;
use crate::dataset::BeetlSleepDataset;
use crate::error::{Error, Result};

impl<R: RemoteSource> BeetlSleepDataset<R> {
    /// Make sure `subject`'s files are cached and return their paths.
    ///
    /// A missing feature file triggers a fetch of the whole remote archive,
    /// which restores every subject's files, not only this one's. Cache hits
    /// never talk to the remote.
    pub fn data_path(&self, subject: usize) -> Result<SubjectFiles> {
        self.data_path_in(&self.dataset_dir(), subject)
    }

    pub(crate) fn data_path_in(&self, dir: &Path, subject: usize) -> Result<SubjectFiles> {
        if !self.info.subjects.contains(&subject) {
            return Err(Error::UnknownSubject(subject));
        }

        let files = SubjectFiles::new(dir, subject);
        if files.features.exists() {
            debug!("subject {subject}: cache hit in {}", dir.display());
            return Ok(files);
        }

        let manifest = self.remote.manifest(self.info.article_id)?;
        for entry in &manifest.files {
            if files.features.exists() {
                break;
            }
            self.install_archive(dir, entry)?;
        }

        if !files.features.exists() {
            warn!(
                "subject {subject}: {} still missing after unpacking {} archive(s)",
                files.features.display(),
                manifest.files.len()
            );
        }
        Ok(files)
    }

    /// Materialize `subjects` (default: all) in the cache.
    ///
    /// `path` replaces this handle's root before fetching. Returns the cache
    /// directory of the first requested subject.
    pub fn download(&mut self, path: Option<&Path>, subjects: Option<&[usize]>) -> Result<PathBuf> {
        if let Some(path) = path {
            fs::create_dir_all(path)?;
            info!("Using {} as download root", path.display());
            self.config = Config::new(path);
        }

        let subjects = match subjects {
            Some(s) => s.to_vec(),
            None => self.all_subjects(),
        };

        let mut first: Option<SubjectFiles> = None;
        for subject in subjects {
            let files = self.data_path(subject)?;
            first.get_or_insert(files);
        }

        let first = first.ok_or(Error::NoSubjects)?;
        Ok(first.dir().to_path_buf())
    }

    /// Retrieve one archive, unpack it, and move its contents into `dir`.
    fn install_archive(&self, dir: &Path, entry: &ManifestEntry) -> Result<()> {
        fs::create_dir_all(dir)?;
        let archive = self.retrieve(dir, entry)?;

        let extract_dir = dir.join(format!("{}.unzip", entry.storage_id()));
        info!("Extracting {} to {}", archive.display(), extract_dir.display());
        let mut zip = ZipArchive::new(BufReader::new(File::open(&archive)?))?;
        zip.extract(&extract_dir)?;

        for subject in self.info.subjects.clone() {
            move_into(&extract_dir, dir, &features_file_name(subject))?;
            move_into(&extract_dir, dir, &labels_file_name(subject))?;
        }
        move_into(&extract_dir, dir, HEADER_FILE)?;

        // Non-recursive: anything unexpected left in the archive fails here.
        fs::remove_dir(&extract_dir)?;
        info!("Cached {} subjects in {}", self.info.subjects.len(), dir.display());
        Ok(())
    }

    /// Return the local archive for `entry`, downloading it unless a copy with
    /// the expected md5 is already on disk.
    fn retrieve(&self, dir: &Path, entry: &ManifestEntry) -> Result<PathBuf> {
        let archive = dir.join(entry.storage_id());
        if archive.exists() {
            if file_md5(&archive)?.eq_ignore_ascii_case(&entry.computed_md5) {
                debug!("Reusing verified archive {}", archive.display());
                return Ok(archive);
            }
            warn!("{} does not match {}, downloading again", archive.display(), entry.hash());
        }

        let part = dir.join(format!("{}.part", entry.storage_id()));
        let mut out = BufWriter::new(File::create(&part)?);
        let fetched = self
            .remote
            .fetch(entry, &mut out)
            .and_then(|n| out.flush().map(|_| n).map_err(Error::from));
        drop(out);
        let bytes = match fetched {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&part);
                return Err(e);
            }
        };
        debug!("Fetched {bytes} bytes into {}", part.display());

        let actual = file_md5(&part)?;
        if !actual.eq_ignore_ascii_case(&entry.computed_md5) {
            fs::remove_file(&part)?;
            return Err(Error::HashMismatch {
                file: entry.name.clone(),
                expected: entry.computed_md5.clone(),
                actual,
            });
        }

        fs::rename(&part, &archive)?;
        Ok(archive)
    }
}

fn move_into(from: &Path, to: &Path, name: &str) -> Result<()> {
    fs::rename(from.join(name), to.join(name))?;
    Ok(())
}

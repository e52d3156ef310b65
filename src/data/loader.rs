use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use ndarray::{concatenate, Array1, Array3, Axis};
use ndarray_npy::{read_npy, ReadableElement};

use super::model::{FileKind, Metadata, SleepData};
use super::remote::RemoteSource;
use crate::config::Config;
use crate::dataset::BeetlSleepDataset;
use crate::error::{Error, Result};

impl<R: RemoteSource> BeetlSleepDataset<R> {
    /// Load `subjects` (default: all) and concatenate them along the trial axis.
    ///
    /// `path` overrides the root for this call only. Missing subjects are
    /// fetched on the way. Features are read as `F`, labels as `L`; both must
    /// match the dtypes stored in the `.npy` files.
    pub fn get_data<F, L>(
        &self,
        path: Option<&Path>,
        subjects: Option<&[usize]>,
    ) -> Result<SleepData<F, L>>
    where
        F: ReadableElement + Clone,
        L: ReadableElement + Clone,
    {
        let dir = match path {
            Some(root) => Config::new(root).dataset_dir(self.info.code),
            None => self.dataset_dir(),
        };
        let subjects = match subjects {
            Some(s) => s.to_vec(),
            None => self.all_subjects(),
        };

        // (subject, file) in subject order; the header is shared, last one wins.
        let mut arrays: Vec<(usize, PathBuf)> = Vec::new();
        let mut header: Option<PathBuf> = None;
        for &subject in &subjects {
            let files = self.data_path_in(&dir, subject)?;
            for p in files.paths() {
                if FileKind::of(p) == FileKind::Metadata {
                    header = Some(p.to_path_buf());
                } else {
                    arrays.push((subject, p.to_path_buf()));
                }
            }
        }

        let mut xs: Vec<Array3<F>> = Vec::new();
        let mut ys: Vec<Array1<L>> = Vec::new();
        let mut subject_rows = Vec::new();
        let mut offset = 0;
        for (subject, p) in &arrays {
            match FileKind::of(p) {
                FileKind::Features => {
                    let x: Array3<F> = load_array(p)?;
                    let n = x.len_of(Axis(0));
                    subject_rows.push((*subject, offset..offset + n));
                    offset += n;
                    xs.push(x);
                }
                FileKind::Labels => ys.push(load_array(p)?),
                _ => debug!("Skipping {}", p.display()),
            }
        }

        let header = header.ok_or(Error::MissingMetadata)?;
        let metadata = Metadata::read(&header)?;

        let x = concat(&xs)?;
        let y = concat(&ys)?;
        if x.len_of(Axis(0)) != y.len() {
            warn!(
                "{} feature rows but {} labels for subjects {subjects:?}",
                x.len_of(Axis(0)),
                y.len()
            );
        }
        info!("Loaded subjects {subjects:?}: X {:?}, y {:?}", x.shape(), y.shape());

        Ok(SleepData {
            x,
            y,
            metadata,
            subject_rows,
        })
    }
}

fn load_array<T>(path: &Path) -> Result<T>
where
    T: ndarray_npy::ReadNpyExt,
{
    read_npy(path).map_err(|source| Error::Npy {
        path: path.to_path_buf(),
        source,
    })
}

fn concat<A: Clone, D: ndarray::RemoveAxis>(
    parts: &[ndarray::Array<A, D>],
) -> Result<ndarray::Array<A, D>> {
    let views: Vec<_> = parts.iter().map(|a| a.view()).collect();
    Ok(concatenate(Axis(0), &views)?)
}

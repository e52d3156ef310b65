use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array3};

use crate::error::{Error, Result};

/// Shared metadata file present once per dataset cache.
pub const HEADER_FILE: &str = "headerInfo.npy";

const FEATURES_SUFFIX: &str = "X.npy";
const LABELS_SUFFIX: &str = "y.npy";

pub fn features_file_name(subject: usize) -> String {
    format!("s{subject}r1{FEATURES_SUFFIX}")
}

pub fn labels_file_name(subject: usize) -> String {
    format!("s{subject}r1{LABELS_SUFFIX}")
}

// ---------------------------------------------------------------------------
// FileKind – what a cached file holds, judged by its name
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Features,
    Labels,
    Metadata,
    Other,
}

impl FileKind {
    pub fn of(path: &Path) -> Self {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return FileKind::Other,
        };
        if name == HEADER_FILE {
            FileKind::Metadata
        } else if name.ends_with(FEATURES_SUFFIX) {
            FileKind::Features
        } else if name.ends_with(LABELS_SUFFIX) {
            FileKind::Labels
        } else {
            FileKind::Other
        }
    }
}

// ---------------------------------------------------------------------------
// SubjectFiles – canonical on-disk location of one subject
// ---------------------------------------------------------------------------

/// The three files backing one subject. `metadata` is the same path for every
/// subject of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectFiles {
    pub subject: usize,
    pub features: PathBuf,
    pub labels: PathBuf,
    pub metadata: PathBuf,
}

impl SubjectFiles {
    pub fn new(dataset_dir: &Path, subject: usize) -> Self {
        Self {
            subject,
            features: dataset_dir.join(features_file_name(subject)),
            labels: dataset_dir.join(labels_file_name(subject)),
            metadata: dataset_dir.join(HEADER_FILE),
        }
    }

    /// Features, labels, metadata – in that order.
    pub fn paths(&self) -> [&Path; 3] {
        [&self.features, &self.labels, &self.metadata]
    }

    /// Directory holding the subject's files.
    pub fn dir(&self) -> &Path {
        self.features.parent().unwrap_or_else(|| Path::new(""))
    }
}

// ---------------------------------------------------------------------------
// NpyHeader / Metadata – opaque contents of headerInfo.npy
// ---------------------------------------------------------------------------

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Numeric element types the driver knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    F32,
    F64,
    I32,
    I64,
    U8,
}

/// Parsed `.npy` preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpyHeader {
    /// Dtype descriptor, e.g. `<f4` or `|O`. Structured dtypes keep their
    /// unparsed list text, e.g. `[('fs', '<f8')]`.
    pub descr: String,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl NpyHeader {
    /// Element type for plain little-endian (or byte-order-free) descriptors.
    pub fn element_type(&self) -> Option<ElementType> {
        let code = self
            .descr
            .strip_prefix(['<', '|', '='])
            .unwrap_or(&self.descr);
        match code {
            "f4" => Some(ElementType::F32),
            "f8" => Some(ElementType::F64),
            "i4" => Some(ElementType::I32),
            "i8" => Some(ElementType::I64),
            "u1" => Some(ElementType::U8),
            _ => None,
        }
    }

    /// Read only the header of the `.npy` file at `path`.
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader, path)
    }

    /// Consume the preamble from `reader`, leaving it at the first data byte.
    /// `path` is only used in error messages.
    pub fn read_from(reader: &mut impl Read, path: &Path) -> Result<Self> {
        let bad = |reason: &str| Error::BadNpyHeader {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let mut preamble = [0u8; 8];
        reader.read_exact(&mut preamble)?;
        if &preamble[..6] != NPY_MAGIC {
            return Err(bad("missing magic string"));
        }

        let header_len = match preamble[6] {
            1 => {
                let mut len = [0u8; 2];
                reader.read_exact(&mut len)?;
                u16::from_le_bytes(len) as usize
            }
            2 | 3 => {
                let mut len = [0u8; 4];
                reader.read_exact(&mut len)?;
                u32::from_le_bytes(len) as usize
            }
            v => return Err(bad(&format!("unsupported format version {v}"))),
        };

        let mut raw = vec![0u8; header_len];
        reader.read_exact(&mut raw)?;
        let dict = String::from_utf8_lossy(&raw);

        let descr = dict_value(&dict, "descr")
            .and_then(|v| quoted(v).or_else(|| bracketed(v)))
            .ok_or_else(|| bad("missing or malformed 'descr'"))?;

        let fortran_order = match dict_value(&dict, "fortran_order") {
            Some(v) if v.starts_with("True") => true,
            Some(v) if v.starts_with("False") => false,
            _ => return Err(bad("missing 'fortran_order'")),
        };

        let shape = dict_value(&dict, "shape")
            .and_then(tuple)
            .ok_or_else(|| bad("missing or malformed 'shape'"))?;

        Ok(NpyHeader {
            descr: descr.to_string(),
            fortran_order,
            shape,
        })
    }
}

fn dict_value<'a>(dict: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{key}':");
    let start = dict.find(&pattern)? + pattern.len();
    Some(dict[start..].trim_start())
}

fn quoted(value: &str) -> Option<&str> {
    let rest = value.strip_prefix('\'')?;
    let end = rest.find('\'')?;
    Some(&rest[..end])
}

/// `[...]` up to its matching bracket, brackets included.
fn bracketed(value: &str) -> Option<&str> {
    if !value.starts_with('[') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_quote = false;
    for (i, c) in value.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '[' if !in_quote => depth += 1,
            ']' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(&value[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn tuple(value: &str) -> Option<Vec<usize>> {
    let rest = value.strip_prefix('(')?;
    let end = rest.find(')')?;
    rest[..end]
        .split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| tok.trim_end_matches('L').parse().ok())
        .collect()
}

/// Dataset-wide header info.
///
/// The payload is frequently a pickled object array, so it is kept as raw
/// bytes next to the parsed header rather than interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub header: NpyHeader,
    pub payload: Vec<u8>,
}

impl Metadata {
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let header = NpyHeader::read_from(&mut reader, path)?;
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        Ok(Metadata { header, payload })
    }
}

// ---------------------------------------------------------------------------
// SleepData – one assembled split
// ---------------------------------------------------------------------------

/// Features and labels of several subjects concatenated along the trial axis.
#[derive(Debug, Clone)]
pub struct SleepData<F, L> {
    /// Trials × electrodes × samples.
    pub x: Array3<F>,
    /// One label per trial.
    pub y: Array1<L>,
    pub metadata: Metadata,
    /// Rows contributed by each subject, in load order.
    pub subject_rows: Vec<(usize, Range<usize>)>,
}

impl<F, L> SleepData<F, L> {
    /// Number of trials (first axis of `x`).
    pub fn n_trials(&self) -> usize {
        self.x.shape()[0]
    }

    /// Subjects in load order.
    pub fn subjects(&self) -> Vec<usize> {
        self.subject_rows.iter().map(|(s, _)| *s).collect()
    }
}

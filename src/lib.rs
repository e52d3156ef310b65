//! Acquisition and materialization of the BEETL sleep-staging dataset.
//!
//! ```no_run
//! use beetl_sleep::BeetlSleepDataset;
//!
//! # fn main() -> beetl_sleep::Result<()> {
//! let mut ds = BeetlSleepDataset::new()?;
//! ds.download(None, None)?;
//! let source = ds.get_data::<f32, i64>(None, Some(&[0, 1, 2, 3, 4]))?;
//! println!("{:?} {:?}", source.x.shape(), source.y.shape());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod dataset;
pub mod error;

pub use config::{Config, ConfigFile};
pub use data::model::{Metadata, NpyHeader, SleepData, SubjectFiles};
pub use data::remote::{FigshareClient, Manifest, ManifestEntry, RemoteSource};
pub use dataset::{BeetlSleepDataset, DatasetInfo, BEETL_SLEEP};
pub use error::{Error, Result};

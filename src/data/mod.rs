/// Data layer: remote retrieval, cache materialization, loading and filtering.
///
/// Architecture:
/// ```text
///   figshare manifest + archive
///        │
///        ▼
///   ┌──────────┐
///   │  remote   │  manifest JSON, download with progress, md5
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  fetch    │  <root>/MNE-beetlsleep-data/s{N}r1{X,y}.npy + headerInfo.npy
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read .npy per subject → concatenated SleepData
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  subject ids → row indices / sub-split
///   └──────────┘
/// ```

pub mod fetch;
pub mod filter;
pub mod loader;
pub mod model;
pub mod remote;

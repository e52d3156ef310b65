use std::path::Path;

use anyhow::{bail, Context, Result};
use beetl_sleep::data::model::ElementType;
use beetl_sleep::{BeetlSleepDataset, NpyHeader, SleepData};
use ndarray_npy::ReadableElement;

/// Source group is subjects 0-4, target group 5-7; 8 and 9 are held-out target.
const SPLITS: [(&str, &[usize]); 3] = [
    ("train-source", &[0, 1, 2, 3, 4]),
    ("train-target", &[5, 6, 7]),
    ("test-target", &[8, 9]),
];

fn main() -> Result<()> {
    env_logger::init();

    let mut ds = BeetlSleepDataset::new().context("setting up dataset")?;
    let dir = ds.download(None, None).context("downloading BEETL sleep data")?;
    log::info!("Dataset cached in {}", dir.display());

    let first = ds.data_path(0)?;
    let features = element_type(&first.features)?;
    let labels = element_type(&first.labels)?;
    log::debug!("features {features:?}, labels {labels:?}");

    match features {
        ElementType::F32 => with_labels::<f32>(&ds, labels),
        ElementType::F64 => with_labels::<f64>(&ds, labels),
        other => bail!("unsupported feature dtype {other:?}"),
    }
}

/// Element type stored in the `.npy` file at `path`.
fn element_type(path: &Path) -> Result<ElementType> {
    let header =
        NpyHeader::read(path).with_context(|| format!("reading {}", path.display()))?;
    header
        .element_type()
        .with_context(|| format!("unsupported dtype {} in {}", header.descr, path.display()))
}

fn with_labels<F: ReadableElement + Clone>(ds: &BeetlSleepDataset, labels: ElementType) -> Result<()> {
    match labels {
        ElementType::I64 => report::<F, i64>(ds),
        ElementType::I32 => report::<F, i32>(ds),
        ElementType::U8 => report::<F, u8>(ds),
        ElementType::F64 => report::<F, f64>(ds),
        ElementType::F32 => report::<F, f32>(ds),
    }
}

fn report<F, L>(ds: &BeetlSleepDataset) -> Result<()>
where
    F: ReadableElement + Clone,
    L: ReadableElement + Clone,
{
    let all: SleepData<F, L> = ds.get_data(None, None).context("loading all subjects")?;
    println!("all: X {:?}, y {:?}", all.x.shape(), all.y.shape());

    for (name, subjects) in SPLITS {
        let split: SleepData<F, L> = ds
            .get_data(None, Some(subjects))
            .with_context(|| format!("loading {name}"))?;
        println!(
            "{name} (subjects {subjects:?}): X {:?}, y {:?}",
            split.x.shape(),
            split.y.shape()
        );
        if split.metadata != all.metadata {
            log::warn!("{name}: header info differs from the full load");
        }
    }
    Ok(())
}

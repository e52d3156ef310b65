use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use beetl_sleep::config::Config;
use beetl_sleep::data::model::{features_file_name, labels_file_name, HEADER_FILE};
use beetl_sleep::BEETL_SLEEP;
use ndarray::{array, Array1, Array3};
use ndarray_npy::WriteNpyExt;

const SAMPLING_RATE: f64 = 100.0;
const ELECTRODES: usize = 2;
/// One 30 s scoring epoch.
const SAMPLES: usize = 3000;

/// Dominant rhythm (Hz) and amplitude per sleep stage 0..=5.
const STAGE_RHYTHMS: [(f64, f64); 6] = [
    (10.0, 20.0), // wake: alpha
    (6.0, 30.0),  // N1: theta
    (13.0, 25.0), // N2: spindles
    (2.0, 60.0),  // N3: delta
    (1.0, 75.0),  // N4: slow delta
    (7.0, 20.0),  // REM: sawtooth theta
];

/// Deterministic splitmix64 generator, enough for reproducible noise.
struct SimpleRng(u64);

impl SimpleRng {
    fn new(seed: u64) -> Self {
        SimpleRng(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// EEG-like epochs for one subject: a stage-dependent rhythm plus noise.
fn generate_subject(n_trials: usize, rng: &mut SimpleRng) -> (Array3<f32>, Array1<i64>) {
    let labels: Array1<i64> = (0..n_trials)
        .map(|_| (rng.next_u64() % STAGE_RHYTHMS.len() as u64) as i64)
        .collect();

    let mut x = Array3::<f32>::zeros((n_trials, ELECTRODES, SAMPLES));
    for (trial, &stage) in labels.iter().enumerate() {
        let (freq, amp) = STAGE_RHYTHMS[stage as usize];
        for ch in 0..ELECTRODES {
            let phase = rng.next_f64() * 2.0 * std::f64::consts::PI;
            for t in 0..SAMPLES {
                let secs = t as f64 / SAMPLING_RATE;
                let signal = amp * (2.0 * std::f64::consts::PI * freq * secs + phase).sin();
                x[[trial, ch, t]] = (signal + rng.gauss(0.0, 5.0)) as f32;
            }
        }
    }
    (x, labels)
}

fn write_npy<T: WriteNpyExt>(path: &Path, arr: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    arr.write_npy(BufWriter::new(file))
        .with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    let dir = Config::new(&root).dataset_dir(BEETL_SLEEP.code);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let mut total = 0;
    for subject in BEETL_SLEEP.subjects.clone() {
        let n_trials = 20 + 3 * subject;
        let (x, y) = generate_subject(n_trials, &mut rng);
        write_npy(&dir.join(features_file_name(subject)), &x)?;
        write_npy(&dir.join(labels_file_name(subject)), &y)?;
        total += n_trials;
    }

    let header = array![SAMPLING_RATE, ELECTRODES as f64, SAMPLES as f64];
    write_npy(&dir.join(HEADER_FILE), &header)?;

    println!(
        "Wrote {total} epochs for {} subjects to {}",
        BEETL_SLEEP.subjects.len(),
        dir.display()
    );
    println!(
        "Load them with MNE_DATASETS_{}_PATH={}",
        BEETL_SLEEP.code.to_uppercase(),
        root.display()
    );
    Ok(())
}

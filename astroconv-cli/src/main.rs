use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use astroconv::io::{load_gray_f32, save_gray_f32};
use astroconv::{convolve_spatial_dyn, ConvolveOptions, DynamicArray, NdArray};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "astroconv CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KernelKindConfig {
    Gaussian,
    Box,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct KernelConfig {
    kind: KernelKindConfig,
    /// Odd extent of the square kernel; derived from sigma when omitted.
    size: Option<usize>,
    sigma: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            kind: KernelKindConfig::Gaussian,
            size: None,
            sigma: 1.5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConvolveConfigJson {
    num_threads: usize,
    channels: Option<Vec<usize>>,
    edge_correction: bool,
    convolve_over_channels: bool,
}

impl Default for ConvolveConfigJson {
    fn default() -> Self {
        let options = ConvolveOptions::default();
        Self {
            num_threads: options.num_threads,
            channels: options.channels,
            edge_correction: options.edge_correction,
            convolve_over_channels: options.convolve_over_channels,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DTypeConfig {
    Float32,
    Float64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    output_path: String,
    /// Write the JSON run report here instead of stdout.
    report_path: Option<String>,
    dtype: DTypeConfig,
    /// Pixel value to treat as blank before convolving.
    blank_value: Option<f32>,
    kernel: KernelConfig,
    convolve: ConvolveConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            output_path: String::new(),
            report_path: None,
            dtype: DTypeConfig::Float32,
            blank_value: None,
            kernel: KernelConfig::default(),
            convolve: ConvolveConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    image_height: usize,
    image_width: usize,
    dtype: &'static str,
    kernel_size: usize,
    threads: usize,
    blanks_in: usize,
    blanks_out: usize,
    elapsed_ms: f64,
}

/// Normalized square gaussian weights, flattened row-major.
fn gaussian_weights(size: usize, sigma: f64) -> Vec<f64> {
    let center = (size / 2) as f64;
    let mut weights = Vec::with_capacity(size * size);
    let mut total = 0.0f64;
    for y in 0..size {
        for x in 0..size {
            let dy = y as f64 - center;
            let dx = x as f64 - center;
            let value = (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp();
            total += value;
            weights.push(value);
        }
    }
    for weight in &mut weights {
        *weight /= total;
    }
    weights
}

/// Replaces `blank` pixels with NaN, returning how many were replaced.
fn mask_blank(image: &mut NdArray<f32>, blank: f32) -> usize {
    let mut masked = 0;
    for value in image.as_mut_slice() {
        if *value == blank {
            *value = f32::NAN;
            masked += 1;
        }
    }
    masked
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("astroconv=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() || config.output_path.is_empty() {
        return Err("image_path and output_path must be set in the config".into());
    }
    if matches!(config.kernel.kind, KernelKindConfig::Gaussian) && config.kernel.sigma <= 0.0 {
        return Err("kernel sigma must be positive".into());
    }
    let size = match (&config.kernel.kind, config.kernel.size) {
        (_, Some(size)) => size,
        (KernelKindConfig::Gaussian, None) => {
            2 * (2.0 * config.kernel.sigma).ceil() as usize + 1
        }
        (KernelKindConfig::Box, None) => 3,
    };
    if size == 0 || size % 2 == 0 {
        return Err(format!("kernel size must be odd and nonzero, got {size}").into());
    }

    let mut image = load_gray_f32(&config.image_path)?;
    let image_height = image.dims()[0];
    let image_width = image.dims()[1];
    let blanks_in = match config.blank_value {
        Some(blank) => mask_blank(&mut image, blank),
        None => image.count_blank(),
    };

    let weights = match config.kernel.kind {
        KernelKindConfig::Gaussian => gaussian_weights(size, config.kernel.sigma),
        KernelKindConfig::Box => vec![1.0 / (size * size) as f64; size * size],
    };

    let options = ConvolveOptions {
        num_threads: config.convolve.num_threads,
        channels: config.convolve.channels.clone(),
        edge_correction: config.convolve.edge_correction,
        convolve_over_channels: config.convolve.convolve_over_channels,
    };

    let (dtype_name, input, kernel) = match config.dtype {
        DTypeConfig::Float32 => {
            let kernel =
                NdArray::from_vec(weights.iter().map(|&w| w as f32).collect(), &[size, size])?;
            ("float32", DynamicArray::from(image), DynamicArray::from(kernel))
        }
        DTypeConfig::Float64 => {
            let widened = NdArray::from_vec(
                image.as_slice().iter().map(|&v| f64::from(v)).collect(),
                image.dims(),
            )?;
            let kernel = NdArray::from_vec(weights, &[size, size])?;
            ("float64", DynamicArray::from(widened), DynamicArray::from(kernel))
        }
    };

    let start = Instant::now();
    let result = convolve_spatial_dyn(&input, &kernel, &options)?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    let blanks_out = result.count_blank();

    let writable = match result {
        DynamicArray::Float32(array) => array,
        DynamicArray::Float64(array) => NdArray::from_vec(
            array.as_slice().iter().map(|&v| v as f32).collect(),
            array.dims(),
        )?,
        _ => return Err("unexpected output element type".into()),
    };
    save_gray_f32(&writable, &config.output_path)?;

    let report = Report {
        image_height,
        image_width,
        dtype: dtype_name,
        kernel_size: size,
        threads: options.num_threads,
        blanks_in,
        blanks_out,
        elapsed_ms,
    };
    let json = serde_json::to_string_pretty(&report)?;
    match config.report_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

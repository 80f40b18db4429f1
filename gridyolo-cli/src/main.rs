use clap::Parser;
use gridyolo::{
    AnchorSpec, CenterCrop, ClassCatalog, CoordinateTransform, DetectConfig, Detection, Detector,
    Identity, Letterbox, ScaleToPixels, SuppressionMode,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "gridyolo CLI: decode a raw detector tensor (JSON config driven)")]
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
    /// Enable tracing output for decode and suppression.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TensorFormat {
    /// Raw little-endian f32 values, channel-major.
    #[default]
    F32Le,
    /// A flat JSON array of numbers.
    Json,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SuppressionConfig {
    #[default]
    ClassAgnostic,
    PerClass,
}

impl From<SuppressionConfig> for SuppressionMode {
    fn from(value: SuppressionConfig) -> Self {
        match value {
            SuppressionConfig::ClassAgnostic => SuppressionMode::ClassAgnostic,
            SuppressionConfig::PerClass => SuppressionMode::PerClass,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ModelConfigJson {
    grid_rows: usize,
    grid_cols: usize,
    num_classes: usize,
    /// Interleaved anchor widths and heights in grid cells.
    anchors: Vec<f32>,
}

impl Default for ModelConfigJson {
    fn default() -> Self {
        let spec = AnchorSpec::tiny_yolo_voc();
        Self {
            grid_rows: spec.grid_rows,
            grid_cols: spec.grid_cols,
            num_classes: spec.num_classes,
            anchors: spec
                .anchors
                .iter()
                .flat_map(|a| [a.width, a.height])
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    object_threshold: f32,
    nms_threshold: f32,
    suppression: SuppressionConfig,
    parallel: bool,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        Self {
            object_threshold: cfg.object_threshold,
            nms_threshold: cfg.nms_threshold,
            suppression: SuppressionConfig::ClassAgnostic,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TransformConfig {
    #[default]
    Normalized,
    ScaleToPixels {
        width: f32,
        height: f32,
    },
    CenterCrop {
        image_width: f32,
        image_height: f32,
    },
    Letterbox {
        image_width: f32,
        image_height: f32,
        input_width: f32,
        input_height: f32,
    },
}

impl TransformConfig {
    fn build(&self) -> gridyolo::GridYoloResult<Box<dyn CoordinateTransform>> {
        Ok(match *self {
            TransformConfig::Normalized => Box::new(Identity),
            TransformConfig::ScaleToPixels { width, height } => {
                Box::new(ScaleToPixels::new(width, height)?)
            }
            TransformConfig::CenterCrop {
                image_width,
                image_height,
            } => Box::new(CenterCrop::new(image_width, image_height)?),
            TransformConfig::Letterbox {
                image_width,
                image_height,
                input_width,
                input_height,
            } => Box::new(Letterbox::new(
                image_width,
                image_height,
                input_width,
                input_height,
            )?),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    tensor_path: String,
    tensor_format: TensorFormat,
    model: ModelConfigJson,
    labels: Option<Vec<String>>,
    detect: DetectConfigJson,
    transform: TransformConfig,
    output_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    label: String,
    class_index: usize,
    confidence: f32,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl From<&Detection> for DetectionRecord {
    fn from(value: &Detection) -> Self {
        let bounds = value.bounds();
        Self {
            label: value.label().to_owned(),
            class_index: value.class().index(),
            confidence: value.confidence(),
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    count: usize,
    detections: Vec<DetectionRecord>,
}

fn load_tensor(path: &str, format: &TensorFormat) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    match format {
        TensorFormat::F32Le => {
            let bytes = fs::read(path)?;
            if bytes.len() % 4 != 0 {
                return Err("f32_le tensor file length must be a multiple of 4 bytes".into());
            }
            Ok(bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect())
        }
        TensorFormat::Json => {
            let text = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("gridyolo=debug".parse()?))
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
    if config.tensor_path.is_empty() {
        return Err("tensor_path must be set in the config".into());
    }

    let spec = AnchorSpec::from_flat_anchors(
        config.model.grid_rows,
        config.model.grid_cols,
        config.model.num_classes,
        &config.model.anchors,
    )?;
    let catalog = match &config.labels {
        Some(labels) => ClassCatalog::from_labels(labels)?,
        None if spec.num_classes == gridyolo::VOC_LABELS.len() => ClassCatalog::voc(),
        None => return Err("labels must be set when num_classes differs from the VOC catalog".into()),
    };

    let detector = Detector::new(spec, catalog)?.with_config(DetectConfig {
        object_threshold: config.detect.object_threshold,
        nms_threshold: config.detect.nms_threshold,
        suppression: config.detect.suppression.into(),
        parallel: config.detect.parallel,
    })?;
    let transform = config.transform.build()?;

    let tensor = load_tensor(&config.tensor_path, &config.tensor_format)?;
    tracing::info!(
        path = %config.tensor_path,
        values = tensor.len(),
        "loaded tensor"
    );

    let detections = detector.detect_slice(&tensor, transform.as_ref())?;
    let output = Output {
        count: detections.len(),
        detections: detections.iter().map(DetectionRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

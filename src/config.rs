use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::detect::BackendKind;

const DEFAULT_MODEL_PATH: &str = "yolov5su.onnx";
const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_IOU: f32 = 0.45;
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_MODELS_DIR: &str = "data/modelos3d";
const DEFAULT_URL_PREFIX: &str = "/modelos";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_LLM_MODEL: &str = "llama3-8b-8192";

/// Env files tried in order; the first one that exists is loaded.
const ENV_FILES: [&str; 2] = ["api.env", ".env"];

#[derive(Debug, Deserialize, Default)]
struct AppConfigFile {
    detector: Option<DetectorConfigFile>,
    output: Option<OutputConfigFile>,
    llm: Option<LlmConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<BackendKind>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
    input_size: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct OutputConfigFile {
    models_dir: Option<PathBuf>,
    url_prefix: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LlmConfigFile {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub detector: DetectorSettings,
    pub output: OutputSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: BackendKind,
    pub model_path: PathBuf,
    pub labels_path: Option<PathBuf>,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub input_size: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels_path: None,
            confidence_threshold: DEFAULT_CONFIDENCE,
            iou_threshold: DEFAULT_IOU,
            input_size: DEFAULT_INPUT_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    /// Directory generated artifacts are written to.
    pub models_dir: PathBuf,
    /// Virtual prefix for `modelo_url` (e.g. "/modelos").
    pub url_prefix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
        }
    }
}

/// Chat provider settings. Only the chat tooling requires these.
#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
        }
    }
}

impl LlmSettings {
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow!(
                "GROQ_API_KEY is not configured; set it in api.env, .env or the environment"
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow!("BASE_URL must be an http(s) URL"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load `api.env`/`.env` from the working directory, then the TOML file
    /// (`config_path`, else `APP_CONFIG`), then environment overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = load_env_file(Path::new(".")) {
            log::info!("loaded environment from {}", path.display());
        }
        let from_env = std::env::var_os("APP_CONFIG").map(PathBuf::from);
        Self::load_from(config_path.or(from_env.as_deref()))
    }

    /// Like `load` but with an explicit config file and no env-file lookup.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let file_cfg = match config_path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AppConfigFile) -> Self {
        let detector_defaults = DetectorSettings::default();
        let detector = match file.detector {
            Some(d) => DetectorSettings {
                backend: d.backend.unwrap_or(detector_defaults.backend),
                model_path: d.model_path.unwrap_or(detector_defaults.model_path),
                labels_path: d.labels_path,
                confidence_threshold: d
                    .confidence_threshold
                    .unwrap_or(detector_defaults.confidence_threshold),
                iou_threshold: d.iou_threshold.unwrap_or(detector_defaults.iou_threshold),
                input_size: d.input_size.unwrap_or(detector_defaults.input_size),
            },
            None => detector_defaults,
        };
        let output_defaults = OutputSettings::default();
        let output = OutputSettings {
            models_dir: file
                .output
                .as_ref()
                .and_then(|o| o.models_dir.clone())
                .unwrap_or(output_defaults.models_dir),
            url_prefix: file
                .output
                .and_then(|o| o.url_prefix)
                .unwrap_or(output_defaults.url_prefix),
        };
        let llm_defaults = LlmSettings::default();
        let llm = match file.llm {
            Some(l) => LlmSettings {
                api_key: l.api_key.unwrap_or(llm_defaults.api_key),
                base_url: l.base_url.unwrap_or(llm_defaults.base_url),
                model: l.model.unwrap_or(llm_defaults.model),
            },
            None => llm_defaults,
        };
        Self {
            detector,
            output,
            llm,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(backend) = env_value("DETECTOR_BACKEND") {
            self.detector.backend = backend.parse()?;
        }
        if let Some(path) = env_value("YOLO_MODEL_PATH") {
            self.detector.model_path = PathBuf::from(path);
        }
        if let Some(path) = env_value("YOLO_LABELS_PATH") {
            self.detector.labels_path = Some(PathBuf::from(path));
        }
        if let Some(v) = env_parsed::<f32>("YOLO_CONFIDENCE", "a number between 0 and 1")? {
            self.detector.confidence_threshold = v;
        }
        if let Some(v) = env_parsed::<f32>("YOLO_IOU", "a number between 0 and 1")? {
            self.detector.iou_threshold = v;
        }
        if let Some(v) = env_parsed::<u32>("YOLO_INPUT_SIZE", "an integer pixel size")? {
            self.detector.input_size = v;
        }
        if let Some(dir) = env_value("MODELS3D_DIR") {
            self.output.models_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = env_value("MODELS3D_URL_PREFIX") {
            self.output.url_prefix = prefix;
        }
        if let Some(key) = env_value("GROQ_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(url) = env_value("BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = env_value("LLM_MODEL") {
            self.llm.model = model;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        let d = &self.detector;
        if !(d.confidence_threshold > 0.0 && d.confidence_threshold <= 1.0) {
            return Err(anyhow!("confidence threshold must be in (0, 1]"));
        }
        if !(d.iou_threshold > 0.0 && d.iou_threshold <= 1.0) {
            return Err(anyhow!("IoU threshold must be in (0, 1]"));
        }
        if d.input_size == 0 || d.input_size % 32 != 0 {
            return Err(anyhow!("input size must be a positive multiple of 32"));
        }
        if !self.output.url_prefix.starts_with('/') {
            return Err(anyhow!("models url prefix must start with '/'"));
        }
        let trimmed = self.output.url_prefix.trim_end_matches('/');
        self.output.url_prefix = if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        Ok(())
    }
}

/// Load `api.env` from `root` if present, else `.env`. Existing variables win.
///
/// Returns the file that was loaded, if any.
pub fn load_env_file(root: &Path) -> Option<PathBuf> {
    for name in ENV_FILES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        match dotenvy::from_path(&path) {
            Ok(()) => return Some(path),
            Err(e) => {
                log::warn!("ignoring env file {}: {}", path.display(), e);
                return None;
            }
        }
    }
    None
}

fn read_config_file(path: &Path) -> Result<AppConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: FromStr>(key: &str, expected: &str) -> Result<Option<T>> {
    match env_value(key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be {}", key, expected)),
        None => Ok(None),
    }
}

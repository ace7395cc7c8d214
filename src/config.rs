use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tasks::finetune::TrainerSettings;
use crate::tasks::{
    DEFAULT_BERT_FINETUNED_DIR, DEFAULT_BERT_JA_PRETRAINED_DIR, DEFAULT_BERT_PRETRAINED_DIR,
    DEFAULT_DATA_DIR, STSBENCHMARK_URL,
};
use crate::{flog_debug, Error, Result};

/// Default HTTP request timeout for dataset downloads.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub finetune: FinetuneConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PathsConfig {
    pub data_dir: Option<String>,
    pub bert_pretrained_dir: Option<String>,
    pub bert_ja_pretrained_dir: Option<String>,
    pub bert_finetuned_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DatasetConfig {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Overrides for the external training script invocation.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FinetuneConfig {
    pub python: Option<String>,
    pub script: Option<String>,
    pub task_name: Option<String>,
    pub init_checkpoint: Option<String>,
    pub max_seq_length: Option<u32>,
    pub train_batch_size: Option<u32>,
    pub learning_rate: Option<String>,
    pub num_train_epochs: Option<u32>,
}

impl Config {
    pub fn stsflow_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".stsflow"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::stsflow_dir()?.join("stsflow.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::config_path()?, false),
        };
        flog_debug!("Config::load path={} explicit={}", path.display(), explicit);
        if !explicit && !path.exists() {
            flog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config = Self::parse(&fs::read_to_string(&path)?)?;
        flog_debug!("Config loaded: {:?}", config);
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        flog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        resolve(&self.paths.data_dir, DEFAULT_DATA_DIR)
    }

    pub fn bert_pretrained_dir(&self) -> PathBuf {
        resolve(&self.paths.bert_pretrained_dir, DEFAULT_BERT_PRETRAINED_DIR)
    }

    pub fn bert_ja_pretrained_dir(&self) -> PathBuf {
        resolve(
            &self.paths.bert_ja_pretrained_dir,
            DEFAULT_BERT_JA_PRETRAINED_DIR,
        )
    }

    pub fn bert_finetuned_dir(&self) -> PathBuf {
        resolve(&self.paths.bert_finetuned_dir, DEFAULT_BERT_FINETUNED_DIR)
    }

    pub fn dataset_url(&self) -> &str {
        self.dataset.url.as_deref().unwrap_or(STSBENCHMARK_URL)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.dataset.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Trainer settings with config overrides applied over the defaults.
    pub fn trainer(&self) -> TrainerSettings {
        let defaults = TrainerSettings::default();
        let f = &self.finetune;
        TrainerSettings {
            python: f.python.clone().unwrap_or(defaults.python),
            script: f
                .script
                .as_deref()
                .map(expand_tilde)
                .unwrap_or(defaults.script),
            task_name: f.task_name.clone().unwrap_or(defaults.task_name),
            init_checkpoint: f
                .init_checkpoint
                .clone()
                .unwrap_or(defaults.init_checkpoint),
            max_seq_length: f.max_seq_length.unwrap_or(defaults.max_seq_length),
            train_batch_size: f.train_batch_size.unwrap_or(defaults.train_batch_size),
            learning_rate: f.learning_rate.clone().unwrap_or(defaults.learning_rate),
            num_train_epochs: f.num_train_epochs.unwrap_or(defaults.num_train_epochs),
        }
    }
}

fn resolve(value: &Option<String>, default: &str) -> PathBuf {
    match value {
        Some(dir) => expand_tilde(dir),
        None => PathBuf::from(default),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

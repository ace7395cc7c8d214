//! Task definitions for the STS fine-tuning pipeline.
//!
//! ```text
//! DownloadStsbenchmark ──> ExtractStsbenchmark ──┐
//!                                                ├──> FinetuneBertForSts
//!                        DownloadPretrainedBert ─┘
//! DownloadPretrainedBertJa (standalone)
//! ```

pub mod bert;
pub mod finetune;
pub mod stsbenchmark;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use bert::{DownloadPretrainedBert, DownloadPretrainedBertJa};
pub use finetune::{FinetuneBertForSts, TrainerSettings};
pub use stsbenchmark::{DownloadStsbenchmark, ExtractStsbenchmark};

use crate::config::Config;
use crate::core::Task;
use crate::Error;

pub const STSBENCHMARK_URL: &str = "http://ixa2.si.ehu.es/stswiki/images/4/48/Stsbenchmark.tar.gz";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_BERT_PRETRAINED_DIR: &str = "./model_pretrained/BERT";
pub const DEFAULT_BERT_JA_PRETRAINED_DIR: &str = "./model_pretrained/BERT_ja";
pub const DEFAULT_BERT_FINETUNED_DIR: &str = "./model_finetuned/BERT_STS";

/// Every task type the CLI can schedule as a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFamily {
    DownloadStsbenchmark,
    ExtractStsbenchmark,
    DownloadPretrainedBert,
    DownloadPretrainedBertJa,
    FinetuneBertForSts,
}

impl TaskFamily {
    pub const ALL: [TaskFamily; 5] = [
        TaskFamily::DownloadStsbenchmark,
        TaskFamily::ExtractStsbenchmark,
        TaskFamily::DownloadPretrainedBert,
        TaskFamily::DownloadPretrainedBertJa,
        TaskFamily::FinetuneBertForSts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TaskFamily::DownloadStsbenchmark => "DownloadStsbenchmark",
            TaskFamily::ExtractStsbenchmark => "ExtractStsbenchmark",
            TaskFamily::DownloadPretrainedBert => "DownloadPretrainedBert",
            TaskFamily::DownloadPretrainedBertJa => "DownloadPretrainedBertJa",
            TaskFamily::FinetuneBertForSts => "FinetuneBertForSts",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TaskFamily::DownloadStsbenchmark => "Download the STS benchmark archive",
            TaskFamily::ExtractStsbenchmark => "Extract train/dev/test splits as .tsv",
            TaskFamily::DownloadPretrainedBert => "Pretrained BERT checkpoint (not implemented)",
            TaskFamily::DownloadPretrainedBertJa => {
                "Pretrained Japanese BERT checkpoint (not implemented)"
            }
            TaskFamily::FinetuneBertForSts => "Run the STS-B training script",
        }
    }

    /// Families this one requires directly.
    pub fn requires(&self) -> &'static [TaskFamily] {
        match self {
            TaskFamily::ExtractStsbenchmark => &[TaskFamily::DownloadStsbenchmark],
            TaskFamily::FinetuneBertForSts => &[
                TaskFamily::ExtractStsbenchmark,
                TaskFamily::DownloadPretrainedBert,
            ],
            _ => &[],
        }
    }

    pub fn instantiate(&self, settings: &PipelineSettings) -> Box<dyn Task> {
        let s = settings;
        match self {
            TaskFamily::DownloadStsbenchmark => Box::new(DownloadStsbenchmark::new(
                s.data_dir.clone(),
                s.dataset_url.clone(),
            )),
            TaskFamily::ExtractStsbenchmark => Box::new(ExtractStsbenchmark::new(
                s.data_dir.clone(),
                s.dataset_url.clone(),
            )),
            TaskFamily::DownloadPretrainedBert => {
                Box::new(DownloadPretrainedBert::new(s.bert_pretrained_dir.clone()))
            }
            TaskFamily::DownloadPretrainedBertJa => Box::new(DownloadPretrainedBertJa::new(
                s.bert_ja_pretrained_dir.clone(),
            )),
            TaskFamily::FinetuneBertForSts => Box::new(FinetuneBertForSts {
                data_dir: s.data_dir.clone(),
                bert_pretrained_dir: s.bert_pretrained_dir.clone(),
                bert_finetuned_dir: s.bert_finetuned_dir.clone(),
                dataset_url: s.dataset_url.clone(),
                trainer: s.trainer.clone(),
            }),
        }
    }
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for TaskFamily {
    type Err = Error;

    /// Accepts `FinetuneBertForSts`, `finetune-bert-for-sts` or `finetune_bert_for_sts`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = fold(s);
        TaskFamily::ALL
            .into_iter()
            .find(|family| fold(family.name()) == wanted)
            .ok_or_else(|| Error::UnknownTask(s.to_string()))
    }
}

impl fmt::Display for TaskFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved parameters shared by all tasks of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub data_dir: PathBuf,
    pub bert_pretrained_dir: PathBuf,
    pub bert_ja_pretrained_dir: PathBuf,
    pub bert_finetuned_dir: PathBuf,
    pub dataset_url: String,
    pub trainer: TrainerSettings,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            data_dir: config.data_dir(),
            bert_pretrained_dir: config.bert_pretrained_dir(),
            bert_ja_pretrained_dir: config.bert_ja_pretrained_dir(),
            bert_finetuned_dir: config.bert_finetuned_dir(),
            dataset_url: config.dataset_url().to_string(),
            trainer: config.trainer(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

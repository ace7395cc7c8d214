//! Pretrained BERT checkpoints.
//!
//! Both downloads are placeholders: their targets describe the files a
//! finished download would leave behind, and `run` fails. Place the files by
//! hand to satisfy the targets.

use std::path::PathBuf;

use crate::core::{LocalFilesTarget, Target, Task};
use crate::pipeline::RunContext;
use crate::{flog_error, Error, Result};

pub const BERT_FILES: [&str; 5] = [
    "bert_model.ckpt.data-00000-of-00001",
    "bert_model.ckpt.index",
    "bert_model.ckpt.meta",
    "bert_config.json",
    "vocab.txt",
];

pub const BERT_JA_FILES: [&str; 6] = [
    "model.ckpt-1400000.data-00000-of-00001",
    "model.ckpt-1400000.index",
    "model.ckpt-1400000.meta",
    "wiki-ja.model",
    "wiki-ja.vocab",
    "graph.pbtxt",
];

fn not_implemented(task: &dyn Task) -> Error {
    let id = task.id();
    flog_error!("{} has no download implementation", id);
    Error::NotImplemented(id.to_string())
}

#[derive(Debug, Clone)]
pub struct DownloadPretrainedBert {
    pub bert_pretrained_dir: PathBuf,
}

impl DownloadPretrainedBert {
    pub fn new(bert_pretrained_dir: impl Into<PathBuf>) -> Self {
        Self {
            bert_pretrained_dir: bert_pretrained_dir.into(),
        }
    }
}

impl Task for DownloadPretrainedBert {
    fn family(&self) -> &'static str {
        "DownloadPretrainedBert"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![(
            "bert_pretrained_dir",
            self.bert_pretrained_dir.display().to_string(),
        )]
    }

    fn output(&self) -> Box<dyn Target> {
        Box::new(LocalFilesTarget::in_dir(&self.bert_pretrained_dir, &BERT_FILES))
    }

    fn run(&self, _ctx: &RunContext) -> Result<()> {
        Err(not_implemented(self))
    }
}

/// Japanese Wikipedia BERT with a sentencepiece vocabulary.
#[derive(Debug, Clone)]
pub struct DownloadPretrainedBertJa {
    pub bert_pretrained_dir: PathBuf,
}

impl DownloadPretrainedBertJa {
    pub fn new(bert_pretrained_dir: impl Into<PathBuf>) -> Self {
        Self {
            bert_pretrained_dir: bert_pretrained_dir.into(),
        }
    }
}

impl Task for DownloadPretrainedBertJa {
    fn family(&self) -> &'static str {
        "DownloadPretrainedBertJa"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![(
            "bert_pretrained_dir",
            self.bert_pretrained_dir.display().to_string(),
        )]
    }

    fn output(&self) -> Box<dyn Target> {
        Box::new(LocalFilesTarget::in_dir(
            &self.bert_pretrained_dir,
            &BERT_JA_FILES,
        ))
    }

    fn run(&self, _ctx: &RunContext) -> Result<()> {
        Err(not_implemented(self))
    }
}

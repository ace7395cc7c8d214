//! Fine-tune/evaluate BERT on STS-B by shelling out to the training script.

use std::path::{Component, Path, PathBuf};
use std::process::Command;

use crate::core::{LocalFileTarget, Target, Task};
use crate::pipeline::RunContext;
use crate::tasks::bert::DownloadPretrainedBert;
use crate::tasks::stsbenchmark::ExtractStsbenchmark;
use crate::{flog, flog_debug, flog_error, Error, Result};

pub const EVAL_RESULTS: &str = "eval_results.txt";

/// How the external training script is invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerSettings {
    pub python: String,
    pub script: PathBuf,
    pub task_name: String,
    /// Checkpoint file name, resolved inside the fine-tuned model directory.
    pub init_checkpoint: String,
    pub max_seq_length: u32,
    pub train_batch_size: u32,
    /// Passed through verbatim, e.g. `2e-5`.
    pub learning_rate: String,
    pub num_train_epochs: u32,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            script: PathBuf::from("./run_reg.py"),
            task_name: "sts-b".to_string(),
            init_checkpoint: "model.ckpt-28745".to_string(),
            max_seq_length: 512,
            train_batch_size: 2,
            learning_rate: "2e-5".to_string(),
            num_train_epochs: 10,
        }
    }
}

/// Drop `.` components so `./data` renders as `data`.
fn normalize(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

#[derive(Debug, Clone)]
pub struct FinetuneBertForSts {
    pub data_dir: PathBuf,
    pub bert_pretrained_dir: PathBuf,
    pub bert_finetuned_dir: PathBuf,
    pub dataset_url: String,
    pub trainer: TrainerSettings,
}

impl FinetuneBertForSts {
    /// Script arguments, without the interpreter.
    ///
    /// `--init_checkpoint` points into the fine-tuned directory: the run
    /// evaluates an already fine-tuned model.
    pub fn script_args(&self) -> Vec<String> {
        let t = &self.trainer;
        let data_dir = normalize(&self.data_dir);
        let pretrained = normalize(&self.bert_pretrained_dir);
        let finetuned = normalize(&self.bert_finetuned_dir);
        vec![
            t.script.display().to_string(),
            format!("--task_name={}", t.task_name),
            "--do_train=false".to_string(),
            "--do_eval=true".to_string(),
            format!("--data_dir={}", data_dir.display()),
            format!("--vocab_file={}", pretrained.join("vocab.txt").display()),
            format!(
                "--bert_config_file={}",
                pretrained.join("bert_config.json").display()
            ),
            format!(
                "--init_checkpoint={}",
                finetuned.join(&t.init_checkpoint).display()
            ),
            format!("--max_seq_length={}", t.max_seq_length),
            format!("--train_batch_size={}", t.train_batch_size),
            format!("--learning_rate={}", t.learning_rate),
            format!("--num_train_epochs={}", t.num_train_epochs),
            format!("--output_dir={}", finetuned.display()),
        ]
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.trainer.python.clone())
            .chain(self.script_args())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Task for FinetuneBertForSts {
    fn family(&self) -> &'static str {
        "FinetuneBertForSts"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("data_dir", self.data_dir.display().to_string()),
            (
                "bert_pretrained_dir",
                self.bert_pretrained_dir.display().to_string(),
            ),
            (
                "bert_finetuned_dir",
                self.bert_finetuned_dir.display().to_string(),
            ),
        ]
    }

    fn requires(&self) -> Vec<Box<dyn Task>> {
        vec![
            Box::new(ExtractStsbenchmark::new(
                self.data_dir.clone(),
                self.dataset_url.clone(),
            )),
            Box::new(DownloadPretrainedBert::new(self.bert_pretrained_dir.clone())),
        ]
    }

    fn output(&self) -> Box<dyn Target> {
        Box::new(LocalFileTarget::new(
            self.bert_finetuned_dir.join(EVAL_RESULTS),
        ))
    }

    fn run(&self, _ctx: &RunContext) -> Result<()> {
        let python = &self.trainer.python;
        let interpreter =
            which::which(python).map_err(|_| Error::InterpreterNotFound(python.clone()))?;
        flog_debug!("Resolved interpreter {} -> {}", python, interpreter.display());

        let command = self.command_line();
        flog!("Running {}", command);
        let status = Command::new(&interpreter).args(self.script_args()).status()?;

        if !status.success() {
            flog_error!("Training script failed: {}", status);
            return Err(Error::CommandFailed {
                command,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use stsflow::config::Config;
use stsflow::fetch::Downloader;
use stsflow::pipeline::{RunContext, Scheduler, SchedulerEvent};
use stsflow::tasks::{PipelineSettings, TaskFamily};
use stsflow::{flog, flog_debug, flog_error, Error, Result};

/// stsflow - STS benchmark / BERT fine-tuning pipeline
#[derive(Parser, Debug)]
#[command(name = "stsflow")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    STSFLOW_DEBUG=1     Enable debug logging (alternative to --debug)"
)]
pub struct Cli {
    /// Config file (default: ~/.stsflow/stsflow.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (writes to ~/.stsflow/stsflow.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a task and everything it requires that is not yet complete
    Run {
        /// Task family, e.g. FinetuneBertForSts or finetune-bert-for-sts
        task: String,

        #[command(flatten)]
        dirs: DirArgs,

        /// Print the execution summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which tasks of a graph are complete, without running anything
    Status {
        /// Task family to inspect
        task: String,

        #[command(flatten)]
        dirs: DirArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// List task families and their requirements
    List,
}

/// Directory parameters shared by every task family.
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct DirArgs {
    /// Dataset directory [default: ./data]
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Pretrained checkpoint directory [default: ./model_pretrained/BERT]
    #[arg(long)]
    pub bert_pretrained_dir: Option<PathBuf>,

    /// Fine-tuned model directory [default: ./model_finetuned/BERT_STS]
    #[arg(long)]
    pub bert_finetuned_dir: Option<PathBuf>,
}

impl DirArgs {
    /// Apply CLI overrides on top of config-derived settings.
    ///
    /// `--bert-pretrained-dir` targets the Japanese checkpoint directory when
    /// the root task is `DownloadPretrainedBertJa`.
    fn apply(&self, family: TaskFamily, settings: &mut PipelineSettings) {
        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(dir) = &self.bert_pretrained_dir {
            if family == TaskFamily::DownloadPretrainedBertJa {
                settings.bert_ja_pretrained_dir = dir.clone();
            } else {
                settings.bert_pretrained_dir = dir.clone();
            }
        }
        if let Some(dir) = &self.bert_finetuned_dir {
            settings.bert_finetuned_dir = dir.clone();
        }
    }
}

fn main() {
    let cli = Cli::parse();

    stsflow::log::init_with_debug(cli.debug);
    flog_debug!("CLI: {:?}", cli);

    if let Err(e) = dispatch(cli) {
        flog_error!("{}", e);
        eprintln!("Error: {}", e);
        if let Some(path) = stsflow::log::log_path() {
            eprintln!("See {} for details", path.display());
        }
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run { task, dirs, json } => run_task(&config, &task, &dirs, json),
        Command::Status { task, dirs, json } => run_status(&config, &task, &dirs, json),
        Command::List => run_list(),
    }
}

fn resolve(config: &Config, task: &str, dirs: &DirArgs) -> Result<(TaskFamily, PipelineSettings)> {
    let family: TaskFamily = task.parse()?;
    let mut settings = PipelineSettings::from_config(config);
    dirs.apply(family, &mut settings);
    flog_debug!("Resolved {} with {:?}", family, settings);
    Ok((family, settings))
}

fn run_task(config: &Config, task: &str, dirs: &DirArgs, json: bool) -> Result<()> {
    let (family, settings) = resolve(config, task, dirs)?;
    flog!("Run command: task={}", family);

    let ctx = RunContext::new(Downloader::new(config.download_timeout())?);
    let mut scheduler = Scheduler::new(ctx);
    if !json {
        scheduler = scheduler.with_observer(print_event);
    }

    let summary = scheduler.run(family.instantiate(&settings))?;

    if json {
        println!("{}", summary.to_json()?);
    } else {
        println!();
        println!("{}", summary.render());
    }

    if summary.is_success() {
        Ok(())
    } else {
        Err(Error::RunFailed {
            failed: summary.failed().len(),
        })
    }
}

fn print_event(event: &SchedulerEvent) {
    match event {
        SchedulerEvent::AlreadyDone { task_id } => println!("✓ {} (already complete)", task_id),
        SchedulerEvent::TaskStarted { task_id } => println!("→ {}", task_id),
        SchedulerEvent::TaskCompleted { task_id } => println!("✓ {}", task_id),
        SchedulerEvent::TaskFailed { task_id, error } => println!("✗ {}: {}", task_id, error),
        SchedulerEvent::Halted { remaining } => {
            println!("Run halted, {} task(s) not run", remaining)
        }
    }
}

fn run_status(config: &Config, task: &str, dirs: &DirArgs, json: bool) -> Result<()> {
    let (family, settings) = resolve(config, task, dirs)?;
    flog!("Status command: task={}", family);

    let plan = Scheduler::plan(family.instantiate(&settings))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }
    let pending = plan.iter().filter(|entry| !entry.complete).count();

    println!("Task graph for {}:", family);
    for entry in &plan {
        let mark = if entry.complete { "✓" } else { "○" };
        println!("  {} {}", mark, entry.id);
        for path in &entry.missing {
            println!("      missing: {}", path.display());
        }
    }
    println!();
    if pending == 0 {
        println!("Nothing to do.");
    } else {
        println!("{} task(s) would run.", pending);
    }
    Ok(())
}

fn run_list() -> Result<()> {
    for family in TaskFamily::ALL {
        let requires: Vec<&str> = family.requires().iter().map(|f| f.name()).collect();
        println!("{:<26} {}", family.name(), family.description());
        if !requires.is_empty() {
            println!("{:<26} requires: {}", "", requires.join(", "));
        }
    }
    Ok(())
}

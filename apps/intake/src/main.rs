mod action;
mod api;
mod config;
mod errors;
mod field;
mod models;
mod poll;
mod transport;
mod upload;
mod views;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::{ActionPhase, ActionStateMachine};
use crate::api::ApiClient;
use crate::config::Config;
use crate::models::{CandidateId, Channel, HealthStatus};
use crate::transport::{FileSource, HttpTransport, ProgressFn};
use crate::upload::{DocumentSubmissionRequest, UploadDecodePolicy};
use crate::views::{DashboardView, DetailView, UploadView};

/// Resume intake console: watch candidates, upload resumes, collect PAN/Aadhaar.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Backend origin, e.g. http://localhost:8000 (overrides INTAKE_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Fail uploads whose success response is not a JSON object
    #[arg(long, global = true)]
    strict_decode: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the candidate list until Ctrl-C
    Dashboard {
        /// Poll interval in milliseconds (overrides INTAKE_POLL_INTERVAL_MS)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Upload a resume (PDF or DOCX)
    Upload { file: PathBuf },
    /// Show one candidate's extracted profile
    Show { id: i64 },
    /// Ask the candidate for identity documents
    RequestDocs {
        id: i64,
        #[arg(long, value_enum, default_value_t = Channel::Email)]
        channel: Channel,
    },
    /// Submit PAN and/or Aadhaar on the candidate's behalf
    SubmitDocs {
        id: i64,
        #[arg(long)]
        pan_file: Option<PathBuf>,
        #[arg(long)]
        aadhaar_file: Option<PathBuf>,
        #[arg(long)]
        pan_number: Option<String>,
        #[arg(long)]
        aadhaar_number: Option<String>,
    },
    /// Check that the backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?.with_api_base(cli.api_base.clone());

    // stdout is reserved for the rendered views
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("intake v{} -> {}", env!("CARGO_PKG_VERSION"), config.api_base);

    if let Command::Dashboard { interval_ms } = &cli.command {
        config = config.with_poll_interval_ms(*interval_ms)?;
    }

    let policy = if cli.strict_decode {
        UploadDecodePolicy::Strict
    } else {
        UploadDecodePolicy::EmptyOnInvalidBody
    };
    let transport = HttpTransport::new(config.api_base.clone(), config.request_timeout)?;
    let api = ApiClient::new(Arc::new(transport)).with_upload_policy(policy);

    let phase = match cli.command {
        Command::Dashboard { .. } => {
            run_dashboard(api, config.poll_interval).await?;
            ActionPhase::Succeeded
        }
        Command::Upload { file } => run_upload(api, file).await?,
        Command::Show { id } => {
            let mut view = DetailView::new(api, CandidateId(id));
            view.load().await;
            print!("{}", view.render());
            if view.error().is_some() {
                ActionPhase::Failed
            } else {
                ActionPhase::Succeeded
            }
        }
        Command::RequestDocs { id, channel } => {
            let mut view = DetailView::new(api, CandidateId(id));
            let phase = view.request_documents(channel).await;
            report(view.request_action());
            phase
        }
        Command::SubmitDocs {
            id,
            pan_file,
            aadhaar_file,
            pan_number,
            aadhaar_number,
        } => {
            let request = DocumentSubmissionRequest {
                pan_file: pan_file.map(FileSource::from),
                aadhaar_file: aadhaar_file.map(FileSource::from),
                pan_number,
                aadhaar_number,
            };
            let bar = percent_bar()?;
            let mut view = DetailView::new(api, CandidateId(id));
            let phase = view.submit_documents(request, Some(bar_sink(&bar))).await;
            bar.finish_and_clear();
            report(view.submit_action());
            if phase == ActionPhase::Succeeded {
                print!("{}", view.render());
            }
            phase
        }
        Command::Health => {
            let mut check = ActionStateMachine::new("health");
            check
                .run("Checking…", api.health(), |health: &HealthStatus| {
                    format!("Backend status: {}", health.status)
                })
                .await;
            report(&check);
            check.phase()
        }
    };

    Ok(match phase {
        ActionPhase::Failed => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

async fn run_dashboard(api: ApiClient, interval: Duration) -> Result<()> {
    info!("polling candidates every {:?}", interval);
    let mut view = DashboardView::mount(api, interval);
    loop {
        tokio::select! {
            changed = view.changed() => {
                if !changed {
                    break;
                }
                print!("\x1b[2J\x1b[H{}", view.render());
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("stopping dashboard");
                break;
            }
        }
    }
    view.unmount();
    Ok(())
}

async fn run_upload(api: ApiClient, file: PathBuf) -> Result<ActionPhase> {
    let bar = percent_bar()?;
    let mut view = UploadView::new(api);
    let phase = view.upload(file, Some(bar_sink(&bar))).await;
    bar.finish_and_clear();
    match phase {
        ActionPhase::Failed => report(view.action()),
        _ => print!("{}", view.render()),
    }
    if let Some(uploaded) = view.last_upload() {
        println!("Follow along with: intake show {}", uploaded.candidate_id);
    }
    Ok(phase)
}

fn percent_bar() -> Result<ProgressBar> {
    let bar = ProgressBar::new(100);
    bar.set_style(ProgressStyle::with_template("{bar:30} {pos:>3}%")?.progress_chars("#>-"));
    Ok(bar)
}

fn bar_sink(bar: &ProgressBar) -> ProgressFn {
    let bar = bar.clone();
    Arc::new(move |percent: u8| bar.set_position(u64::from(percent)))
}

fn report(action: &ActionStateMachine) {
    let state = action.state();
    match state.phase {
        ActionPhase::Failed => eprintln!("{}", state.message),
        _ => println!("{}", state.message),
    }
}

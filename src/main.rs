mod client;
mod config;
mod error;
mod models;
mod normalize;
mod render;
mod request;
mod score;
mod session;
mod status;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client::ApiClient;
use crossterm::{
    cursor,
    style::Print,
    terminal::{self, ClearType},
    ExecutableCommand,
};
use config::Config;
use request::SearchForm;
use session::Session;
use status::StatusReport;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Recruiting console - search job boards, parse resumes, rank candidates")]
struct Cli {
    /// Backend API base URL (overrides SCOUT_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search job boards for candidates
    Search {
        /// Job title to search for
        #[arg(short, long, default_value = "")]
        title: String,

        /// Location filter
        #[arg(short, long, default_value = "")]
        location: String,

        /// Comma-separated keywords
        #[arg(short, long, default_value = "")]
        keywords: String,

        /// Job description; enables AI ranking when present
        #[arg(short, long, default_value = "")]
        description: String,

        /// Comma-separated required skills
        #[arg(short, long, default_value = "")]
        skills: String,

        /// Minimum years of experience
        #[arg(long, default_value = "")]
        min_years: String,

        /// Skip LinkedIn
        #[arg(long)]
        no_linkedin: bool,

        /// Skip Indeed
        #[arg(long)]
        no_indeed: bool,

        /// LinkedIn login email
        #[arg(long, default_value = "")]
        linkedin_email: String,

        /// LinkedIn login password
        #[arg(long, default_value = "")]
        linkedin_password: String,
    },

    /// Upload resumes and parse them into candidates
    Upload {
        /// Resume files (PDF, DOCX, TXT)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Manage uploaded resumes
    Resumes {
        #[command(subcommand)]
        command: ResumeCommands,
    },

    /// Show agent status
    Status {
        /// Keep refreshing every N seconds until Ctrl-C
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show the last search or parse result
    Show,
}

#[derive(Subcommand)]
enum ResumeCommands {
    /// List uploaded resumes
    List,

    /// Delete an uploaded resume
    Delete {
        /// File name as shown by `resumes list`
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn print_uploaded(client: &ApiClient) -> Result<()> {
    let files = client.list_resumes().await?;
    println!("Uploaded resumes:");
    print!("{}", render::render_uploaded(&files));
    Ok(())
}

fn selection_sizes(files: &[PathBuf]) -> Vec<(String, u64)> {
    files
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            (name, size)
        })
        .collect()
}

fn redraw<W: Write>(out: &mut W, report: &StatusReport) -> io::Result<()> {
    out.execute(terminal::Clear(ClearType::All))?
        .execute(cursor::MoveTo(0, 0))?
        .execute(Print(render::render_status(report)))?;
    Ok(())
}

/// Single-shot status: the report is always printed, a failed poll fails the command.
fn check_status(report: &StatusReport) -> Result<()> {
    if report.is_failed() {
        bail!("Failed to load agent status");
    }
    Ok(())
}

async fn watch_status(client: &ApiClient, every: Duration) {
    let watcher = status::watch(client, every, |report: &StatusReport| {
        if let Err(e) = redraw(&mut io::stdout(), report) {
            warn!("Failed to redraw agent status: {}", e);
            return false;
        }
        true
    });
    tokio::select! {
        _ = watcher => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(base) = &cli.api_base {
        config = config.with_api_base(base)?;
    }
    let store = config.current_result_path();
    let client = ApiClient::new(config.api_base.clone());
    let mut session = Session::new(client, config.shortlist_size).with_store(store.clone());

    match cli.command {
        Commands::Search {
            title,
            location,
            keywords,
            description,
            skills,
            min_years,
            no_linkedin,
            no_indeed,
            linkedin_email,
            linkedin_password,
        } => {
            let form = SearchForm {
                job_title: title,
                location,
                keywords,
                job_description: description,
                required_skills: skills,
                min_experience: min_years,
                search_linkedin: !no_linkedin,
                search_indeed: !no_indeed,
                linkedin_email,
                linkedin_password,
            };
            let result = session.search(&form).await.context("Search failed")?;
            print!("{}", render::render_result(result));
        }

        Commands::Upload { files } => {
            println!("Selected files:");
            print!("{}", render::render_selection(&selection_sizes(&files)));

            let result = session.upload(&files).await.context("Upload failed")?;
            print!("{}", render::render_result(result));

            if let Err(e) = print_uploaded(session.client()).await {
                warn!("Failed to refresh uploaded resumes: {:#}", e);
            }
        }

        Commands::Resumes { command } => match command {
            ResumeCommands::List => {
                print_uploaded(session.client())
                    .await
                    .context("Failed to list uploaded resumes")?;
            }
            ResumeCommands::Delete { name, yes } => {
                if !yes && !confirm(&format!("Delete {}?", name))? {
                    println!("Cancelled.");
                    return Ok(());
                }
                session
                    .client()
                    .delete_resume(&name)
                    .await
                    .with_context(|| format!("Failed to delete {}", name))?;
                println!("Deleted {}", name);
                if let Err(e) = print_uploaded(session.client()).await {
                    warn!("Failed to refresh uploaded resumes: {:#}", e);
                }
            }
        },

        Commands::Status { interval } => match interval {
            Some(secs) => watch_status(session.client(), Duration::from_secs(secs.max(1))).await,
            None => {
                let report = status::poll(session.client()).await;
                print!("{}", render::render_status(&report));
                check_status(&report)?;
            }
        },

        Commands::Show => {
            session
                .restore()
                .with_context(|| format!("Failed to read {}", store.display()))?;
            match session.current() {
                Some(result) => print!("{}", render::render_result(result)),
                None => println!("No saved result yet. Run `scout search` or `scout upload` first."),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_redraw_clears_then_prints_report() {
        let mut out: Vec<u8> = Vec::new();
        redraw(&mut out, &StatusReport::Loaded(BTreeMap::new())).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b[2J"));
        assert!(text.ends_with("No agents reported\n"));
    }

    #[test]
    fn test_check_status_fails_only_on_failed_poll() {
        assert!(check_status(&StatusReport::Loaded(BTreeMap::new())).is_ok());
        let err = check_status(&StatusReport::Failed("HTTP error! status: 500".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load agent status"));
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flow_client::{ApiClient, FocusSession};
use flow_core::focus::format_mmss;
use flow_core::{
    CoachPersonality, EnergyTracking, FlowConfig, FocusPhase, PreferencesPatch, ScheduleEvent,
    DEFAULT_USER,
};
use flow_gateway::GatewayServer;
use flow_memory::{LocalMemory, PreferenceStore, WorkspaceStore};
use flow_reasoning::providers::build_client;
use flow_reasoning::{CompletionParams, Planner};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flow", author, version, about = "Flow: a personal scheduling assistant")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "FLOW_CONFIG", default_value = "flow.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Plan a schedule in-process against the local data directory
    Plan {
        #[arg(short, long, default_value = DEFAULT_USER)]
        user: String,
        /// Print the whole planning state as JSON
        #[arg(long)]
        json: bool,
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Ask for a schedule through the API adapter (mock data without FLOW_API_URL)
    Schedule {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Send a chat command through the API adapter
    Chat {
        #[arg(required = true)]
        command: Vec<String>,
    },
    /// Run the focus countdown for a number of work sessions
    Focus {
        #[arg(long, default_value_t = 1)]
        sessions: u32,
    },
    /// Show or change the locally stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    Show,
    Set {
        #[arg(long)]
        work_minutes: Option<u32>,
        #[arg(long)]
        break_minutes: Option<u32>,
        /// friendly, professional or minimal
        #[arg(long)]
        coach: Option<CoachPersonality>,
        #[arg(long)]
        auto_scheduling: Option<bool>,
        /// manual or auto
        #[arg(long)]
        energy_tracking: Option<EnergyTracking>,
        /// HH:MM
        #[arg(long)]
        study_time: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = FlowConfig::load_or_default(&args.config);

    match args.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Plan { user, json, query } => plan(&config, &user, &query.join(" "), json).await,
        Command::Schedule { query } => {
            let client = api_client(&config).await?;
            let schedule = client.get_schedule(&query.join(" ")).await;
            print_schedule(&schedule);
            Ok(())
        }
        Command::Chat { command } => {
            let client = api_client(&config).await?;
            println!("{}", client.send_chat_command(&command.join(" ")).await);
            Ok(())
        }
        Command::Focus { sessions } => focus(&config, sessions).await,
        Command::Prefs { action } => prefs(&config, action).await,
    }
}

async fn build_planner(config: &FlowConfig) -> Result<Planner> {
    let storage = &config.storage;
    tokio::fs::create_dir_all(&storage.data_dir)
        .await
        .with_context(|| format!("Failed to create data dir {}", storage.data_dir.display()))?;

    let llm = build_client(&config.llm)?;
    let memory = Arc::new(LocalMemory::open(storage.memory_path()).await);
    let workspace = Arc::new(
        WorkspaceStore::open(storage.workspace_path(), storage.seed_sample_data).await,
    );
    Ok(Planner::new(llm, memory, workspace)
        .with_params(CompletionParams::from(&config.llm))
        .with_context_items(storage.context_items))
}

async fn preference_store(config: &FlowConfig) -> Result<PreferenceStore> {
    PreferenceStore::open_file(config.storage.preferences_path()).await
}

async fn api_client(config: &FlowConfig) -> Result<ApiClient> {
    ApiClient::from_config(&config.client, preference_store(config).await?)
}

async fn serve(mut config: FlowConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    info!(
        "Starting Flow with LLM provider '{}' and data dir {}",
        config.llm.provider,
        config.storage.data_dir.display()
    );
    let planner = Arc::new(build_planner(&config).await?);
    let server = GatewayServer::new(planner, &config.server);
    server
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}

async fn plan(config: &FlowConfig, user: &str, query: &str, json: bool) -> Result<()> {
    let planner = build_planner(config).await?;
    let prefs = preference_store(config).await?.get().await;
    if let Err(e) = planner.workspace().set_preferences(user, prefs).await {
        tracing::warn!("Planning with stored preferences instead of local ones: {:#}", e);
    }
    let state = planner.get_schedule(user, query).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    print_schedule(&state.schedule);
    for message in &state.coach_messages {
        println!("\nCoach: {message}");
    }
    for concern in &state.concerns {
        println!("  ! {concern}");
    }
    for conflict in &state.conflicts {
        println!(
            "  conflict: {} overlaps {} by {} min",
            conflict.event, conflict.conflicts_with, conflict.overlap_minutes
        );
    }
    for err in &state.errors {
        tracing::warn!("{} failed: {}", err.agent, err.error);
    }
    Ok(())
}

fn print_schedule(schedule: &[ScheduleEvent]) {
    if schedule.is_empty() {
        println!("Nothing scheduled.");
        return;
    }
    let mut day = None;
    for event in schedule {
        let date = event.start.date();
        if day != Some(date) {
            println!("{}", date.format("%A %Y-%m-%d"));
            day = Some(date);
        }
        let category = if event.category.is_empty() {
            String::new()
        } else {
            format!(" [{}]", event.category)
        };
        println!(
            "  {}-{}  {}{}",
            event.start.format("%H:%M"),
            event.end.format("%H:%M"),
            event.title,
            category
        );
    }
}

async fn focus(config: &FlowConfig, sessions: u32) -> Result<()> {
    let prefs = preference_store(config).await?.get().await;
    let session = FocusSession::spawn(&prefs)?;
    let mut rx = session.subscribe();
    session.start().await;
    println!(
        "{} ({})",
        FocusPhase::Work.headline(),
        format_mmss(session.snapshot().remaining_secs)
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = *rx.borrow_and_update();
                if snap.running {
                    eprint!("\r{}", format_mmss(snap.remaining_secs));
                    continue;
                }
                eprintln!();
                if snap.phase == FocusPhase::Break && snap.completed_work_sessions >= sessions {
                    println!("Completed {} focus session(s).", snap.completed_work_sessions);
                    break;
                }
                println!("{} ({})", snap.phase.headline(), format_mmss(snap.remaining_secs));
                session.start().await;
            }
        }
    }
    session.stop();
    Ok(())
}

async fn prefs(config: &FlowConfig, action: PrefsAction) -> Result<()> {
    let client = api_client(config).await?;
    let prefs = match action {
        PrefsAction::Show => client.preferences().await,
        PrefsAction::Set {
            work_minutes,
            break_minutes,
            coach,
            auto_scheduling,
            energy_tracking,
            study_time,
        } => {
            client
                .update_preferences(PreferencesPatch {
                    work_minutes,
                    break_minutes,
                    coach_personality: coach,
                    auto_scheduling,
                    energy_tracking,
                    preferred_study_time: study_time,
                })
                .await?
        }
    };
    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}

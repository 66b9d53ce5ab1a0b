//! Tooldesk console
//!
//! Command-line front end for the inventory backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tooldesk::{
    client::Tokens,
    config::{AppConfig, LoggingConfig},
    models::{
        accessory::UpdateAccessory, sub_tool::SubTool, tool::ToolFilter, AssetKey, AssetKind,
        AssetSnapshot, Condition, DeviceStatus, PermissionSet, ResolvedRef,
    },
    repository::Repository,
    services::{
        accessories::load_image,
        notify::TracingNotifier,
        positions::checklist,
        transfer::WorkflowKind,
        Services,
    },
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "tooldesk")]
#[command(version)]
#[command(about = "Asset inventory administration console")]
struct Cli {
    /// Position whose permissions gate restore / permanent delete
    #[arg(long, global = true, env = "TOOLDESK_POSITION")]
    position: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the stored session
    #[command(subcommand)]
    Session(SessionCommand),
    /// List tools
    Tools {
        #[arg(long)]
        status: Option<DeviceStatus>,
        #[arg(long)]
        assigned_to: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the Tool → SubTool → Accessory hierarchy
    Tree,
    /// Employee picker options
    Employees {
        #[arg(long)]
        search: Option<String>,
    },
    /// Assign an unassigned asset to an employee
    Assign {
        kind: AssetKind,
        id: String,
        #[arg(long)]
        employee: String,
        #[arg(long, default_value = "Mới")]
        condition: Condition,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Move a SubTool or Accessory to another employee's device
    Transfer {
        kind: AssetKind,
        id: String,
        #[arg(long)]
        employee: String,
        /// Destination Tool (for a SubTool) or SubTool (for an Accessory)
        #[arg(long)]
        to: Option<String>,
        #[arg(long, default_value = "Mới")]
        condition: Condition,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Take an asset back from its holder
    Revoke {
        kind: AssetKind,
        id: String,
        #[arg(long, default_value = "Mới")]
        condition: Condition,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Browse and recover soft-deleted items
    #[command(subcommand)]
    Deleted(DeletedCommand),
    /// Attach images to an accessory
    AddImages {
        accessory_id: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show the permission checklist of a position
    Permissions { position_id: String },
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Store tokens issued by the backend
    Set {
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        refresh_token: String,
    },
    Status,
    Logout,
}

#[derive(Subcommand, Debug)]
enum DeletedCommand {
    List,
    /// Deleted descendants of a deleted Tool
    Show { tool_id: String },
    Restore { kind: AssetKind, id: String },
    /// Irreversible; asks for confirmation unless --yes is given
    Purge {
        kind: AssetKind,
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    let _guard = init_tracing(&config.logging);

    tracing::debug!("Tooldesk v{} against {}", env!("CARGO_PKG_VERSION"), config.api.base_url);

    let state = AppState::build(config, Arc::new(TracingNotifier))?;
    run(cli, state).await
}

/// Initialize tracing from the logging section. The returned guard must live
/// as long as the program when a log file is configured.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("tooldesk={}", logging.level).into());

    let (json, pretty) = if logging.format == "json" {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().with_writer(std::io::stderr)))
    };

    let (file, guard) = match &logging.file {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tooldesk.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .with(file)
        .init();

    guard
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    let services = state.services.clone();
    let repo = &services.repository;

    match cli.command {
        Command::Session(cmd) => match cmd {
            SessionCommand::Set {
                access_token,
                refresh_token,
            } => {
                state.session.set_tokens(Tokens {
                    access_token: Some(access_token),
                    refresh_token: Some(refresh_token),
                })?;
                println!("Session stored");
            }
            SessionCommand::Status => {
                println!(
                    "{} ({:?})",
                    if state.session.is_authenticated() {
                        "Authenticated"
                    } else {
                        "Not authenticated"
                    },
                    state.session.current_event()
                );
            }
            SessionCommand::Logout => {
                state.session.logout()?;
                println!("Logged out");
            }
        },

        Command::Tools {
            status,
            assigned_to,
            search,
        } => {
            let listing = services.tools(ToolFilter {
                status,
                assigned_to,
                search,
                ..Default::default()
            });
            listing.fetch().await?;
            for tool in listing.data().unwrap_or_default() {
                let holder = tooldesk::models::resolve_ref(tool.assigned_to.as_ref())
                    .map(|r| r.label)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<26} {:<12} {:<16} {:<30} {}",
                    tool.id,
                    tool.code,
                    tool.status.map(|s| s.label()).unwrap_or("-"),
                    tool.name,
                    holder
                );
            }
        }

        Command::Tree => {
            let tree = services.asset_tree().await?;
            for node in &tree.tools {
                println!("{} {}", node.tool.code, node.tool.name);
                for sub in &node.sub_tools {
                    print_sub_tool(&sub.sub_tool, "  ");
                    for acc in &sub.accessories {
                        println!("      · {} {}", acc.code, acc.name);
                    }
                }
            }
            if !tree.detached_sub_tools.is_empty() || !tree.detached_accessories.is_empty() {
                println!(
                    "({} sub-tools and {} accessories outside the listing)",
                    tree.detached_sub_tools.len(),
                    tree.detached_accessories.len()
                );
            }
            for stale in tree.stale_accessories() {
                println!(
                    "warning: accessory {} on {} records parent {:?}, expected {:?}",
                    stale.accessory_id, stale.sub_tool_id, stale.recorded_parent, stale.actual_parent
                );
            }
        }

        Command::Employees { search } => {
            for option in services.employees.options(search.as_deref()).await {
                println!("{:<26} {}", option.id, option.label);
            }
        }

        Command::Assign {
            kind,
            id,
            employee,
            condition,
            notes,
        } => {
            let mut workflow = services.transfer_workflow(None);
            workflow.begin(WorkflowKind::Assign, snapshot(repo, kind, &id).await?)?;
            workflow.select_employee(employee_ref(&services, &employee).await?).await?;
            workflow.set_condition(condition);
            workflow.set_notes(notes.unwrap_or_default());
            println!("{}", workflow.submit().await?.message);
        }

        Command::Transfer {
            kind,
            id,
            employee,
            to,
            condition,
            notes,
        } => {
            let mut workflow = services.transfer_workflow(None);
            workflow.begin(WorkflowKind::Transfer, snapshot(repo, kind, &id).await?)?;
            workflow.select_employee(employee_ref(&services, &employee).await?).await?;
            if let Some(message) = workflow.blocking_message() {
                bail!("{}", message);
            }
            let Some(to) = to else {
                println!("Possible destinations:");
                for candidate in workflow.candidates() {
                    println!("  {:<26} {}", candidate.id, candidate.label);
                }
                return Ok(());
            };
            workflow.select_destination(&to)?;
            if let Some(preview) = workflow.preview() {
                println!("{}", preview);
            }
            workflow.set_condition(condition);
            workflow.set_notes(notes.unwrap_or_default());
            let outcome = workflow.submit().await?;
            println!("{}", outcome.message);
            if let Some(count) = outcome.cascade_count {
                println!("{} accessories followed the sub-tool", count);
            }
        }

        Command::Revoke {
            kind,
            id,
            condition,
            notes,
        } => {
            let mut workflow = services.transfer_workflow(None);
            workflow.begin(WorkflowKind::Revoke, snapshot(repo, kind, &id).await?)?;
            workflow.set_condition(condition);
            workflow.set_notes(notes.unwrap_or_default());
            println!("{}", workflow.submit().await?.message);
        }

        Command::Deleted(cmd) => {
            let permissions = permissions(&services, cli.position.as_deref()).await?;
            let mut browser = services.recovery_browser(permissions);
            browser.load().await?;
            match cmd {
                DeletedCommand::List => {
                    for row in browser.rows() {
                        let deleted_at = row
                            .tool
                            .lifecycle
                            .deleted_at
                            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default();
                        println!(
                            "{:<26} {:<30} {:>3} ({} sub-tools, {} accessories) {}",
                            row.tool.id,
                            row.tool.name,
                            row.children_count.total,
                            row.children_count.sub_tools,
                            row.children_count.accessories,
                            deleted_at
                        );
                    }
                }
                DeletedCommand::Show { tool_id } => {
                    let detail = browser.open(&tool_id).await?;
                    println!("{} {}", detail.tool.tool.code, detail.tool.tool.name);
                    for sub in &detail.sub_tools {
                        let marker = if sub.sub_tool.lifecycle.is_delete { "deleted" } else { "active" };
                        println!("  {} {} [{}]", sub.sub_tool.id, sub.sub_tool.name, marker);
                        for acc in &sub.accessories {
                            println!("      · {} {}", acc.id, acc.name);
                        }
                    }
                }
                DeletedCommand::Restore { kind, id } => {
                    if let Some(cascade) = browser.restore(AssetKey::new(kind, id)).await? {
                        println!(
                            "Restored with {} sub-tools and {} accessories",
                            cascade.sub_tools, cascade.accessories
                        );
                    }
                }
                DeletedCommand::Purge { kind, id, yes } => {
                    let pending = browser.request_permanent_delete(AssetKey::new(kind, id))?;
                    if !yes {
                        bail!("{} (run again with --yes to confirm)", pending.prompt());
                    }
                    browser.confirm_permanent_delete(pending).await?;
                }
            }
        }

        Command::AddImages { accessory_id, files } => {
            let current = repo.accessories.get(&accessory_id).await?.into_data()?;
            let mut parts = Vec::with_capacity(files.len());
            for path in &files {
                parts.push(load_image(path).await?);
            }
            let kept = current.images.clone();
            services
                .accessory_editor()
                .update(&current, UpdateAccessory::default(), kept, parts)
                .await?;
        }

        Command::Permissions { position_id } => {
            let granted = services.permissions_of(&position_id).await?;
            for (permission, on) in checklist(&granted) {
                println!("[{}] {}", if on { "x" } else { " " }, permission.token());
            }
        }
    }

    Ok(())
}

fn print_sub_tool(sub: &SubTool, indent: &str) {
    let holder = sub.assignee_id().unwrap_or("-");
    println!(
        "{}└ {} {} [{}] {}",
        indent,
        sub.code,
        sub.name,
        sub.status.map(|s| s.label()).unwrap_or("-"),
        holder
    );
}

async fn snapshot(repo: &Repository, kind: AssetKind, id: &str) -> anyhow::Result<AssetSnapshot> {
    let snapshot = match kind {
        AssetKind::Tool => AssetSnapshot::from(&repo.tools.get(id).await?.into_data()?),
        AssetKind::SubTool => AssetSnapshot::from(&repo.sub_tools.get(id).await?.into_data()?),
        AssetKind::Accessory => AssetSnapshot::from(&repo.accessories.get(id).await?.into_data()?),
    };
    Ok(snapshot)
}

async fn employee_ref(services: &Services, id: &str) -> anyhow::Result<ResolvedRef> {
    let employee = services
        .employees
        .get(id)
        .await
        .with_context(|| format!("Unknown employee {}", id))?;
    Ok(ResolvedRef {
        id: employee.id,
        label: employee.full_name,
    })
}

async fn permissions(services: &Services, position: Option<&str>) -> anyhow::Result<PermissionSet> {
    match position {
        Some(id) => Ok(services.permissions_of(id).await?),
        None => {
            tracing::warn!("No position given, restore and permanent delete are disabled");
            Ok(PermissionSet::default())
        }
    }
}

//! `taskdesk` command line front end.
//!
//! # Responsibility
//! - Resolve configuration, open the database and wire core services.
//! - Turn one subcommand into one service call and render the result.
//!
//! Failures print `error: <message>` to stderr and exit non-zero: status 2
//! for rejected input, 1 for everything else.

mod error;
mod output;

use clap::{Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use std::path::PathBuf;
use std::process::ExitCode;
use taskdesk_core::db::open_db;
use taskdesk_core::{
    init_logging, AppConfig, Category, CreateTaskRequest, DashboardService, EditTaskRequest,
    HttpTranscriber, IdentityService, Owner, RegisterRequest, ResetMailer, SqliteTaskRepository,
    SqliteUserRepository, Task, TaskId, TaskService, TranscriptionService,
};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "taskdesk")]
#[command(about = "Personal task manager with automatic categories", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database file; overrides TASKDESK_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Session token from `login`
    #[arg(long, global = true, env = "TASKDESK_SESSION", hide_env_values = true)]
    session: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tasks and summary counts
    Dashboard {
        /// Only list tasks in this category
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Create a task; the category is inferred from the title
    Add {
        title: String,

        /// ISO-8601 date or date-time
        #[arg(short, long)]
        deadline: Option<String>,
    },

    /// Replace a task's title, optionally its category and deadline
    Edit {
        id: TaskId,
        title: String,

        #[arg(short, long)]
        category: Option<Category>,

        /// ISO-8601 date or date-time; unparsable values keep the current one
        #[arg(short, long)]
        deadline: Option<String>,
    },

    /// Mark a task as completed
    Complete { id: TaskId },

    /// Delete a task permanently
    Delete { id: TaskId },

    /// Transcribe an audio file into text for a task title
    Transcribe { file: PathBuf },

    /// Register a new account
    Signup {
        username: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        confirm_password: String,
    },

    /// Open a session and print its token
    Login {
        username: String,

        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Close the current session
    Logout,

    /// Issue a password reset token for the account with this email
    ResetRequest { email: String },

    /// Set a new password using a reset token
    ResetConfirm {
        token: String,

        #[arg(long, env = "TASKDESK_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        confirm_password: String,
    },
}

/// Delivers reset tokens on stderr; there is no outbound mail transport.
struct StderrMailer;

impl ResetMailer for StderrMailer {
    fn send_reset_token(
        &self,
        recipient: &str,
        username: &str,
        token: &str,
    ) -> Result<(), String> {
        eprintln!("password reset for {username} <{recipient}>: {token}");
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = AppConfig::from_env()?;
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir).map_err(CliError::Logging)?;
    }

    let conn = open_db(&config.db_path)?;
    info!(
        "event=cli_command module=cli status=start db_path={}",
        config.db_path.display()
    );

    match cli.command {
        Commands::Dashboard { category } => {
            let owner = resume(&conn, cli.session.as_deref())?;
            let view = DashboardService::new(SqliteTaskRepository::try_new(&conn)?)
                .dashboard(&owner, category)?;
            if cli.json {
                output::print_json(&view)?;
            } else {
                output::print_dashboard(&view);
            }
        }
        Commands::Add { title, deadline } => {
            let owner = resume(&conn, cli.session.as_deref())?;
            let request = CreateTaskRequest { title, deadline };
            let task = task_service(&conn)?.create(&owner, &request)?;
            emit_task(&task, cli.json)?;
        }
        Commands::Edit {
            id,
            title,
            category,
            deadline,
        } => {
            let owner = resume(&conn, cli.session.as_deref())?;
            let request = EditTaskRequest {
                title,
                category,
                deadline,
            };
            let task = task_service(&conn)?.edit(&owner, id, &request)?;
            emit_task(&task, cli.json)?;
        }
        Commands::Complete { id } => {
            let owner = resume(&conn, cli.session.as_deref())?;
            let task = task_service(&conn)?.complete(&owner, id)?;
            emit_task(&task, cli.json)?;
        }
        Commands::Delete { id } => {
            let owner = resume(&conn, cli.session.as_deref())?;
            task_service(&conn)?.delete(&owner, id)?;
            if cli.json {
                output::print_json(&serde_json::json!({ "deleted": id }))?;
            } else {
                println!("deleted {id}");
            }
        }
        Commands::Transcribe { file } => {
            let owner = resume(&conn, cli.session.as_deref())?;
            let audio = std::fs::read(&file).map_err(|source| CliError::ReadAudio {
                path: file.clone(),
                source,
            })?;
            let service = TranscriptionService::new(HttpTranscriber::new(&config.speech)?);
            let text = service.transcribe(&owner, &audio)?;
            if cli.json {
                output::print_json(&serde_json::json!({ "text": text }))?;
            } else {
                println!("{text}");
            }
        }
        Commands::Signup {
            username,
            email,
            password,
            confirm_password,
        } => {
            let user = identity_service(&conn, &config)?.register(&RegisterRequest {
                username,
                email,
                password,
                confirm_password,
            })?;
            if cli.json {
                output::print_json(&user)?;
            } else {
                println!("registered {} ({})", user.username, user.id);
            }
        }
        Commands::Login { username, password } => {
            let grant = identity_service(&conn, &config)?.login(&username, &password)?;
            if cli.json {
                output::print_json(&serde_json::json!({
                    "token": grant.token,
                    "user_id": grant.owner.user_id(),
                    "username": grant.owner.username(),
                }))?;
            } else {
                println!("{}", grant.token);
            }
        }
        Commands::Logout => {
            let token = cli.session.as_deref().ok_or(CliError::MissingSession)?;
            identity_service(&conn, &config)?.logout(token)?;
            acknowledge(cli.json, "logged out")?;
        }
        Commands::ResetRequest { email } => {
            identity_service(&conn, &config)?.request_password_reset(&email, &StderrMailer)?;
            acknowledge(
                cli.json,
                "if an account uses that email, a reset token has been sent",
            )?;
        }
        Commands::ResetConfirm {
            token,
            password,
            confirm_password,
        } => {
            identity_service(&conn, &config)?.confirm_password_reset(
                &token,
                &password,
                &confirm_password,
            )?;
            acknowledge(cli.json, "password updated; log in again")?;
        }
    }

    Ok(())
}

fn identity_service<'conn>(
    conn: &'conn Connection,
    config: &AppConfig,
) -> Result<IdentityService<SqliteUserRepository<'conn>>, CliError> {
    Ok(IdentityService::new(SqliteUserRepository::try_new(conn)?)
        .with_reset_token_ttl(config.reset_token_ttl))
}

fn task_service(conn: &Connection) -> Result<TaskService<SqliteTaskRepository<'_>>, CliError> {
    Ok(TaskService::new(SqliteTaskRepository::try_new(conn)?))
}

fn resume(conn: &Connection, session: Option<&str>) -> Result<Owner, CliError> {
    let token = session.ok_or(CliError::MissingSession)?;
    let identity = IdentityService::new(SqliteUserRepository::try_new(conn)?);
    Ok(identity.resume(token)?)
}

fn emit_task(task: &Task, json: bool) -> Result<(), CliError> {
    if json {
        output::print_json(task)
    } else {
        output::print_task(task);
        Ok(())
    }
}

fn acknowledge(json: bool, message: &str) -> Result<(), CliError> {
    if json {
        output::print_json(&output::acknowledgement())
    } else {
        println!("{message}");
        Ok(())
    }
}

//! keeper - Local account keeper
//!
//! Keeps a per-user database of accounts with every field obscured by a
//! character-rotation cipher.
//!
//! Commands:
//! - register: Create a user with a master password and storage directories
//! - search [QUERY]: Find an account and show it
//! - show <NAME>: Show one account by its exact name
//! - add: Create an account
//! - modify [QUERY]: Change an account
//! - delete [QUERY]: Delete an account
//! - tasks: List pending tasks
//! - export [FILE]: Write every account to CSV
//! - passgen: Print a random password
//! - menu: Interactive menu (default)

mod menu;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use keeper::passgen;
use keeper::{
    Cipher, KeeperError, PasswordGate, Profile, ProfileRegistry, RecordId, Scope, SearchOutcome,
    Session,
};
use keeper_core::KeeperConfig;
use menu::Console;
use serde::Serialize;
use std::io::{self, StdinLock, Stdout, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keeper")]
#[command(about = "Local account keeper - obscured account records with search, tasks and CSV backup")]
#[command(version)]
#[command(after_help = r#"SEARCHING:
    A query matches any part of an account's name, description or search tags.
    'all' lists every account. Several matches are listed by name to pick from.

MODIFYING:
    Type 'same' or 'keep' at a field prompt to leave that field unchanged.
    Type 'random' at the password prompt for a generated password.

FILES:
    ~/.config/keeper/keeper.yaml          Configuration
    ~/.local/share/keeper/users.db        User registry
    <database dir>/<user>.db              Accounts of one user
    <backup dir>/<user>AccountBackup.csv  CSV backup of one user

NOTE:
    Stored fields are obscured, not encrypted."#)]
struct Cli {
    /// Configuration file (default: ~/.config/keeper/keeper.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User to log in as (prompted when omitted)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Register a new user
    Register,

    /// Search accounts and show the one selected
    Search {
        /// Search text; prompted when omitted
        query: Option<String>,
        /// Print a single search step as JSON instead of prompting
        #[arg(long)]
        json: bool,
    },

    /// Show one account by exact name
    Show {
        /// Account name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an account
    Add,

    /// Modify an account
    Modify {
        /// Search text used to find the account
        query: Option<String>,
    },

    /// Delete an account
    Delete {
        /// Search text used to find the account
        query: Option<String>,
    },

    /// List accounts with pending tasks
    Tasks {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export every account to CSV (default: the user's backup file)
    Export {
        /// Output file path
        file: Option<PathBuf>,
    },

    /// Print a random password
    Passgen {
        /// Number of characters (default from config)
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Interactive menu
    Menu,
}

type StdConsole = Console<StdinLock<'static>, Stdout>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => KeeperConfig::load_from(path)?,
        None => KeeperConfig::load()?,
    };
    let cipher = Cipher::from_config(&config.cipher);
    let mut console = Console::new(io::stdin().lock(), io::stdout());

    let user = cli.user.as_deref();
    let console = &mut console;

    match cli.command {
        Some(Commands::Passgen { length }) => cmd_passgen(&config, length),
        Some(Commands::Register) => cmd_register(console, &config, &cipher, user),
        Some(Commands::Search { query, json }) => {
            with_session(console, &config, &cipher, user, |console, session| {
                cmd_search(console, session, query.as_deref(), json)
            })
        }
        Some(Commands::Show { name, json }) => {
            with_session(console, &config, &cipher, user, |console, session| {
                cmd_show(console, session, &name, json)
            })
        }
        Some(Commands::Add) => with_session(console, &config, &cipher, user, |console, session| {
            menu::create(console, session, &config)
        }),
        Some(Commands::Modify { query }) => {
            with_session(console, &config, &cipher, user, |console, session| {
                menu::modify_from(console, session, &config, "Account to modify: ", query.as_deref())
            })
        }
        Some(Commands::Delete { query }) => {
            with_session(console, &config, &cipher, user, |console, session| {
                menu::delete_from(console, session, "Account to delete: ", query.as_deref())
            })
        }
        Some(Commands::Tasks { json }) => {
            with_session(console, &config, &cipher, user, |console, session| {
                cmd_tasks(console, session, json)
            })
        }
        Some(Commands::Export { file }) => {
            with_session(console, &config, &cipher, user, |_, session| cmd_export(session, file))
        }
        Some(Commands::Menu) | None => {
            with_session(console, &config, &cipher, user, |console, session| {
                menu::run(console, session, &config)
            })
        }
    }
}

/// Log in, then run `action` with the open session.
/// Does nothing if the user quits at the login prompt or is denied.
fn with_session<F>(
    console: &mut StdConsole,
    config: &KeeperConfig,
    cipher: &Cipher,
    user: Option<&str>,
    action: F,
) -> Result<()>
where
    F: FnOnce(&mut StdConsole, &mut Session) -> Result<()>,
{
    match login(console, config, cipher, user)? {
        Some(mut session) => action(console, &mut session),
        None => Ok(()),
    }
}

/// Ask for the username (unless given) and the master password.
/// `None` means the user quit or ran out of attempts.
fn login(
    console: &mut StdConsole,
    config: &KeeperConfig,
    cipher: &Cipher,
    user: Option<&str>,
) -> Result<Option<Session>> {
    let registry = ProfileRegistry::open(&config.registry_path(), cipher)?;
    let gate = PasswordGate::new(config.gate.max_attempts);

    loop {
        let username = match user {
            Some(name) => name.to_string(),
            None => match console.ask("Username: ") {
                Ok(name) => name,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e.into()),
            },
        };
        if keeper::session::is_quit_word(&username) {
            return Ok(None);
        }

        let result = Session::login(&registry, &username, &gate, cipher, |attempt| {
            rpassword::prompt_password(format!(
                "Master password ({}/{}): ",
                attempt,
                gate.max_attempts()
            ))
        });

        match result {
            Ok(Some(session)) => return Ok(Some(session)),
            Ok(None) => {
                eprintln!("error: too many wrong passwords");
                return Ok(None);
            }
            Err(KeeperError::UnknownUser(name)) if user.is_none() => {
                console.say(&format!("Unknown user '{}'. Register with: keeper register", name))?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Register a user
fn cmd_register(
    console: &mut StdConsole,
    config: &KeeperConfig,
    cipher: &Cipher,
    user: Option<&str>,
) -> Result<()> {
    let mut registry = ProfileRegistry::open(&config.registry_path(), cipher)?;

    let username = match user {
        Some(name) => name.to_string(),
        None => console.ask("Username: ")?,
    };
    if username.trim().is_empty() {
        bail!("Username cannot be empty");
    }

    let password = rpassword::prompt_password("Master password: ")
        .context("Failed to read master password")?;
    let again = rpassword::prompt_password("Repeat master password: ")
        .context("Failed to read master password")?;
    if password != again {
        bail!("Passwords do not match");
    }

    let database_dir = menu::ask_directory(console, "Directory for your account database: ")?;
    let backup_dir = menu::ask_directory(console, "Directory for your CSV backups: ")?;

    let profile = Profile::new(&username, &password, &database_dir, &backup_dir);
    registry.register(&profile)?;

    println!("success: Registered user '{}'", profile.username);
    println!("  database: {}", profile.database_file().display());
    println!("  backup:   {}", profile.backup_file().display());
    Ok(())
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SearchReport {
    Resolved { account: keeper::Record },
    NoMatch,
    Ambiguous { candidates: Vec<keeper::Candidate> },
    Empty,
}

/// Search, interactively or as one JSON step
fn cmd_search(
    console: &mut StdConsole,
    session: &Session,
    query: Option<&str>,
    json: bool,
) -> Result<()> {
    if json {
        let query = query.unwrap_or_default();
        let report = match session.search(query, &Scope::default())? {
            SearchOutcome::Resolved(id) => SearchReport::Resolved {
                account: session.store().get(&id)?,
            },
            SearchOutcome::NoMatch => SearchReport::NoMatch,
            SearchOutcome::Ambiguous(candidates) => SearchReport::Ambiguous { candidates },
            SearchOutcome::Empty => SearchReport::Empty,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(id) = menu::search_from(console, session, "Search for: ", query)? {
        let record = session.store().get(&id)?;
        menu::show(console, &record)?;
    }
    Ok(())
}

/// Show an account by exact name
fn cmd_show(console: &mut StdConsole, session: &Session, name: &str, json: bool) -> Result<()> {
    let id = RecordId::from_encoded(session.store().cipher().encode(name));
    let record = session.store().get(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        menu::show(console, &record)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct TaskEntry {
    name: String,
    pending_tasks: String,
}

/// List pending tasks
fn cmd_tasks(console: &mut StdConsole, session: &Session, json: bool) -> Result<()> {
    if json {
        let entries: Vec<TaskEntry> = session
            .store()
            .list_tasks()?
            .into_iter()
            .map(|(name, pending_tasks)| TaskEntry { name, pending_tasks })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    menu::tasks(console, session)
}

/// Export accounts to CSV
fn cmd_export(session: &Session, file: Option<PathBuf>) -> Result<()> {
    let rows = match &file {
        Some(path) => keeper::export(session.store(), path)?,
        None => session.backup()?,
    };
    let dest = file.unwrap_or_else(|| session.backup_file().to_path_buf());
    println!("success: Exported {} accounts to {}", rows, dest.display());
    Ok(())
}

/// Print a random password
fn cmd_passgen(config: &KeeperConfig, length: Option<usize>) -> Result<()> {
    let length = length.unwrap_or(config.passgen.length);
    if length == 0 {
        bail!("Password length must be at least 1");
    }
    let password = passgen::generate(length, &config.passgen.charset);

    let mut out = io::stdout().lock();
    writeln!(out, "{}", password)?;
    Ok(())
}

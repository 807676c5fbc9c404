//! Interactive prompts and the numbered main menu
//!
//! Everything here talks to a [`Console`] so the flows can be driven from a
//! script in tests as well as from the terminal.

use anyhow::{Context, Result};
use keeper::passgen::{self, RANDOM_KEYWORD};
use keeper::search::SearchState;
use keeper::{Field, Record, RecordFields, RecordId, Scope, SearchFlow, Session};
use keeper_core::{normalize_path, KeeperConfig};
use std::io::{self, BufRead, Write};

pub const HELP: &str = r#"keeper - local account keeper

MENU:
    1) Search Accounts       Find an account and show its details
    2) Modify Account        Change an account; type 'same' or 'keep' to leave a field as is
    3) Create Account        Add a new account; type 'random' at the password prompt
    4) Show Pending Tasks    List accounts that have pending tasks
    5) Delete An Account     Remove an account permanently
    6) Backup All Accounts   Write every account to your CSV backup file
    7) Help                  Show this message
    8) Quit

SEARCHING:
    Searches match any part of an account's name, description or search tags.
    Type 'all' to list every account. Press enter on an empty search to go back."#;

/// Line-oriented input/output
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` and read one line without its line ending.
    /// End of input is reported as `UnexpectedEof`.
    pub fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let answer = self.ask(prompt)?.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

/// Main menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Search,
    Modify,
    Create,
    Tasks,
    Delete,
    Backup,
    Help,
    Quit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 8] = [
        Self::Search,
        Self::Modify,
        Self::Create,
        Self::Tasks,
        Self::Delete,
        Self::Backup,
        Self::Help,
        Self::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Search => "Search Accounts",
            Self::Modify => "Modify Account",
            Self::Create => "Create Account",
            Self::Tasks => "Show Pending Tasks",
            Self::Delete => "Delete An Account",
            Self::Backup => "Backup All Accounts",
            Self::Help => "Help",
            Self::Quit => "Quit",
        }
    }

    /// Parse a menu number ("1".."8") or a one-word command
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim().to_lowercase();
        if let Ok(n) = input.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied());
        }
        match input.as_str() {
            "search" => Some(Self::Search),
            "modify" | "edit" => Some(Self::Modify),
            "create" | "add" | "new" => Some(Self::Create),
            "tasks" => Some(Self::Tasks),
            "delete" | "remove" => Some(Self::Delete),
            "backup" | "export" => Some(Self::Backup),
            "help" => Some(Self::Help),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Run the main menu until the user quits or input ends
pub fn run<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &mut Session,
    config: &KeeperConfig,
) -> Result<()> {
    loop {
        match menu_step(console, session, config) {
            Ok(true) => continue,
            Ok(false) => return Ok(()),
            Err(e) if is_eof(&e) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

/// One pass of the menu; `false` means quit
fn menu_step<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &mut Session,
    config: &KeeperConfig,
) -> Result<bool> {
    console.say("")?;
    console.say("Enter the number of the corresponding option.")?;
    for (i, choice) in MenuChoice::ALL.iter().enumerate() {
        console.say(&format!("\t{}) {}", i + 1, choice.label()))?;
    }
    let input = console.ask("\n> ")?;

    let Some(choice) = MenuChoice::parse(&input) else {
        console.say(&format!("did not recognize: '{}'", input))?;
        return Ok(true);
    };

    match choice {
        MenuChoice::Search => {
            if let Some(id) = search(console, session, "Search for: ")? {
                let record = session.store().get(&id)?;
                show(console, &record)?;
            }
        }
        MenuChoice::Modify => modify(console, session, config, "Account to modify: ")?,
        MenuChoice::Create => create(console, session, config)?,
        MenuChoice::Tasks => tasks(console, session)?,
        MenuChoice::Delete => delete(console, session, "Account to delete: ")?,
        MenuChoice::Backup => {
            let rows = session.backup()?;
            console.say(&format!(
                "{} accounts backed up to {}",
                rows,
                session.backup_file().display()
            ))?;
        }
        MenuChoice::Help => console.say(HELP)?,
        MenuChoice::Quit => return Ok(false),
    }
    Ok(true)
}

/// Drive a search until it resolves or the user gives up
pub fn search<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &Session,
    prompt: &str,
) -> Result<Option<RecordId>> {
    search_from(console, session, prompt, None)
}

/// Like [`search`], using `first_query` instead of prompting the first time
pub fn search_from<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &Session,
    prompt: &str,
    first_query: Option<&str>,
) -> Result<Option<RecordId>> {
    let mut flow = SearchFlow::new(Scope::default());
    let mut pending = first_query.map(str::to_string);

    while !flow.is_finished() {
        let input = match flow.state() {
            SearchState::Prompting { notice } => {
                if let Some(notice) = notice {
                    console.say(notice)?;
                }
                match pending.take() {
                    Some(query) => query,
                    None => console.ask(prompt)?,
                }
            }
            SearchState::Disambiguating { query, candidates } => {
                console.say(&format!("{} search results for '{}':", candidates.len(), query))?;
                for (i, candidate) in candidates.iter().enumerate() {
                    console.say(&format!("{}) {}", i + 1, candidate.name))?;
                }
                console.ask("\nNumber of correct account or just press enter to search again: ")?
            }
            SearchState::Searching { .. } => String::new(),
            SearchState::Resolved(_) | SearchState::Abandoned => break,
        };
        flow.submit(session.store(), &input)?;
    }

    Ok(flow.resolved().cloned())
}

/// Print the non-empty fields of a record
pub fn show<R: BufRead, W: Write>(console: &mut Console<R, W>, record: &Record) -> Result<()> {
    for (label, value) in record.display_lines() {
        console.say(&format!("{:<20}{}", format!("{}:", label), value))?;
    }
    Ok(())
}

/// Ask for every editable field. With `keep_hint`, tells the user how to
/// keep the current values.
fn read_fields<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    config: &KeeperConfig,
    keep_hint: bool,
) -> Result<RecordFields> {
    if keep_hint {
        console.say("Type 'same' or 'keep' to leave a field unchanged.")?;
    }

    let mut fields = RecordFields::default();
    for field in Field::EDITABLE {
        let value = if field == Field::Password {
            read_password(console, config)?
        } else {
            console.ask(&format!("{}: ", field.label()))?
        };
        fields.set(field, value);
    }
    Ok(fields)
}

/// Password prompt with the 'random' option
fn read_password<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    config: &KeeperConfig,
) -> Result<String> {
    loop {
        let typed = console.ask(&format!("Password (or '{}'): ", RANDOM_KEYWORD))?;
        if !typed.trim().eq_ignore_ascii_case(RANDOM_KEYWORD) {
            return Ok(typed);
        }

        let length = ask_length(console, config.passgen.length)?;
        let password = passgen::generate(length, &config.passgen.charset);
        if console.confirm(&format!("use '{}'? (y/n) ", password))? {
            return Ok(password);
        }
    }
}

fn ask_length<R: BufRead, W: Write>(console: &mut Console<R, W>, default: usize) -> Result<usize> {
    loop {
        let typed = console.ask(&format!("length of password [{}]: ", default))?;
        let typed = typed.trim();
        if typed.is_empty() {
            return Ok(default);
        }
        match typed.parse::<usize>() {
            Ok(n) if n > 0 => return Ok(n),
            _ => console.say(&format!("'{}' is not a valid length", typed))?,
        }
    }
}

/// Ask for a directory until the answer names an existing one
pub fn ask_directory<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    prompt: &str,
) -> Result<String> {
    loop {
        let typed = console.ask(prompt)?;
        if normalize_path(&typed).is_dir() {
            return Ok(typed);
        }
        console.say(&format!("'{}' is not a working directory on your computer.", typed))?;
    }
}

pub fn create<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &mut Session,
    config: &KeeperConfig,
) -> Result<()> {
    console.say("Please enter some information about the account.")?;
    let fields = read_fields(console, config, false)?;

    match session.store_mut().insert(&fields) {
        Ok(_) => console.say(&format!("'{}' created", fields.name))?,
        Err(e @ (keeper::KeeperError::DuplicateName(_) | keeper::KeeperError::InvalidName)) => {
            console.say(&format!("Account not created: {}", e))?
        }
        Err(e) => return Err(e).context("Failed to create account"),
    }
    Ok(())
}

pub fn modify<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &mut Session,
    config: &KeeperConfig,
    prompt: &str,
) -> Result<()> {
    modify_from(console, session, config, prompt, None)
}

pub fn modify_from<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &mut Session,
    config: &KeeperConfig,
    prompt: &str,
    first_query: Option<&str>,
) -> Result<()> {
    let Some(id) = search_from(console, session, prompt, first_query)? else {
        return Ok(());
    };
    let name = session.store().name_of(&id);
    if !console.confirm(&format!("Are you sure you want to modify '{}'? (y/n) ", name))? {
        console.say(&format!("'{}' not modified", name))?;
        return Ok(());
    }

    let record = session.store().get(&id)?;
    show(console, &record)?;
    console.say(&format!("Please enter new information for '{}'.", name))?;
    let fields = read_fields(console, config, true)?;

    match session.store_mut().update(&id, &fields) {
        Ok(new_id) => {
            let record = session.store().get(&new_id)?;
            console.say("Account updated:")?;
            show(console, &record)?;
        }
        Err(e @ (keeper::KeeperError::DuplicateName(_) | keeper::KeeperError::InvalidName)) => {
            console.say(&format!("Account not modified: {}", e))?
        }
        Err(e) => return Err(e).context("Failed to modify account"),
    }
    Ok(())
}

pub fn delete<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &mut Session,
    prompt: &str,
) -> Result<()> {
    delete_from(console, session, prompt, None)
}

pub fn delete_from<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    session: &mut Session,
    prompt: &str,
    first_query: Option<&str>,
) -> Result<()> {
    let Some(id) = search_from(console, session, prompt, first_query)? else {
        return Ok(());
    };
    let name = session.store().name_of(&id);
    if console.confirm(&format!("Are you sure you want to delete '{}'? (y/n) ", name))? {
        session.store_mut().remove(&id)?;
        console.say(&format!("'{}' deleted", name))?;
    } else {
        console.say(&format!("'{}' not deleted", name))?;
    }
    Ok(())
}

pub fn tasks<R: BufRead, W: Write>(console: &mut Console<R, W>, session: &Session) -> Result<()> {
    let tasks = session.store().list_tasks()?;
    if tasks.is_empty() {
        console.say("No pending tasks.")?;
        return Ok(());
    }
    for (name, pending) in tasks {
        console.say(&format!("{}:", name))?;
        for line in pending.lines() {
            console.say(&format!("    {}", line))?;
        }
    }
    Ok(())
}

/// Did the error come from running out of input?
pub fn is_eof(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .map_or(false, |e| e.kind() == io::ErrorKind::UnexpectedEof)
            || matches!(
                cause.downcast_ref::<keeper::KeeperError>(),
                Some(keeper::KeeperError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper::{Cipher, Profile};
    use keeper_core::config::DEFAULT_ALPHABET;
    use std::io::Cursor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn session(tmp: &TempDir) -> Session {
        let dir = tmp.path().to_string_lossy().to_string();
        let profile = Profile::new("tester", "pw", &dir, &dir);
        Session::open(&profile, Cipher::new(DEFAULT_ALPHABET, 10, "")).unwrap()
    }

    fn console(script: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    fn output(console: Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(console.into_output()).unwrap()
    }

    fn add(session: &mut Session, name: &str, tags: &str) {
        let mut fields = RecordFields::named(name);
        fields.search_tags = tags.to_string();
        fields.password = format!("{}-pw", name);
        session.store_mut().insert(&fields).unwrap();
    }

    /// Answers for every editable field, in order
    fn field_script(values: [&str; 12]) -> String {
        values.iter().map(|v| format!("{}\n", v)).collect()
    }

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::Search));
        assert_eq!(MenuChoice::parse(" 8 "), Some(MenuChoice::Quit));
        assert_eq!(MenuChoice::parse("Backup"), Some(MenuChoice::Backup));
        assert_eq!(MenuChoice::parse("0"), None);
        assert_eq!(MenuChoice::parse("9"), None);
        assert_eq!(MenuChoice::parse("dance"), None);
    }

    #[test]
    fn test_console_strips_line_endings() -> Result<()> {
        let mut console = console("first\r\nsecond\n");
        assert_eq!(console.ask("> ")?, "first");
        assert_eq!(console.ask("> ")?, "second");
        assert_eq!(console.ask("> ").unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
        Ok(())
    }

    #[test]
    fn test_search_disambiguates() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(&tmp);
        add(&mut session, "GitHub", "work");
        add(&mut session, "AWS", "work");

        let mut console = console("nothing\nwork\n7\nwork\n2\n");
        let id = search(&mut console, &session, "Search for: ")?.expect("resolved");
        assert_eq!(session.store().name_of(&id), "GitHub");

        let out = output(console);
        assert!(out.contains("No matches for search 'nothing'."));
        assert!(out.contains("2 search results for 'work':"));
        assert!(out.contains("1) AWS"));
        assert!(out.contains("2) GitHub"));
        Ok(())
    }

    #[test]
    fn test_search_empty_query_gives_up() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(&tmp);
        add(&mut session, "GitHub", "");

        let mut console = console("\n");
        assert!(search(&mut console, &session, "Search for: ")?.is_none());
        Ok(())
    }

    #[test]
    fn test_create_then_modify_with_keep() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(&tmp);
        let config = KeeperConfig::default();

        let script = field_script([
            "Bank", "checking", "me@bank.example", "me", "hunter2", "", "https://bank.example", "",
            "", "", "call branch", "money",
        ]);
        create(&mut console(&script), &mut session, &config)?;

        let mut script = String::from("Bank\ny\n");
        script.push_str(&field_script([
            "keep", "same", "new@bank.example", "keep", "keep", "keep", "keep", "keep", "keep",
            "keep", "", "keep",
        ]));
        let mut console = console(&script);
        modify(&mut console, &mut session, &config, "Account to modify: ")?;

        let id = RecordId::from_encoded(session.store().cipher().encode("Bank"));
        let record = session.store().get(&id)?;
        assert_eq!(record.fields.description, "checking");
        assert_eq!(record.fields.email, "new@bank.example");
        assert_eq!(record.fields.password, "hunter2");
        assert_eq!(record.fields.pending_tasks, "");
        assert_eq!(record.fields.search_tags, "money");
        assert!(output(console).contains("Account updated:"));
        Ok(())
    }

    #[test]
    fn test_create_duplicate_reports() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(&tmp);
        add(&mut session, "Bank", "");

        let script = field_script(["Bank", "", "", "", "", "", "", "", "", "", "", ""]);
        let mut console = console(&script);
        create(&mut console, &mut session, &KeeperConfig::default())?;
        assert!(output(console).contains("Account not created"));
        assert_eq!(session.store().len()?, 1);
        Ok(())
    }

    #[test]
    fn test_random_password() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(&tmp);
        let mut config = KeeperConfig::default();
        config.passgen.charset = "x".to_string();

        // Reject the first suggestion, accept the second
        let script = "Mail\n\n\n\nrandom\n4\nn\nrandom\n\ny\n\n\n\n\n\n\n\n";
        create(&mut console(script), &mut session, &config)?;

        let id = RecordId::from_encoded(session.store().cipher().encode("Mail"));
        assert_eq!(session.store().get(&id)?.fields.password, "xxxxxxxx");
        Ok(())
    }

    #[test]
    fn test_ask_directory_repeats_until_valid() -> Result<()> {
        let tmp = TempDir::new()?;
        let missing = tmp.path().join("missing");
        let script = format!("{}\n{}\n", missing.display(), tmp.path().display());

        let mut console = console(&script);
        let dir = ask_directory(&mut console, "Directory: ")?;
        assert_eq!(PathBuf::from(dir), tmp.path());
        assert!(output(console).contains("is not a working directory on your computer."));
        Ok(())
    }

    #[test]
    fn test_delete_needs_confirmation() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(&tmp);
        add(&mut session, "GitHub", "");

        let mut declined = console("GitHub\nn\n");
        delete(&mut declined, &mut session, "Account to delete: ")?;
        assert!(output(declined).contains("'GitHub' not deleted"));
        assert_eq!(session.store().len()?, 1);

        delete(&mut console("GitHub\nyes\n"), &mut session, "Account to delete: ")?;
        assert_eq!(session.store().len()?, 0);
        Ok(())
    }

    #[test]
    fn test_run_until_quit_or_eof() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(&tmp);
        let mut fields = RecordFields::named("Bank");
        fields.pending_tasks = "rotate pin".to_string();
        session.store_mut().insert(&fields)?;

        let config = KeeperConfig::default();
        let mut console = console("4\nbogus\n6\n8\n");
        run(&mut console, &mut session, &config)?;
        let out = output(console);
        assert!(out.contains("Bank:"));
        assert!(out.contains("    rotate pin"));
        assert!(out.contains("did not recognize: 'bogus'"));
        assert!(out.contains("1 accounts backed up"));
        assert!(session.backup_file().is_file());

        // Running out of input ends the menu quietly
        run(&mut console_for_eof(), &mut session, &config)?;
        Ok(())
    }

    fn console_for_eof() -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        console("7\n")
    }
}

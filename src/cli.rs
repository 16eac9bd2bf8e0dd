//! Command line surface and the session that runs one invocation.

use std::ffi::OsString;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser};
use rand::Rng;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::apply::{command_line, CommandRunner};
use crate::config::{
    Config, ConfigError, ConfigStore, LoggingConfig, NotificationConfig, DEFAULT_CONFIG_PATH,
};
use crate::error::AppError;
use crate::logging;
use crate::printer::Printer;
use crate::selector::WallpaperSelector;

#[derive(Parser, Debug)]
#[command(name = "backdrop")]
#[command(about = "Pick a wallpaper and hand it to your wallpaper setter", version)]
#[command(group(
    ArgGroup::new("action")
        .multiple(false)
        .args([
            "set",
            "random",
            "list",
            "add",
            "remove",
            "set_random_list",
            "get_key",
            "set_key",
            "delete_key",
        ])
))]
pub struct Args {
    /// Path to the JSON config file
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Print debug messages
    #[arg(short, long)]
    pub debug: bool,

    /// Set the wallpaper NAME from the wallpaper directory
    #[arg(short, long, value_name = "NAME")]
    pub set: Option<String>,

    /// Set a random wallpaper from the wallpaper directory
    #[arg(short, long)]
    pub random: bool,

    /// List the wallpapers in the wallpaper directory
    #[arg(short, long)]
    pub list: bool,

    /// Add wallpapers (not yet supported)
    #[arg(long, value_name = "NAME", num_args = 1..)]
    pub add: Vec<String>,

    /// Remove wallpapers (not yet supported)
    #[arg(long, value_name = "NAME", num_args = 1..)]
    pub remove: Vec<String>,

    /// Set a random wallpaper out of NAMEs, or out of `auto_change.list` when none are given
    #[arg(long, visible_alias = "srl", value_name = "NAME", num_args = 0..)]
    pub set_random_list: Option<Vec<String>>,

    /// Print the config value at a dotted KEY
    #[arg(long, value_name = "KEY")]
    pub get_key: Option<String>,

    /// Store VALUE (JSON, or a plain string) at a dotted KEY
    #[arg(long, value_names = ["KEY", "VALUE"], num_args = 2, allow_hyphen_values = true)]
    pub set_key: Option<Vec<String>>,

    /// Remove a dotted KEY from the config
    #[arg(long, value_name = "KEY")]
    pub delete_key: Option<String>,
}

/// Rewrites the single-dash `-srl` spelling into `--set-random-list`.
pub fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| if arg == "-srl" { OsString::from("--set-random-list") } else { arg })
        .collect()
}

/// What a single invocation was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Runs against a config that loads.
    Wallpaper(Action),
    /// Works on the raw document, even one that no longer loads.
    Edit(KeyEdit),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Set(String),
    Random,
    RandomFromList(Vec<String>),
    List,
    Add(Vec<String>),
    Remove(Vec<String>),
    Show,
}

/// Direct edits of the config document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEdit {
    Get(String),
    Set(String, String),
    Delete(String),
}

impl Args {
    pub fn request(&self) -> Request {
        if let Some(key) = &self.get_key {
            Request::Edit(KeyEdit::Get(key.clone()))
        } else if let Some([key, value]) = self.set_key.as_deref() {
            Request::Edit(KeyEdit::Set(key.clone(), value.clone()))
        } else if let Some(key) = &self.delete_key {
            Request::Edit(KeyEdit::Delete(key.clone()))
        } else {
            Request::Wallpaper(self.action())
        }
    }

    fn action(&self) -> Action {
        if let Some(name) = &self.set {
            Action::Set(name.clone())
        } else if self.random {
            Action::Random
        } else if self.list {
            Action::List
        } else if let Some(names) = &self.set_random_list {
            Action::RandomFromList(names.clone())
        } else if !self.add.is_empty() {
            Action::Add(self.add.clone())
        } else if !self.remove.is_empty() {
            Action::Remove(self.remove.clone())
        } else {
            Action::Show
        }
    }
}

/// One CLI invocation: the console, prompt input, command runner and
/// randomness source it works with.
pub struct Session<I, C, G> {
    printer: Printer,
    input: I,
    runner: C,
    rng: G,
    file_logging: bool,
}

impl<I: BufRead, C: CommandRunner, G: Rng> Session<I, C, G> {
    pub fn new(printer: Printer, input: I, runner: C, rng: G) -> Self {
        Self {
            printer,
            input,
            runner,
            rng,
            file_logging: false,
        }
    }

    /// Installs the file logger from the config before doing any work.
    pub fn with_file_logging(mut self) -> Self {
        self.file_logging = true;
        self
    }

    pub const fn printer(&self) -> &Printer {
        &self.printer
    }

    pub fn run(&mut self, args: &Args) -> Result<(), AppError> {
        let store = ConfigStore::new(&args.config);

        match args.request() {
            Request::Edit(edit) => {
                store.ensure_file(&self.printer, &mut self.input)?;
                if self.file_logging {
                    match store.logging_config() {
                        Ok(logging) => self.install_logging(&logging),
                        Err(err) => self
                            .printer
                            .debug(format!("Skipping file logging: {err}")),
                    }
                }
                edit_config(&self.printer, &store, edit)
            }
            Request::Wallpaper(action) => {
                let config = store.ensure(&self.printer, &mut self.input)?;
                if self.file_logging {
                    self.install_logging(&config.logging);
                }
                self.dispatch(&config, action)
            }
        }
    }

    fn install_logging(&self, logging: &LoggingConfig) {
        match logging::install(logging) {
            Ok(true) => self
                .printer
                .debug(format!("Logging to {}", logging.file_path().display())),
            Ok(false) => self.printer.debug("File logging is disabled"),
            Err(err) => self
                .printer
                .warning(format!("File logging unavailable: {err}")),
        }
    }

    fn dispatch(&mut self, config: &Config, action: Action) -> Result<(), AppError> {
        self.report_declared_only(config);

        let wallpaper = {
            let mut selector = WallpaperSelector::from_config(&config.wallpaper, &mut self.rng);
            match action {
                Action::Set(name) => selector.pick_explicit(&name),
                Action::Random => selector.pick_random()?,
                Action::RandomFromList(names) => {
                    let list = if names.is_empty() {
                        config.wallpaper.curated_list()
                    } else {
                        selector.curated_from_names(&names)
                    };
                    debug!("sampling from {} curated wallpapers", list.len());
                    selector.pick_from_curated_list(&list)?
                }
                Action::List => {
                    let names = selector.list_wallpapers()?;
                    if names.is_empty() {
                        self.printer.warning(format!(
                            "No wallpapers found in {}",
                            selector.dir().display()
                        ));
                    }
                    self.printer.list(&names);
                    return Ok(());
                }
                Action::Add(_) => return Err(AppError::Unsupported("--add")),
                Action::Remove(_) => return Err(AppError::Unsupported("--remove")),
                Action::Show => {
                    self.printer.info(format!(
                        "Current wallpaper: {}",
                        config.wallpaper.current_path().display()
                    ));
                    self.printer.info("Run with --help to see the available actions");
                    return Ok(());
                }
            }
        };

        self.apply(config, &wallpaper)
    }

    fn apply(&mut self, config: &Config, wallpaper: &Path) -> Result<(), AppError> {
        let target = wallpaper.display().to_string();
        self.printer
            .debug(format!("Running: {}", command_line(&config.wallpaper.cmd, &target)));
        info!("applying wallpaper {target}");

        match self.runner.run(&config.wallpaper.cmd, &target) {
            Ok(()) => {
                self.printer.success(format!("Wallpaper set to {target}"));
                let notifications = &config.notifications;
                if notifications.toggle && notifications.wallpaper_change {
                    self.notify(notifications, &format!("Wallpaper changed to {target}"));
                }
                Ok(())
            }
            Err(err) => {
                let notifications = &config.notifications;
                if notifications.toggle && notifications.wallpaper_error {
                    self.notify(notifications, &format!("Failed to set wallpaper {target}"));
                }
                Err(err.into())
            }
        }
    }

    fn notify(&mut self, notifications: &NotificationConfig, message: &str) {
        if let Err(err) = self.runner.notify(&notifications.cmd, message) {
            self.printer.warning(format!("Notification failed: {err}"));
            warn!("notification failed: {err}");
        }
    }

    fn report_declared_only(&self, config: &Config) {
        if config.wallpaper.auto_change.toggle {
            self.printer.debug(format!(
                "auto_change is enabled (every {}s) but wallpapers only change on request",
                config.wallpaper.auto_change.interval
            ));
        }
        for (name, backend) in config.wallpaper.selector_backends() {
            if backend.toggle {
                self.printer
                    .debug(format!("{name} selection is enabled but not wired up, ignoring it"));
            }
        }
    }
}

fn edit_config(printer: &Printer, store: &ConfigStore, edit: KeyEdit) -> Result<(), AppError> {
    match edit {
        KeyEdit::Get(key) => {
            let value = store
                .get_key(&key)?
                .ok_or_else(|| ConfigError::KeyNotFound(key.clone()))?;
            printer.info(format!("{key} = {value}"));
        }
        KeyEdit::Set(key, raw) => {
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            store.set_key(&key, value)?;
            printer.success(format!("Updated {key}"));
            info!("updated config key {key}");
        }
        KeyEdit::Delete(key) => {
            let removed = store.delete_key(&key)?;
            printer.success(format!("Deleted {key} (was {removed})"));
            info!("deleted config key {key}");
        }
    }
    Ok(())
}

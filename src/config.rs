//! The persisted JSON configuration and the store that owns it on disk.
//!
//! Every write replaces the whole file in place. A crash in the middle of a
//! write can leave a truncated document behind; the next run then reports a
//! parse error instead of silently recreating defaults.

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::printer::Printer;

/// Config file used when `--config` is not given, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "bdy.config";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist and was not created")]
    Missing(PathBuf),
    #[error("config file {0} is empty and was not recreated")]
    Empty(PathBuf),
    #[error("invalid answer {0:?}, expected y/yes or n/no")]
    InvalidAnswer(String),
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("error decoding JSON from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("error encoding JSON for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("key '{0}' not found in the config")]
    KeyNotFound(String),
    #[error("invalid key '{0}'")]
    InvalidKey(String),
    #[error("error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Missing(_) => "ConfigMissing",
            Self::Empty(_) => "ConfigEmpty",
            Self::InvalidAnswer(_) => "ConfigInvalidAnswer",
            Self::NotFound(_) => "NotFound",
            Self::Parse { .. } => "ParseError",
            Self::Encode { .. } => "EncodeError",
            Self::KeyNotFound(_) => "KeyNotFound",
            Self::InvalidKey(_) => "InvalidKey",
            Self::Io { .. } => "IoError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub wallpaper: WallpaperConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallpaperConfig {
    /// Directory searched for wallpapers.
    pub dir: String,
    /// Path of the last applied wallpaper.
    pub current: String,
    /// File extension a wallpaper must end with, e.g. `.jpg`.
    pub ext: String,
    /// Command the wallpaper path is appended to.
    pub cmd: String,
    pub auto_change: AutoChange,
    pub fzf: SelectorBackend,
    pub wofi: SelectorBackend,
    pub rofi: SelectorBackend,
    pub dmenu: SelectorBackend,
}

/// Timed wallpaper rotation settings. Stored, never driven by a timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoChange {
    pub toggle: bool,
    /// Seconds between changes.
    pub interval: u64,
    pub list: Vec<String>,
    pub random: bool,
}

/// An interactive picker such as fzf or rofi.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorBackend {
    pub toggle: bool,
    pub cmd: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub toggle: bool,
    pub interval: u64,
    pub cmd: String,
    pub wallpaper_change: bool,
    pub wallpaper_error: bool,
    pub wallpaper_add: bool,
    pub wallpaper_remove: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub enable: bool,
    pub file: String,
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wallpaper: WallpaperConfig {
                dir: "/home/$USER/Pictures/Wallpapers".to_string(),
                current: "/home/$USER/Pictures/Wallpapers/current".to_string(),
                ext: ".jpg".to_string(),
                cmd: "swaybg -i".to_string(),
                auto_change: AutoChange {
                    toggle: false,
                    interval: 300,
                    list: Vec::new(),
                    random: true,
                },
                fzf: SelectorBackend::disabled("fzf"),
                wofi: SelectorBackend::disabled("wofi --dmenu"),
                rofi: SelectorBackend::disabled("rofi -dmenu"),
                dmenu: SelectorBackend::disabled("dmenu"),
            },
            notifications: NotificationConfig {
                toggle: true,
                interval: 300,
                cmd: "notify-send".to_string(),
                wallpaper_change: true,
                wallpaper_error: true,
                wallpaper_add: true,
                wallpaper_remove: true,
            },
            logging: LoggingConfig {
                enable: true,
                file: "/var/log/backdropy.log".to_string(),
                level: LogLevel::Info,
            },
        }
    }
}

impl SelectorBackend {
    fn disabled(cmd: &str) -> Self {
        Self {
            toggle: false,
            cmd: cmd.to_string(),
        }
    }
}

impl WallpaperConfig {
    pub fn dir_path(&self) -> PathBuf {
        expand(&self.dir)
    }

    pub fn current_path(&self) -> PathBuf {
        expand(&self.current)
    }

    /// The `auto_change.list` entries with their paths expanded.
    pub fn curated_list(&self) -> Vec<PathBuf> {
        self.auto_change.list.iter().map(|entry| expand(entry)).collect()
    }

    pub fn selector_backends(&self) -> [(&'static str, &SelectorBackend); 4] {
        [
            ("fzf", &self.fzf),
            ("wofi", &self.wofi),
            ("rofi", &self.rofi),
            ("dmenu", &self.dmenu),
        ]
    }
}

impl LoggingConfig {
    pub fn file_path(&self) -> PathBuf {
        expand(&self.file)
    }
}

/// Expands `~`, `$VAR` and `${VAR}` in a configured path.
///
/// A variable that cannot be resolved leaves the string untouched, the same as
/// a path that never contained one.
pub fn expand(raw: &str) -> PathBuf {
    let raw = raw.trim();
    shellexpand::full(raw).map_or_else(
        |_| PathBuf::from(raw),
        |expanded| PathBuf::from(expanded.as_ref()),
    )
}

/// Renders a document the way it is stored: four-space indentation, no
/// trailing newline.
fn render<T: Serialize>(path: &Path, value: &T) -> Result<Vec<u8>, ConfigError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| ConfigError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(buf)
}

/// Reply to the "create config?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Some(Self::Yes),
            "n" | "no" => Some(Self::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileState {
    Absent,
    Empty,
    Present,
}

/// Reads, writes and edits the config file at a single path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Makes sure a usable config file exists, then loads it.
    pub fn ensure<R: BufRead>(
        &self,
        printer: &Printer,
        input: &mut R,
    ) -> Result<Config, ConfigError> {
        self.ensure_file(printer, input)?;
        self.load()
    }

    /// Creates the default config after asking the user when the file is
    /// absent or empty. An existing non-empty file is left alone.
    pub fn ensure_file<R: BufRead>(
        &self,
        printer: &Printer,
        input: &mut R,
    ) -> Result<(), ConfigError> {
        match self.state()? {
            FileState::Present => {
                printer.debug(format!("Config file found at {}", self.path.display()));
                debug!("config file found at {}", self.path.display());
                Ok(())
            }
            FileState::Absent => {
                let question = format!(
                    "Config file {} not found. Create it? (y/n)",
                    self.path.display()
                );
                self.confirm_create(printer, input, &question, ConfigError::Missing)
            }
            FileState::Empty => {
                let question = format!(
                    "Config file {} is empty. Write the defaults? (y/n)",
                    self.path.display()
                );
                self.confirm_create(printer, input, &question, ConfigError::Empty)
            }
        }
    }

    fn confirm_create<R: BufRead>(
        &self,
        printer: &Printer,
        input: &mut R,
        question: &str,
        refused: fn(PathBuf) -> ConfigError,
    ) -> Result<(), ConfigError> {
        let answer = printer.prompt(question, input).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        match Answer::parse(&answer) {
            Some(Answer::Yes) => {
                self.write_default()?;
                printer.success(format!("Created default config at {}", self.path().display()));
                info!("created default config at {}", self.path().display());
                Ok(())
            }
            Some(Answer::No) => Err(refused(self.path.clone())),
            None => Err(ConfigError::InvalidAnswer(answer.trim().to_string())),
        }
    }

    fn state(&self) -> Result<FileState, ConfigError> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() == 0 => Ok(FileState::Empty),
            Ok(_) => Ok(FileState::Present),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(FileState::Absent),
            Err(source) => Err(ConfigError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        let data = self.read()?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        self.write_document(config)
    }

    pub fn write_default(&self) -> Result<(), ConfigError> {
        self.save(&Config::default())
    }

    /// Reads only the `logging` section, so logging can be set up for a
    /// document whose other sections no longer load.
    pub fn logging_config(&self) -> Result<LoggingConfig, ConfigError> {
        let section = self
            .get_key("logging")?
            .ok_or_else(|| ConfigError::KeyNotFound("logging".to_string()))?;
        serde_json::from_value(section).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Looks up a dotted key such as `wallpaper.cmd`.
    pub fn get_key(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        let segments = split_key(key)?;
        let doc = self.read_document()?;
        Ok(lookup(&doc, &segments).cloned())
    }

    /// Sets a dotted key, creating intermediate objects that do not exist yet.
    pub fn set_key(&self, key: &str, value: Value) -> Result<(), ConfigError> {
        let segments = split_key(key)?;
        let mut doc = self.read_document()?;

        let Some((last, parents)) = segments.split_last() else {
            return Err(ConfigError::InvalidKey(key.to_string()));
        };
        let mut map = &mut doc;
        for segment in parents {
            map = map
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
                .ok_or_else(|| ConfigError::InvalidKey(key.to_string()))?;
        }
        map.insert((*last).to_string(), value);

        self.write_document(&doc)
    }

    /// Removes a dotted key and returns its old value. The file is not
    /// rewritten when the key is absent.
    pub fn delete_key(&self, key: &str) -> Result<Value, ConfigError> {
        let segments = split_key(key)?;
        let mut doc = self.read_document()?;

        let Some((last, parents)) = segments.split_last() else {
            return Err(ConfigError::InvalidKey(key.to_string()));
        };
        let mut map = &mut doc;
        for segment in parents {
            map = map
                .get_mut(*segment)
                .and_then(Value::as_object_mut)
                .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
        }
        let removed = map
            .shift_remove(*last)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        self.write_document(&doc)?;
        Ok(removed)
    }

    fn read(&self) -> Result<String, ConfigError> {
        fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound(self.path.clone())
            } else {
                ConfigError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })
    }

    fn read_document(&self) -> Result<Map<String, Value>, ConfigError> {
        let data = self.read()?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_document<T: Serialize>(&self, value: &T) -> Result<(), ConfigError> {
        let bytes = render(&self.path, value)?;
        fs::write(&self.path, bytes).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn split_key(key: &str) -> Result<Vec<&str>, ConfigError> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ConfigError::InvalidKey(key.to_string()));
    }
    Ok(segments)
}

fn lookup<'a>(doc: &'a Map<String, Value>, segments: &[&str]) -> Option<&'a Value> {
    let (last, parents) = segments.split_last()?;
    let mut map = doc;
    for segment in parents {
        map = map.get(*segment)?.as_object()?;
    }
    map.get(*last)
}

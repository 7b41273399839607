//! Subcommand implementations.
//!
//! Every command drives the engine through the headless host exactly as an editor would: files
//! are opened as [`Document`]s, checked through a [`DecorationManager`] and saved through a
//! [`SaveCommandFilter`].

use crate::cli::{Cli, Command, ConfigAction};
use anyhow::{Context, Result, bail};
use blackspace_core::{
    Color, CommandStatus, CommandTarget, ConfigRegistry, DecorationManager, HostCommand,
    MemorySettingsStore, SETTINGS_COLLECTION, SaveCommandFilter, SaveTrimmer, StoredValue,
    StyleConfig, WhitespaceKind, keys,
};
use blackspace_headless::{Document, HeadlessView, JsonSettingsStore, ViewOptions};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

/// Default settings file: `<config dir>/blackspace/settings.json`.
pub fn default_settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("blackspace");
    path.push("settings.json");
    path
}

/// Result of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report.
    Clean,
    /// `check` found trailing whitespace.
    Found,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Clean => ExitCode::SUCCESS,
            Outcome::Found => ExitCode::FAILURE,
        }
    }
}

/// Run the parsed command line, writing the report to `out`.
pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<Outcome> {
    let settings = cli.settings.unwrap_or_else(default_settings_path);
    match cli.command {
        Command::Check { files } => {
            let registry = open_registry(&settings)?;
            let mut found = false;
            for path in &files {
                found |= check_file(path, &registry, out)?;
            }
            Ok(if found {
                Outcome::Found
            } else {
                Outcome::Clean
            })
        }
        Command::Trim { files, force } => {
            let registry = if force {
                forced_trim_registry()
            } else {
                open_registry(&settings)?
            };
            if !registry.config().trim_on_save {
                tracing::info!("trim on save is disabled, files are saved unchanged");
            }
            let trimmer = SaveTrimmer::new(&registry);
            for path in &files {
                trim_file(path, &trimmer, out)?;
            }
            Ok(Outcome::Clean)
        }
        Command::Config { action } => {
            let registry = open_registry(&settings)?;
            match action {
                ConfigAction::Show => {}
                ConfigAction::Set { key, value } => {
                    let mut config = registry.config();
                    set_property(&mut config, &key, &value)?;
                    registry
                        .apply(config)
                        .with_context(|| format!("failed to save {}", settings.display()))?;
                }
                ConfigAction::Reset => {
                    registry
                        .apply(StyleConfig::default())
                        .with_context(|| format!("failed to save {}", settings.display()))?;
                }
            }
            for (key, value) in properties(&registry.config()) {
                writeln!(out, "{key} = {value}")?;
            }
            Ok(Outcome::Clean)
        }
    }
}

fn open_registry(path: &Path) -> Result<Rc<ConfigRegistry>> {
    let store = JsonSettingsStore::open(path)
        .with_context(|| format!("failed to open settings {}", path.display()))?;
    Ok(Rc::new(ConfigRegistry::new(store)))
}

fn forced_trim_registry() -> Rc<ConfigRegistry> {
    let mut store = MemorySettingsStore::new();
    store.insert(SETTINGS_COLLECTION, keys::TRIM_ON_SAVE, StoredValue::Bool(true));
    Rc::new(ConfigRegistry::new(store))
}

fn load_document(path: &Path) -> Result<Document> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Document::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))
}

fn check_file<W: Write>(path: &Path, registry: &Rc<ConfigRegistry>, out: &mut W) -> Result<bool> {
    let document = load_document(path)?;
    // Tall and wide enough that every character is laid out.
    let options = ViewOptions {
        rows: document.line_count(),
        columns: usize::MAX,
        ..ViewOptions::default()
    };
    let view = HeadlessView::new(document, options);
    let manager = DecorationManager::attach(Some(view), registry)?;
    let manager = manager.borrow();
    let view = manager.view();
    let Some(canvas) = view.canvas() else {
        return Ok(false);
    };

    let mut found = false;
    for (index, line) in view.laid_out_lines().iter().enumerate() {
        let (mut spaces, mut tabs) = (0, 0);
        for overlay in canvas.in_range(line.range()) {
            match overlay.kind {
                WhitespaceKind::Space => spaces += 1,
                WhitespaceKind::Tab => tabs += 1,
            }
        }
        if spaces + tabs == 0 {
            continue;
        }
        found = true;
        writeln!(
            out,
            "{}:{}: {} trailing ({spaces} spaces, {tabs} tabs)",
            path.display(),
            view.top() + index + 1,
            spaces + tabs,
        )?;
    }
    Ok(found)
}

/// The editor's own save handler: writes the document back to its file.
struct WriteBack {
    path: PathBuf,
    document: Document,
    saved_version: u64,
}

impl CommandTarget for WriteBack {
    type Error = io::Error;

    fn query_status(&mut self, command: HostCommand) -> CommandStatus {
        if command.is_save() {
            CommandStatus::AVAILABLE
        } else {
            CommandStatus::default()
        }
    }

    fn exec(&mut self, command: HostCommand) -> io::Result<()> {
        if !command.is_save() || self.document.version() == self.saved_version {
            return Ok(());
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        self.document.write_to(&mut writer)?;
        writer.flush()?;
        self.saved_version = self.document.version();
        tracing::debug!(path = %self.path.display(), "saved");
        Ok(())
    }
}

fn trim_file<W: Write>(path: &Path, trimmer: &SaveTrimmer, out: &mut W) -> Result<()> {
    let document = load_document(path)?;
    let before = document.char_count();
    let next = WriteBack {
        path: path.to_path_buf(),
        document: document.clone(),
        saved_version: document.version(),
    };

    let mut filter = SaveCommandFilter::new(document.clone(), trimmer.clone(), next);
    filter
        .exec(HostCommand::SaveItem)
        .with_context(|| format!("failed to save {}", path.display()))?;

    let removed = before - document.char_count();
    if removed > 0 {
        writeln!(
            out,
            "{}: removed {removed} trailing whitespace characters",
            path.display()
        )?;
    }
    Ok(())
}

/// Every persisted property of `config`, in [`keys::ALL`] order.
pub fn properties(config: &StyleConfig) -> Vec<(&'static str, String)> {
    vec![
        (keys::SPACES_BACKGROUND_COLOR, config.spaces.background.to_string()),
        (keys::SPACES_BORDER_COLOR, config.spaces.border.to_string()),
        (
            keys::SPACES_BORDER_THICKNESS,
            config.spaces.border_thickness.to_string(),
        ),
        (keys::TABS_BACKGROUND_COLOR, config.tabs.background.to_string()),
        (keys::TABS_BORDER_COLOR, config.tabs.border.to_string()),
        (
            keys::TABS_BORDER_THICKNESS,
            config.tabs.border_thickness.to_string(),
        ),
        (keys::TRIM_ON_SAVE, config.trim_on_save.to_string()),
    ]
}

/// Set the property named `key` (case-insensitive) from its string form.
pub fn set_property(config: &mut StyleConfig, key: &str, value: &str) -> Result<()> {
    let Some(key) = keys::ALL
        .into_iter()
        .find(|known| known.eq_ignore_ascii_case(key))
    else {
        bail!("unknown setting '{key}' (expected one of: {})", keys::ALL.join(", "));
    };

    let color = || -> Result<Color> {
        value
            .parse()
            .with_context(|| format!("invalid color for {key}: '{value}'"))
    };
    let thickness = || -> Result<f64> {
        let parsed: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("invalid thickness for {key}: '{value}'"))?;
        if !parsed.is_finite() || parsed < 0.0 {
            bail!("{key} must be a finite, non-negative number");
        }
        Ok(parsed)
    };

    match key {
        keys::SPACES_BACKGROUND_COLOR => config.spaces.background = color()?,
        keys::SPACES_BORDER_COLOR => config.spaces.border = color()?,
        keys::SPACES_BORDER_THICKNESS => config.spaces.border_thickness = thickness()?,
        keys::TABS_BACKGROUND_COLOR => config.tabs.background = color()?,
        keys::TABS_BORDER_COLOR => config.tabs.border = color()?,
        keys::TABS_BORDER_THICKNESS => config.tabs.border_thickness = thickness()?,
        keys::TRIM_ON_SAVE => {
            config.trim_on_save = value
                .trim()
                .to_ascii_lowercase()
                .parse()
                .with_context(|| format!("invalid flag for {key}: '{value}' (use true/false)"))?;
        }
        _ => bail!("setting '{key}' cannot be changed here"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_property() {
        let mut config = StyleConfig::default();
        set_property(&mut config, "tabsbordercolor", "#80102030").unwrap();
        assert_eq!(config.tabs.border, Color::from_argb(0x80, 0x10, 0x20, 0x30));

        set_property(&mut config, keys::SPACES_BORDER_THICKNESS, "2.5").unwrap();
        assert_eq!(config.spaces.border_thickness, 2.5);

        set_property(&mut config, keys::TRIM_ON_SAVE, "True").unwrap();
        assert!(config.trim_on_save);
    }

    #[test]
    fn test_set_property_rejects_bad_input() {
        let mut config = StyleConfig::default();
        assert!(set_property(&mut config, "NoSuchKey", "1").is_err());
        assert!(set_property(&mut config, keys::TABS_BORDER_THICKNESS, "-1").is_err());
        assert!(set_property(&mut config, keys::TABS_BORDER_COLOR, "mauve-ish").is_err());
        assert!(set_property(&mut config, keys::TRIM_ON_SAVE, "maybe").is_err());
        assert_eq!(config, StyleConfig::default());
    }

    #[test]
    fn test_forced_trim_registry_enables_trim_only() {
        let config = forced_trim_registry().config();
        assert!(config.trim_on_save);
        assert_eq!(config.spaces, StyleConfig::default().spaces);
        assert_eq!(config.tabs, StyleConfig::default().tabs);
    }

    #[test]
    fn test_properties_cover_every_key() {
        let names: Vec<_> = properties(&StyleConfig::default())
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, keys::ALL.to_vec());
    }
}

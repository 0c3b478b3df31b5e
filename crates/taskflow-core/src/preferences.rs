use std::collections::{
  BTreeMap,
  BTreeSet
};
use std::fs;
use std::io::Write;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tempfile::NamedTempFile;
use tracing::{
  debug,
  error,
  info
};

pub const DARK_MODE_KEY: &str =
  "darkMode";

/// Durable string key/value preferences.
/// With a backing file every `set` is
/// written through atomically; without one
/// values live for the process only.
#[derive(Debug, Clone, Default)]
pub struct Preferences {
  path:   Option<PathBuf>,
  values: BTreeMap<String, String>
}

impl Preferences {
  #[must_use]
  pub fn in_memory() -> Self {
    Self::default()
  }

  /// Opens the preference file at `path`,
  /// starting empty if it does not exist
  /// yet. A file that fails to parse is
  /// logged and treated as empty.
  #[tracing::instrument(skip(path), fields(path = %path.display()))]
  pub fn open(
    path: &Path
  ) -> anyhow::Result<Self> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)
        .with_context(|| {
          format!(
            "failed to create {}",
            parent.display()
          )
        })?;
    }

    let values = if path.exists() {
      let raw = fs::read_to_string(path)
        .with_context(|| {
          format!(
            "failed reading {}",
            path.display()
          )
        })?;
      match serde_json::from_str::<
        BTreeMap<String, String>
      >(&raw)
      {
        | Ok(values) => values,
        | Err(err) => {
          error!(
            error = %err,
            "failed parsing preference \
             file; starting empty"
          );
          BTreeMap::new()
        }
      }
    } else {
      BTreeMap::new()
    };

    info!(
      keys = values.len(),
      "opened preferences"
    );
    Ok(Self {
      path: Some(path.to_path_buf()),
      values
    })
  }

  #[must_use]
  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  #[must_use]
  pub fn get(
    &self,
    key: &str
  ) -> Option<&str> {
    self.values.get(key).map(String::as_str)
  }

  /// Only the literal `"true"` reads as
  /// true.
  #[must_use]
  pub fn get_bool(
    &self,
    key: &str
  ) -> bool {
    self.get(key) == Some("true")
  }

  #[tracing::instrument(skip(self))]
  pub fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> anyhow::Result<()> {
    let mut next = self.values.clone();
    next.insert(
      key.to_string(),
      value.to_string()
    );
    self.flush(&next)?;
    self.values = next;
    debug!("preference updated");
    Ok(())
  }

  pub fn set_bool(
    &mut self,
    key: &str,
    value: bool
  ) -> anyhow::Result<()> {
    self.set(
      key,
      if value { "true" } else { "false" }
    )
  }

  fn flush(
    &self,
    values: &BTreeMap<String, String>
  ) -> anyhow::Result<()> {
    let Some(path) = self.path.as_deref()
    else {
      return Ok(());
    };

    let dir = path
      .parent()
      .filter(|p| {
        !p.as_os_str().is_empty()
      })
      .unwrap_or_else(|| Path::new("."));
    let mut temp =
      NamedTempFile::new_in(dir)?;
    let json =
      serde_json::to_string_pretty(
        values
      )?;
    writeln!(temp, "{json}")?;
    temp.flush()?;
    temp.persist(path).map_err(|err| {
      anyhow!(
        "failed to persist {}: {}",
        path.display(),
        err
      )
    })?;
    Ok(())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum ThemeMode {
  #[default]
  Light,
  Dark
}

impl ThemeMode {
  pub const DARK_CLASS: &'static str =
    "dark";

  #[must_use]
  pub fn from_dark(dark: bool) -> Self {
    if dark { Self::Dark } else { Self::Light }
  }

  #[must_use]
  pub fn is_dark(self) -> bool {
    self == Self::Dark
  }

  #[must_use]
  pub fn next(self) -> Self {
    match self {
      | Self::Light => Self::Dark,
      | Self::Dark => Self::Light
    }
  }
}

/// Class list on the document root; the
/// theme is expressed through the `dark`
/// class.
#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct RootClasses {
  classes: BTreeSet<String>
}

impl RootClasses {
  pub fn apply_theme(
    &mut self,
    theme: ThemeMode
  ) {
    if theme.is_dark() {
      self.classes.insert(
        ThemeMode::DARK_CLASS.to_string()
      );
    } else {
      self
        .classes
        .remove(ThemeMode::DARK_CLASS);
    }
  }

  #[must_use]
  pub fn contains(
    &self,
    class: &str
  ) -> bool {
    self.classes.contains(class)
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = &str> {
    self.classes.iter().map(String::as_str)
  }
}

#[cfg(test)]
mod tests {
  use tempfile::tempdir;

  use super::{
    DARK_MODE_KEY,
    Preferences,
    RootClasses,
    ThemeMode
  };

  #[test]
  fn values_survive_reopen() {
    let temp = tempdir().expect("tempdir");
    let path = temp
      .path()
      .join("nested")
      .join("preferences.json");

    let mut prefs = Preferences::open(&path)
      .expect("open preferences");
    assert!(!prefs.get_bool(DARK_MODE_KEY));
    prefs
      .set_bool(DARK_MODE_KEY, true)
      .expect("persist");

    let reopened = Preferences::open(&path)
      .expect("reopen preferences");
    assert_eq!(
      reopened.get(DARK_MODE_KEY),
      Some("true")
    );
    assert!(reopened.get_bool(DARK_MODE_KEY));
  }

  #[test]
  fn corrupt_file_reads_as_empty() {
    let temp = tempdir().expect("tempdir");
    let path =
      temp.path().join("preferences.json");
    std::fs::write(&path, "not json")
      .expect("write");

    let prefs = Preferences::open(&path)
      .expect("open preferences");
    assert_eq!(prefs.get(DARK_MODE_KEY), None);
  }

  #[test]
  fn failed_write_leaves_values_unchanged() {
    let temp = tempdir().expect("tempdir");
    let dir = temp.path().join("gone");
    let mut prefs = Preferences::open(
      &dir.join("preferences.json")
    )
    .expect("open preferences");
    std::fs::remove_dir_all(&dir)
      .expect("remove dir");

    assert!(
      prefs
        .set_bool(DARK_MODE_KEY, true)
        .is_err()
    );
    assert_eq!(prefs.get(DARK_MODE_KEY), None);
  }

  #[test]
  fn in_memory_never_touches_disk() {
    let mut prefs = Preferences::in_memory();
    prefs
      .set_bool(DARK_MODE_KEY, false)
      .expect("set");
    assert!(prefs.path().is_none());
    assert_eq!(
      prefs.get(DARK_MODE_KEY),
      Some("false")
    );
  }

  #[test]
  fn theme_toggles_dark_class() {
    let mut root = RootClasses::default();
    root.apply_theme(ThemeMode::Dark);
    assert!(root.contains("dark"));
    root.apply_theme(
      ThemeMode::Dark.next()
    );
    assert!(!root.contains("dark"));
    assert_eq!(root.iter().count(), 0);
  }
}

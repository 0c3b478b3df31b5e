use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::filters::{
  SortKey,
  TaskFilter
};

pub const RC_ENV_VAR: &str =
  "TASKFLOWRC";
pub const MEMORY_PREFERENCES: &str =
  "memory";
pub const MAX_LATENCY_SCALE: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct Config {
  map:              HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "latency.scale".to_string(),
      "1.0".to_string()
    );
    map.insert(
      "view.sort".to_string(),
      "dueDate".to_string()
    );
    map.insert(
      "view.filter".to_string(),
      "all".to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading taskflowrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no taskflowrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  /// Multiplier on the simulated service
  /// latency. Zero switches it off.
  pub fn latency_scale(
    &self
  ) -> anyhow::Result<f64> {
    let raw = self
      .get("latency.scale")
      .unwrap_or_else(|| "1.0".to_string());
    let scale: f64 =
      raw.trim().parse().map_err(|_| {
        anyhow!(
          "invalid latency.scale: {raw}"
        )
      })?;
    if !scale.is_finite() || scale < 0.0 {
      return Err(anyhow!(
        "latency.scale must be a \
         non-negative number, got {raw}"
      ));
    }
    if scale > MAX_LATENCY_SCALE {
      return Err(anyhow!(
        "latency.scale must be at most \
         {MAX_LATENCY_SCALE}, got {raw}"
      ));
    }
    Ok(scale)
  }

  pub fn initial_sort(&self) -> SortKey {
    self
      .get("view.sort")
      .map(|raw| SortKey::parse(&raw))
      .unwrap_or_default()
  }

  pub fn initial_filter(
    &self
  ) -> TaskFilter {
    self
      .get("view.filter")
      .map(|raw| TaskFilter::parse(&raw))
      .unwrap_or_default()
  }

  pub fn fixtures_dir(
    &self
  ) -> Option<PathBuf> {
    self
      .get("fixtures.location")
      .filter(|v| !v.trim().is_empty())
      .map(|v| expand_tilde(Path::new(v.trim())))
  }

  pub fn display_timezone(
    &self
  ) -> Option<String> {
    self.get("display.timezone")
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    let path = fs::canonicalize(&path)
      .unwrap_or(path);
    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (idx, raw_line) in
      text.lines().enumerate()
    {
      match parse_rc_line(raw_line) {
        | RcLine::Blank => {}
        | RcLine::Include(target) => {
          let include_path =
            resolve_include_path(
              &base_dir, target
            )?;
          if !include_path.exists() {
            warn!(include = %include_path.display(), "include file does not exist; skipping");
            continue;
          }
          let canonical =
            fs::canonicalize(&include_path)
              .unwrap_or_else(|_| {
                include_path.clone()
              });
          if self
            .loaded_files
            .contains(&canonical)
          {
            warn!(
              file = %path.display(),
              include = %canonical.display(),
              "include already loaded; skipping"
            );
          } else {
            debug!(
              file = %path.display(),
              include = %include_path.display(),
              "following include"
            );
            self
              .load_file(&include_path)?;
          }
        }
        | RcLine::Entry(key, value) => {
          trace!(key, value, "loaded config key");
          self.map.insert(
            key.to_string(),
            value.to_string()
          );
        }
        | RcLine::Invalid => {
          return Err(anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            idx + 1,
            raw_line
          ));
        }
      }
    }

    Ok(())
  }
}

enum RcLine<'a> {
  Blank,
  Include(&'a str),
  Entry(&'a str, &'a str),
  Invalid
}

fn parse_rc_line(raw: &str) -> RcLine<'_> {
  let line = raw
    .split_once('#')
    .map_or(raw, |(before, _)| before)
    .trim();
  if line.is_empty() {
    return RcLine::Blank;
  }
  if let Some(target) =
    line.strip_prefix("include ")
  {
    return RcLine::Include(target.trim());
  }
  match line.split_once('=') {
    | Some((k, v)) => {
      RcLine::Entry(k.trim(), v.trim())
    }
    | None => RcLine::Invalid
  }
}

/// `None` means preferences are kept in
/// memory for this process only.
#[tracing::instrument(skip(cfg))]
pub fn resolve_preferences_path(
  cfg: &Config
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(value) =
    cfg.get("preferences.location")
  {
    let trimmed = value.trim();
    if trimmed == MEMORY_PREFERENCES {
      return Ok(None);
    }
    if !trimmed.is_empty() {
      return Ok(Some(expand_tilde(
        Path::new(trimmed)
      )));
    }
  }

  let base = dirs::config_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine config \
         directory"
      )
    })?;
  Ok(Some(
    base
      .join("taskflow")
      .join("preferences.json")
  ))
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping taskflowrc"
    );
    return Ok(None);
  };
  let candidate =
    home.join(".taskflowrc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::{
    Config,
    resolve_preferences_path
  };
  use crate::filters::{
    SortKey,
    TaskFilter
  };

  #[test]
  fn defaults_without_file() {
    let cfg = Config::default();
    assert_eq!(
      cfg.latency_scale().expect("scale"),
      1.0
    );
    assert_eq!(
      cfg.initial_sort(),
      SortKey::DueDate
    );
    assert_eq!(
      cfg.initial_filter(),
      TaskFilter::All
    );
    assert_eq!(cfg.get_bool("color"), Some(true));
    assert!(cfg.fixtures_dir().is_none());
  }

  #[test]
  fn file_with_include_and_overrides() {
    let temp = tempdir().expect("tempdir");
    let extra = temp.path().join("extra.rc");
    fs::write(
      &extra,
      "display.timezone = Europe/Berlin\n"
    )
    .expect("write include");

    let rc = temp.path().join("taskflowrc");
    fs::write(
      &rc,
      "# comment\nlatency.scale = 0 # off\nview.sort = priority\ninclude extra.rc\n"
    )
    .expect("write rc");

    let mut cfg = Config::load(Some(&rc))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 2);
    assert_eq!(
      cfg.latency_scale().expect("scale"),
      0.0
    );
    assert_eq!(
      cfg.initial_sort(),
      SortKey::Priority
    );
    assert_eq!(
      cfg.display_timezone().as_deref(),
      Some("Europe/Berlin")
    );

    cfg.apply_overrides(vec![(
      "rc.view.filter".to_string(),
      "urgent".to_string()
    )]);
    assert_eq!(
      cfg.initial_filter(),
      TaskFilter::Urgent
    );
  }

  #[test]
  fn rejects_malformed_lines_and_scales() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("taskflowrc");
    fs::write(&rc, "no equals sign here\n")
      .expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());

    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "latency.scale".to_string(),
      "-2".to_string()
    )]);
    assert!(cfg.latency_scale().is_err());
  }

  #[test]
  fn self_include_is_read_once() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("a.rc");
    fs::write(
      &rc,
      "include a.rc\nview.sort = status\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(&rc))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 1);
    assert_eq!(
      cfg.initial_sort(),
      SortKey::Status
    );
  }

  #[test]
  fn include_cycle_between_files_terminates()
   {
    let temp = tempdir().expect("tempdir");
    let a = temp.path().join("a.rc");
    let b = temp.path().join("b.rc");
    fs::write(&a, "include b.rc\n")
      .expect("write a");
    fs::write(
      &b,
      "include a.rc\nview.filter = completed\n"
    )
    .expect("write b");

    let cfg = Config::load(Some(&a))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 2);
    assert_eq!(
      cfg.initial_filter(),
      TaskFilter::Completed
    );
  }

  #[test]
  fn caps_latency_scale() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "latency.scale".to_string(),
      "1e20".to_string()
    )]);
    let err = cfg
      .latency_scale()
      .expect_err("too large");
    assert!(
      err.to_string().contains("at most")
    );

    cfg.apply_overrides(vec![(
      "latency.scale".to_string(),
      "100".to_string()
    )]);
    assert_eq!(
      cfg.latency_scale().expect("at cap"),
      100.0
    );
  }

  #[test]
  fn memory_preferences_have_no_path() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "preferences.location".to_string(),
      "memory".to_string()
    )]);
    assert_eq!(
      resolve_preferences_path(&cfg)
        .expect("resolve"),
      None
    );

    cfg.apply_overrides(vec![(
      "preferences.location".to_string(),
      "/tmp/taskflow-prefs.json".to_string()
    )]);
    assert_eq!(
      resolve_preferences_path(&cfg)
        .expect("resolve")
        .as_deref(),
      Some(std::path::Path::new(
        "/tmp/taskflow-prefs.json"
      ))
    );
  }
}

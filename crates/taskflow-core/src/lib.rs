pub mod app;
pub mod cli;
pub mod config;
pub mod datetime;
pub mod editor;
pub mod error;
pub mod filters;
pub mod fixtures;
pub mod list_view;
pub mod preferences;
pub mod record;
pub mod render;
pub mod service;
pub mod store;
pub mod view;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::app::App;
use crate::filters::{
  SortKey,
  TaskFilter
};
use crate::render::Renderer;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskflow"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .iter()
      .map(|kv| {
        (kv.key.clone(), kv.value.clone())
      })
  );

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_time()
      .build()
      .context(
        "failed to build async runtime"
      )?;

  runtime.block_on(session(&cfg, &cli))?;

  info!("done");
  Ok(())
}

async fn session(
  cfg: &config::Config,
  cli: &cli::GlobalCli
) -> anyhow::Result<()> {
  let mut app = App::start(cfg)?;

  if let Err(err) = app.view.load_data().await {
    warn!(error = %err, "rendering without data");
  }

  if let Some(raw) = cli.filter.as_deref() {
    app
      .view
      .set_active_filter(TaskFilter::parse(raw));
  }
  if let Some(raw) = cli.sort.as_deref() {
    app.list.sort = SortKey::parse(raw);
  }
  if let Some(search) = cli.search.as_deref()
  {
    app.list.search = search.to_string();
  }
  if cli.toggle_dark {
    let dark = app.view.toggle_dark_mode()?;
    debug!(dark, "theme toggled from cli");
  }

  let tz = datetime::resolve_display_timezone(
    cfg.display_timezone().as_deref()
  );
  let renderer = Renderer::new(cfg, tz);
  renderer.render_dashboard(
    io::stdout().lock(),
    &app.view,
    &app.list,
    Utc::now()
  )?;

  app.stop();
  Ok(())
}

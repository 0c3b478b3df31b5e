use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::{
  Config,
  resolve_preferences_path
};
use crate::fixtures::Fixtures;
use crate::list_view::TaskListView;
use crate::preferences::Preferences;
use crate::service::Services;
use crate::store::Store;
use crate::view::ViewState;

/// One running session: the seeded store,
/// the page controller on top of it and
/// the list view's local state.
#[derive(Debug)]
pub struct App {
  pub store: Arc<Store>,
  pub view:  ViewState<Services>,
  pub list:  TaskListView
}

impl App {
  #[tracing::instrument(skip(cfg))]
  pub fn start(
    cfg: &Config
  ) -> anyhow::Result<Self> {
    let fixtures_dir = cfg.fixtures_dir();
    let fixtures =
      Fixtures::load(fixtures_dir.as_deref())
        .context(
          "failed to load seed fixtures"
        )?;
    let store = Store::seed(fixtures);

    let preferences =
      match resolve_preferences_path(cfg)? {
        | Some(path) => {
          Preferences::open(&path)
            .with_context(|| {
              format!(
                "failed to open preferences \
                 at {}",
                path.display()
              )
            })?
        }
        | None => Preferences::in_memory()
      };

    let services = Services::new(
      Arc::clone(&store),
      cfg.latency_scale()?
    );
    let mut view =
      ViewState::new(services, preferences);
    view.set_active_filter(
      cfg.initial_filter()
    );
    let list =
      TaskListView::new(cfg.initial_sort());

    info!(
      tasks = store.tasks().len(),
      categories = store.categories().len(),
      users = store.users().len(),
      "session started"
    );

    Ok(Self { store, view, list })
  }

  /// Ends the session. Nothing in the store
  /// outlives it.
  pub fn stop(self) {
    info!(
      tasks = self.store.tasks().len(),
      categories =
        self.store.categories().len(),
      "session stopped"
    );
  }
}

//! CLI runner - executes discovery or sync

use crate::catalog::{Catalog, CatalogEntry};
use crate::cli::commands::Cli;
use crate::config::TapConfig;
use crate::engine::{FailureReporter, LogReporter, SyncEngine};
use crate::error::{Error, Result};
use crate::output::{JsonLinesWriter, MessageSink};
use crate::schema::SchemaLoader;
use crate::state::{State, StateManager};
use crate::streams::StreamDescriptor;
use std::io::Write;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run discovery or sync, writing to stdout
    ///
    /// Every failure is reported once before it is returned; the caller only
    /// decides the exit status.
    pub async fn run(&self) -> Result<()> {
        let result = if self.cli.discover {
            self.discover()
        } else {
            let mut out = JsonLinesWriter::stdout();
            self.sync_to(&mut out).await.map(|_| ())
        };

        // The engine already reported failures of the streams it ran
        if let Err(ref e) = result {
            if !matches!(e, Error::StreamFailed { .. }) {
                LogReporter.report_failure(e);
            }
        }
        result
    }

    /// Load configuration, inline JSON taking precedence over the file
    pub fn load_config(&self) -> Result<TapConfig> {
        if let Some(json) = &self.cli.config_json {
            return TapConfig::from_json(json);
        }
        match &self.cli.config {
            Some(path) => TapConfig::from_file(path),
            None => Err(Error::config("No configuration given")),
        }
    }

    /// Load state; without `--state` the run starts from scratch
    async fn load_state(&self) -> Result<StateManager> {
        let manager = match &self.cli.state {
            Some(path) => StateManager::from_file(path)?,
            None => StateManager::in_memory(),
        };
        // Never write back over the input state unless asked to
        Ok(match &self.cli.state_output {
            Some(path) => manager.persist_to(path),
            None => StateManager::with_state(manager.snapshot().await),
        })
    }

    /// Bundled schemas, overridden by `--schemas-dir`
    fn schema_loader(&self) -> SchemaLoader {
        match &self.cli.schemas_dir {
            Some(dir) => SchemaLoader::with_overrides(dir),
            None => SchemaLoader::bundled(),
        }
    }

    /// Catalog given by `--catalog`, or every stream selected
    fn load_catalog(&self) -> Result<Catalog> {
        if let Some(path) = &self.cli.catalog {
            return Catalog::from_file(path);
        }
        let mut catalog = Catalog::discover(&self.schema_loader())?;
        catalog.streams.iter_mut().for_each(CatalogEntry::select);
        Ok(catalog)
    }

    /// Describe every stream
    pub fn discover_catalog(&self) -> Result<Catalog> {
        self.load_config()?;
        info!("Starting discovery");
        let catalog = Catalog::discover(&self.schema_loader())?;
        info!(streams = catalog.streams.len(), "Finished discovery");
        Ok(catalog)
    }

    fn discover(&self) -> Result<()> {
        let catalog = self.discover_catalog()?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", catalog.to_json_pretty()?)?;
        stdout.flush()?;
        Ok(())
    }

    /// Sync the selected streams into `sink` and return the final state
    ///
    /// With `--state-output` the final state is written there even when a
    /// stream fails, so bookmarks of completed streams are kept.
    pub async fn sync_to(&self, sink: &mut dyn MessageSink) -> Result<State> {
        let config = self.load_config()?;
        let manager = self.load_state().await?;
        let mut state = manager.snapshot().await;

        let streams = self.streams_to_sync(&state)?;
        info!(
            streams = ?streams.iter().map(|d| d.stream_id).collect::<Vec<_>>(),
            resuming = state.currently_syncing.as_deref().unwrap_or("-"),
            "Selected streams"
        );

        let mut engine = SyncEngine::new(config)?.with_schemas(self.schema_loader());
        let result = engine.sync_all(&streams, &mut state, sink).await;

        manager.checkpoint(state.clone()).await?;
        if !manager.is_in_memory() {
            info!(path = %manager.path().display(), "Wrote final state");
        }

        result.map(|_| state)
    }

    fn streams_to_sync(&self, state: &State) -> Result<Vec<&'static StreamDescriptor>> {
        self.load_catalog()?
            .resume_order(state.currently_syncing.as_deref())
    }
}

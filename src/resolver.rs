//! Filename-driven entry lookup.
//!
//! Files are named after their shot, prefixed by the project code
//! (`SNJ_EP01_sc001_v3.nk`). The resolver maps such a name to the project
//! database, then to the task entry of a given pipeline.

use crate::cache::ResolveCache;
use crate::client::Client;
use crate::error::{Error, Result};
use crate::filter::Field;
use crate::public;
use crate::selection::Entry;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Maps a project code to the filename prefix it appears as.
pub type PrefixFilter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Extracts the shot name from a filename.
pub type ShotParser = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Entry cache key: `(filename, pipeline, module)`.
pub type EntryKey = (String, String, String);

/// Default shot parser: the file stem without a trailing `_v<digits>`.
pub fn default_shot_name(filename: &str) -> String {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    match stem.rfind("_v") {
        Some(pos) => {
            let version = &stem[pos + 2..];
            if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) {
                stem[..pos].to_string()
            } else {
                stem
            }
        }
        None => stem,
    }
}

/// Resolves filenames to databases and entries, memoising both.
pub struct EntryResolver {
    client: Client,
    prefix_filters: Vec<PrefixFilter>,
    shot_parser: ShotParser,
    projects: ResolveCache<(), Vec<(String, String)>>,
    entries: ResolveCache<EntryKey, Entry>,
}

impl std::fmt::Debug for EntryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryResolver")
            .field("client", &self.client)
            .field("prefix_filters", &self.prefix_filters.len())
            .field("entries", &self.entries)
            .finish()
    }
}

impl EntryResolver {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            prefix_filters: Vec::new(),
            shot_parser: Arc::new(default_shot_name),
            projects: ResolveCache::default(),
            entries: ResolveCache::default(),
        }
    }

    /// Use `cache` for entries, e.g. one shared with another resolver.
    pub fn with_entry_cache(mut self, cache: ResolveCache<EntryKey, Entry>) -> Self {
        self.entries = cache;
        self
    }

    /// Append a prefix filter. Filters run in the order added.
    pub fn with_prefix_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.prefix_filters.push(Arc::new(filter));
        self
    }

    pub fn with_shot_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.shot_parser = Arc::new(parser);
        self
    }

    pub fn entry_cache(&self) -> &ResolveCache<EntryKey, Entry> {
        &self.entries
    }

    /// Filename prefix for project `code`.
    pub fn prefix(&self, code: &str) -> String {
        self.prefix_filters
            .iter()
            .fold(code.to_string(), |acc, filter| filter(&acc))
    }

    /// `(code, database)` of every active project. Fetched once.
    pub async fn project_data(&self) -> Result<Vec<(String, String)>> {
        let client = self.client.clone();
        self.projects
            .get_or_try_init((), || async move {
                let result = public::project(&client)
                    .all()
                    .await?
                    .get_fields(&["code", "database"])
                    .await?;
                let projects: Vec<(String, String)> = result
                    .iter()
                    .map(|row| (row[0].to_plain_string(), row[1].to_plain_string()))
                    .collect();
                debug!(projects = projects.len(), "Loaded project data");
                Ok(projects)
            })
            .await
    }

    /// Database of the first project whose prefix starts `filename`.
    #[instrument(skip(self))]
    pub async fn get_database(&self, filename: &str) -> Result<String> {
        let name = Path::new(filename)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());

        self.project_data()
            .await?
            .into_iter()
            .find(|(code, _)| name.starts_with(&self.prefix(code)))
            .map(|(_, database)| database)
            .ok_or_else(|| Error::CannotDetermineTarget(filename.to_string()))
    }

    /// Task entry of `pipeline` for the shot named by `filename`, in the
    /// `shot` module.
    pub async fn get_entry(&self, filename: &str, pipeline: &str) -> Result<Entry> {
        self.get_entry_in(filename, pipeline, "shot").await
    }

    /// Like [`get_entry`](Self::get_entry) with an explicit module.
    ///
    /// Cached per `(filename, pipeline, module)`.
    #[instrument(skip(self))]
    pub async fn get_entry_in(&self, filename: &str, pipeline: &str, module: &str) -> Result<Entry> {
        let key = (filename.to_string(), pipeline.to_string(), module.to_string());
        self.entries
            .get_or_try_init(key, || async move {
                let database = self.get_database(filename).await?;
                let shot = (self.shot_parser)(filename);

                let filters = Field::new("pipeline")
                    .eq(pipeline)
                    .and(Field::new("shot.shot").eq(shot.as_str()));
                let selection = self
                    .client
                    .database(database.as_str())
                    .module(module)
                    .filter(filters)
                    .await?;

                let account_id = self.client.account_id().unwrap_or_default();
                let entry = selection.to_entry(account_id).await?;
                info!(
                    database = %database,
                    shot = %shot,
                    id = %entry.id(),
                    "Resolved entry"
                );
                Ok(entry)
            })
            .await
    }
}

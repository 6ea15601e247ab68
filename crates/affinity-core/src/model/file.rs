//! Data model backed by a comma-separated preference file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use super::{DataModel, GenericDataModel, Item, ItemId, Preference, User, UserId};
use crate::common::{RefreshLock, Refreshable};
use crate::error::{Error, Result};

/// A [`DataModel`] read from `user,item,value` lines.
///
/// Ids are taken literally, so surrounding whitespace is part of the id.
/// Lines starting with `#` are comments. The file is read on first access
/// and re-read on [`Refreshable::refresh`]. Writes go to the in-memory copy
/// only and are lost on the next reload.
pub struct FileDataModel {
    path: PathBuf,
    delegate: RwLock<Option<Arc<GenericDataModel>>>,
    reload_lock: RefreshLock,
}

impl FileDataModel {
    /// Creates a model for `path` without reading it yet.
    ///
    /// # Errors
    ///
    /// Returns an IO error if `path` is not an existing file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("preference file not found: {}", path.display()),
            )));
        }
        info!(path = %path.display(), "creating file data model");
        Ok(Self {
            path,
            delegate: RwLock::new(None),
            reload_lock: RefreshLock::new(),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn delegate(&self) -> Result<Arc<GenericDataModel>> {
        if let Some(model) = self.delegate.read().as_ref() {
            return Ok(Arc::clone(model));
        }
        let mut slot = self.delegate.write();
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(self.load()?);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    fn load(&self) -> Result<GenericDataModel> {
        info!(path = %self.path.display(), "reading preference file");
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_path(&self.path)
            .map_err(csv_error)?;

        let mut triples = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let line = record.position().map_or(0, csv::Position::line);
            triples.push(parse_record(&record, line)?);
        }
        info!(preferences = triples.len(), "preference file loaded");
        GenericDataModel::from_preferences(triples)
    }
}

fn parse_record(record: &csv::StringRecord, line: u64) -> Result<(UserId, ItemId, f64)> {
    if record.len() != 3 {
        return Err(Error::Parse {
            line,
            message: format!("expected user,item,value but found {} fields", record.len()),
        });
    }
    let value: f64 = record[2].trim().parse().map_err(|_| Error::Parse {
        line,
        message: format!("invalid preference value '{}'", &record[2]),
    })?;
    if value.is_nan() {
        return Err(Error::Parse {
            line,
            message: "preference value must not be NaN".into(),
        });
    }
    Ok((UserId::from(&record[0]), ItemId::from(&record[1]), value))
}

fn csv_error(err: csv::Error) -> Error {
    let line = err.position().map_or(0, csv::Position::line);
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        _ => Error::Parse { line, message },
    }
}

impl std::fmt::Debug for FileDataModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDataModel")
            .field("path", &self.path)
            .field("loaded", &self.delegate.read().is_some())
            .finish()
    }
}

impl Refreshable for FileDataModel {
    fn refresh(&self) {
        self.reload_lock.run(|| match self.load() {
            Ok(model) => *self.delegate.write() = Some(Arc::new(model)),
            Err(err) => warn!(
                path = %self.path.display(),
                error = %err,
                "reload failed, keeping previous data"
            ),
        });
    }
}

impl DataModel for FileDataModel {
    fn users(&self) -> Result<Arc<[Arc<User>]>> {
        self.delegate()?.users()
    }

    fn user(&self, id: &UserId) -> Result<Arc<User>> {
        self.delegate()?.user(id)
    }

    fn items(&self) -> Result<Arc<[Arc<Item>]>> {
        self.delegate()?.items()
    }

    fn item(&self, id: &ItemId) -> Result<Arc<Item>> {
        self.delegate()?.item(id)
    }

    fn preferences_for_item(&self, item: &ItemId) -> Result<Arc<[Preference]>> {
        self.delegate()?.preferences_for_item(item)
    }

    fn num_users(&self) -> Result<usize> {
        self.delegate()?.num_users()
    }

    fn num_items(&self) -> Result<usize> {
        self.delegate()?.num_items()
    }

    fn set_preference(&self, user: &UserId, item: &ItemId, value: f64) -> Result<()> {
        self.delegate()?.set_preference(user, item, value)
    }

    fn remove_preference(&self, user: &UserId, item: &ItemId) -> Result<()> {
        self.delegate()?.remove_preference(user, item)
    }
}

//! Drive folders ("collections").

use gdrive_sheets_protocol::{mime, File as FileResource, FILE_FIELDS};

use crate::error::{Error, Result};
use crate::file::{DriveItem, File};
use crate::query::Query;
use crate::session::{FileListOptions, UploadOptions};
use crate::spreadsheet::Spreadsheet;
use crate::transport::{Method, RequestBody};

/// A Drive folder
#[derive(Debug, Clone)]
pub struct Collection<'s> {
    file: File<'s>,
    root: bool,
}

impl<'s> Collection<'s> {
    pub(crate) fn new(file: File<'s>) -> Self {
        Self { file, root: false }
    }

    pub(crate) fn root(file: File<'s>) -> Self {
        Self { file, root: true }
    }

    pub fn id(&self) -> &str {
        self.file.id()
    }

    pub fn title(&self) -> &str {
        self.file.title()
    }

    /// Whether this is the root folder ("My Drive")
    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn as_file(&self) -> &File<'s> {
        &self.file
    }

    pub fn into_file(self) -> File<'s> {
        self.file
    }

    // -- Listing --

    /// Direct children, optionally narrowed by `query`.
    pub fn files(&self, query: Option<Query>) -> Result<Vec<DriveItem<'s>>> {
        let q = Query::in_parents(self.id());
        let q = match query {
            Some(extra) => q.and(extra),
            None => q,
        };
        self.file.session().files(&FileListOptions::matching(q))
    }

    pub fn spreadsheets(&self) -> Result<Vec<Spreadsheet<'s>>> {
        Ok(self
            .files(Some(Query::mime_type_eq(mime::SPREADSHEET)))?
            .into_iter()
            .filter_map(DriveItem::into_spreadsheet)
            .collect())
    }

    pub fn subcollections(&self) -> Result<Vec<Collection<'s>>> {
        Ok(self
            .files(Some(Query::mime_type_eq(mime::FOLDER)))?
            .into_iter()
            .filter_map(DriveItem::into_collection)
            .collect())
    }

    /// First direct child named `title`
    pub fn file_by_title(&self, title: &str) -> Result<Option<DriveItem<'s>>> {
        Ok(self.files(Some(Query::name_eq(title)))?.into_iter().next())
    }

    /// First direct subfolder named `title`
    pub fn subcollection_by_title(&self, title: &str) -> Result<Option<Collection<'s>>> {
        Ok(self
            .files(Some(
                Query::name_eq(title).and(Query::mime_type_eq(mime::FOLDER)),
            ))?
            .into_iter()
            .find_map(DriveItem::into_collection))
    }

    // -- Membership --

    /// Put `file` into this folder (it stays in its other folders).
    pub fn add(&self, file: &mut File<'s>) -> Result<()> {
        self.change_parents(file, "addParents")
    }

    /// Take `file` out of this folder.
    pub fn remove(&self, file: &mut File<'s>) -> Result<()> {
        self.change_parents(file, "removeParents")
    }

    fn change_parents(&self, file: &mut File<'s>, param: &str) -> Result<()> {
        let session = self.file.session();
        let mut url = session.drive_url(&["files", file.id()])?;
        url.query_pairs_mut()
            .append_pair(param, self.id())
            .append_pair("fields", FILE_FIELDS);

        tracing::debug!("{param}={} on '{}'", self.id(), file.title());
        let response = session.execute(Method::Patch, url, RequestBody::Json(serde_json::json!({})))?;
        let resource: FileResource = serde_json::from_slice(&response.body)?;
        *file = File::new(session, resource);
        Ok(())
    }

    // -- Creation --

    pub fn create_subcollection(&self, title: &str) -> Result<Collection<'s>> {
        self.file
            .session()
            .create_file_in(title, mime::FOLDER, Some(self.id()))?
            .into_collection()
            .ok_or_else(|| Error::UnexpectedResponse("created file is not a folder".into()))
    }

    pub fn create_spreadsheet(&self, title: &str) -> Result<Spreadsheet<'s>> {
        self.file
            .session()
            .create_file_in(title, mime::SPREADSHEET, Some(self.id()))?
            .into_spreadsheet()
            .ok_or_else(|| Error::UnexpectedResponse("created file is not a spreadsheet".into()))
    }

    pub fn create_file(&self, title: &str, mime_type: &str) -> Result<DriveItem<'s>> {
        self.file
            .session()
            .create_file_in(title, mime_type, Some(self.id()))
    }

    pub fn upload_from_bytes(
        &self,
        data: &[u8],
        title: &str,
        options: &UploadOptions,
    ) -> Result<DriveItem<'s>> {
        self.file
            .session()
            .upload_in(data, title, options, Some(self.id()))
    }
}

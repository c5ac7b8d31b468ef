//! Drive files and the typed [`DriveItem`] classification.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::json;

use gdrive_sheets_protocol::{mime, File as FileResource, FileMetadata, FILE_FIELDS};

use crate::acl::Acl;
use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::spreadsheet::Spreadsheet;
use crate::transport::{Method, RequestBody};

/// A Drive file.
///
/// Metadata is a snapshot taken when the handle was created; call
/// [`File::reload_metadata`] to refresh it.
#[derive(Debug, Clone)]
pub struct File<'s> {
    session: &'s Session,
    resource: FileResource,
}

impl<'s> File<'s> {
    pub(crate) fn new(session: &'s Session, resource: FileResource) -> Self {
        Self { session, resource }
    }

    pub(crate) fn fetch(session: &'s Session, id: &str) -> Result<Self> {
        let mut url = session.drive_url(&["files", id])?;
        url.query_pairs_mut().append_pair("fields", FILE_FIELDS);
        Ok(Self::new(session, session.get_json(url)?))
    }

    pub(crate) fn session(&self) -> &'s Session {
        self.session
    }

    // -- Metadata accessors --

    pub fn id(&self) -> &str {
        &self.resource.id
    }

    pub fn title(&self) -> &str {
        &self.resource.name
    }

    pub fn mime_type(&self) -> &str {
        &self.resource.mime_type
    }

    /// Ids of the folders containing this file
    pub fn parents(&self) -> &[String] {
        &self.resource.parents
    }

    /// URL of the file in the Drive web UI
    pub fn human_url(&self) -> Option<&str> {
        self.resource.web_view_link.as_deref()
    }

    /// Size in bytes; absent for Google documents
    pub fn size(&self) -> Option<u64> {
        self.resource.size.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        self.resource.created_time
    }

    pub fn modified_time(&self) -> Option<DateTime<Utc>> {
        self.resource.modified_time
    }

    pub fn is_trashed(&self) -> bool {
        self.resource.trashed
    }

    pub fn description(&self) -> Option<&str> {
        self.resource.description.as_deref()
    }

    /// Mime types this file can be exported as
    pub fn available_content_types(&self) -> Vec<&str> {
        self.resource.export_links.keys().map(String::as_str).collect()
    }

    /// The raw Drive resource
    pub fn resource(&self) -> &FileResource {
        &self.resource
    }

    /// Re-fetch the metadata snapshot.
    pub fn reload_metadata(&mut self) -> Result<()> {
        self.resource = Self::fetch(self.session, &self.resource.id)?.resource;
        Ok(())
    }

    // -- Content --

    /// Download the content of a binary (non-Google) file.
    pub fn download_to_bytes(&self) -> Result<Vec<u8>> {
        let mut url = self.session.drive_url(&["files", self.id()])?;
        url.query_pairs_mut().append_pair("alt", "media");
        self.session.get_bytes(url)
    }

    pub fn download_to_string(&self) -> Result<String> {
        into_string(self.download_to_bytes()?)
    }

    pub fn download_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.download_to_bytes()?)?;
        Ok(())
    }

    /// Export a Google document as `mime_type`.
    pub fn export_as_bytes(&self, mime_type: &str) -> Result<Vec<u8>> {
        let mut url = self.session.drive_url(&["files", self.id(), "export"])?;
        url.query_pairs_mut().append_pair("mimeType", mime_type);
        self.session.get_bytes(url)
    }

    pub fn export_as_string(&self, mime_type: &str) -> Result<String> {
        into_string(self.export_as_bytes(mime_type)?)
    }

    pub fn export_as_file(&self, path: impl AsRef<Path>, mime_type: &str) -> Result<()> {
        std::fs::write(path, self.export_as_bytes(mime_type)?)?;
        Ok(())
    }

    /// Replace the file content.
    pub fn update_from_bytes(&mut self, data: &[u8], content_type: &str) -> Result<()> {
        let mut url = self.session.upload_url(&["files", self.id()])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("fields", FILE_FIELDS);

        tracing::info!("Updating content of '{}' ({} bytes)", self.title(), data.len());
        let body = RequestBody::Bytes {
            content_type: content_type.to_string(),
            data: data.to_vec(),
        };
        let response = self.session.execute(Method::Patch, url, body)?;
        self.resource = serde_json::from_slice(&response.body)?;
        Ok(())
    }

    pub fn update_from_string(&mut self, content: &str) -> Result<()> {
        self.update_from_bytes(content.as_bytes(), mime::PLAIN_TEXT)
    }

    /// Replace the file content with a local file, guessing its type from
    /// the extension.
    pub fn update_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        self.update_from_bytes(&data, guess_content_type(path))
    }

    // -- Management --

    pub fn rename(&mut self, title: &str) -> Result<()> {
        self.update_metadata(&FileMetadata {
            name: Some(title.to_string()),
            ..FileMetadata::default()
        })
    }

    pub(crate) fn update_metadata(&mut self, metadata: &FileMetadata) -> Result<()> {
        let mut url = self.session.drive_url(&["files", self.id()])?;
        url.query_pairs_mut().append_pair("fields", FILE_FIELDS);
        self.resource = self.session.send_json(Method::Patch, url, metadata)?;
        Ok(())
    }

    /// Copy the file; the copy lands in the same folders.
    pub fn copy(&self, title: &str) -> Result<DriveItem<'s>> {
        let mut url = self.session.drive_url(&["files", self.id(), "copy"])?;
        url.query_pairs_mut().append_pair("fields", FILE_FIELDS);
        let metadata = FileMetadata {
            name: Some(title.to_string()),
            ..FileMetadata::default()
        };
        let resource = self.session.send_json(Method::Post, url, &metadata)?;
        Ok(DriveItem::new(self.session, resource))
    }

    /// Move the file to the trash, or delete it for good.
    pub fn delete(&mut self, permanent: bool) -> Result<()> {
        if permanent {
            let url = self.session.drive_url(&["files", self.id()])?;
            tracing::info!("Deleting '{}' permanently", self.title());
            self.session.execute(Method::Delete, url, RequestBody::Empty)?;
        } else {
            let mut url = self.session.drive_url(&["files", self.id()])?;
            url.query_pairs_mut().append_pair("fields", FILE_FIELDS);
            tracing::info!("Trashing '{}'", self.title());
            self.resource = self
                .session
                .send_json(Method::Patch, url, &json!({ "trashed": true }))?;
        }
        Ok(())
    }

    /// Load the access control list.
    pub fn acl(&self) -> Result<Acl<'s>> {
        Acl::load(self.session, self.id())
    }
}

/// A Drive file classified by mime type
#[derive(Debug, Clone)]
pub enum DriveItem<'s> {
    File(File<'s>),
    Collection(Collection<'s>),
    Spreadsheet(Spreadsheet<'s>),
}

impl<'s> DriveItem<'s> {
    pub(crate) fn new(session: &'s Session, resource: FileResource) -> Self {
        File::new(session, resource).into()
    }

    pub fn as_file(&self) -> &File<'s> {
        match self {
            DriveItem::File(f) => f,
            DriveItem::Collection(c) => c.as_file(),
            DriveItem::Spreadsheet(s) => s.as_file(),
        }
    }

    pub fn into_file(self) -> File<'s> {
        match self {
            DriveItem::File(f) => f,
            DriveItem::Collection(c) => c.into_file(),
            DriveItem::Spreadsheet(s) => s.into_file(),
        }
    }

    pub fn into_spreadsheet(self) -> Option<Spreadsheet<'s>> {
        match self {
            DriveItem::Spreadsheet(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<Collection<'s>> {
        match self {
            DriveItem::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn id(&self) -> &str {
        self.as_file().id()
    }

    pub fn title(&self) -> &str {
        self.as_file().title()
    }
}

impl<'s> From<File<'s>> for DriveItem<'s> {
    fn from(file: File<'s>) -> Self {
        if file.mime_type() == mime::FOLDER {
            DriveItem::Collection(Collection::new(file))
        } else if file.mime_type() == mime::SPREADSHEET {
            DriveItem::Spreadsheet(Spreadsheet::new(file))
        } else {
            DriveItem::File(file)
        }
    }
}

/// Content type for a local file, from its extension
pub(crate) fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("csv") => mime::CSV,
        Some("tsv") => "text/tab-separated-values",
        Some("txt") => mime::PLAIN_TEXT,
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("ods") => "application/vnd.oasis.opendocument.spreadsheet",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => mime::OCTET_STREAM,
    }
}

fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::UnexpectedResponse(format!("content is not UTF-8: {e}")))
}

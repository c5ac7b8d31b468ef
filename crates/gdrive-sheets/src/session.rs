//! The session: request execution, auth-failure retry and Drive entry points.

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use gdrive_sheets_protocol::{mime, FileList, FileMetadata, FILE_FIELDS};

use crate::collection::Collection;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::file::{DriveItem, File};
use crate::query::Query;
use crate::spreadsheet::Spreadsheet;
use crate::transport::{HttpRequest, HttpResponse, Method, RequestBody, Transport};
use crate::urls;
use crate::worksheet::Worksheet;

/// Hook consulted on a 401; `true` resends the same request.
pub type AuthFailHook = Box<dyn Fn() -> bool>;

/// Options for listing files
#[derive(Debug, Clone, Default)]
pub struct FileListOptions {
    /// Search expression; trashed files are excluded unless
    /// `include_trashed` is set.
    pub query: Option<Query>,
    /// Drive `orderBy`, e.g. `"modifiedTime desc"`.
    pub order_by: Option<String>,
    pub include_trashed: bool,
    /// Overrides [`SessionConfig::page_size`].
    pub page_size: Option<u32>,
}

impl FileListOptions {
    /// Options listing the files matching `query`
    pub fn matching(query: Query) -> Self {
        Self {
            query: Some(query),
            ..Self::default()
        }
    }

    fn effective_query(&self) -> Option<Query> {
        match (&self.query, self.include_trashed) {
            (Some(q), true) => Some(q.clone()),
            (Some(q), false) => Some(q.clone().and(Query::trashed(false))),
            (None, true) => None,
            (None, false) => Some(Query::trashed(false)),
        }
    }
}

/// One page of a file listing
#[derive(Debug)]
pub struct FilePage<'s> {
    pub items: Vec<DriveItem<'s>>,
    pub next_page_token: Option<String>,
}

/// Options for uploading content as a new file
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Content type of the uploaded bytes; `application/octet-stream` if unset.
    pub content_type: Option<String>,
    /// Google document type to convert into, e.g. [`mime::SPREADSHEET`].
    pub convert_to: Option<String>,
}

impl UploadOptions {
    pub fn content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            convert_to: None,
        }
    }

    pub fn convert_to(mut self, mime_type: impl Into<String>) -> Self {
        self.convert_to = Some(mime_type.into());
        self
    }
}

/// An authenticated connection to Drive and Sheets.
///
/// Every API object ([`File`], [`Collection`], [`Spreadsheet`],
/// [`Worksheet`], ...) borrows the session that created it.
pub struct Session {
    transport: Box<dyn Transport>,
    config: SessionConfig,
    on_auth_fail: Option<AuthFailHook>,
}

impl Session {
    /// Create a session over any transport.
    pub fn new(transport: impl Transport + 'static, config: SessionConfig) -> Self {
        Self {
            transport: Box::new(transport),
            config,
            on_auth_fail: None,
        }
    }

    /// Create a session sending `token` as the bearer token.
    #[cfg(feature = "reqwest")]
    pub fn from_access_token(token: impl Into<String>) -> Result<Self> {
        Self::with_token_provider(
            crate::transport::StaticToken::new(token),
            SessionConfig::default(),
        )
    }

    /// Create a session over `reqwest`, asking `provider` for a token on
    /// every request.
    #[cfg(feature = "reqwest")]
    pub fn with_token_provider(
        provider: impl crate::transport::AccessTokenProvider + 'static,
        config: SessionConfig,
    ) -> Result<Self> {
        let transport = crate::transport::ReqwestTransport::new(provider, &config)?;
        Ok(Self::new(transport, config))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Install the hook consulted when a request is answered with 401.
    ///
    /// Returning `true` resends the same request; there is no retry limit,
    /// so the hook must eventually return `false`.
    pub fn on_auth_fail(&mut self, hook: impl Fn() -> bool + 'static) {
        self.on_auth_fail = Some(Box::new(hook));
    }

    // -- Request execution --

    /// Send a request, applying the auth-failure policy.
    ///
    /// Any non-2xx status other than a retried 401 is an error.
    pub fn execute(&self, method: Method, url: Url, body: RequestBody) -> Result<HttpResponse> {
        let request = HttpRequest { method, url, body };
        loop {
            tracing::debug!("{} {}", request.method, request.url);
            let response = self.transport.send(&request)?;

            if response.status == 401 {
                let retry = self.on_auth_fail.as_ref().map_or(false, |hook| hook());
                if retry {
                    tracing::warn!(
                        "{} {} was rejected with 401, retrying",
                        request.method,
                        request.url
                    );
                    continue;
                }
                return Err(Error::AuthenticationFailed {
                    method: request.method,
                    url: request.url.to_string(),
                    body: response.text(),
                });
            }

            if !response.is_success() {
                tracing::debug!(
                    "{} {} failed with HTTP {}",
                    request.method,
                    request.url,
                    response.status
                );
                return Err(Error::RemoteRequestFailed {
                    method: request.method,
                    url: request.url.to_string(),
                    status: response.status,
                    body: response.text(),
                });
            }

            return Ok(response);
        }
    }

    pub(crate) fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.execute(Method::Get, url, RequestBody::Empty)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    pub(crate) fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = RequestBody::Json(serde_json::to_value(body)?);
        let response = self.execute(method, url, body)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    pub(crate) fn get_bytes(&self, url: Url) -> Result<Vec<u8>> {
        Ok(self.execute(Method::Get, url, RequestBody::Empty)?.body)
    }

    pub(crate) fn drive_url(&self, segments: &[&str]) -> Result<Url> {
        endpoint(&self.config.drive_base_url, segments)
    }

    pub(crate) fn upload_url(&self, segments: &[&str]) -> Result<Url> {
        endpoint(&self.config.upload_base_url, segments)
    }

    pub(crate) fn sheets_url(&self, segments: &[&str]) -> Result<Url> {
        endpoint(&self.config.sheets_base_url, segments)
    }

    pub(crate) fn docs_url(&self, segments: &[&str]) -> Result<Url> {
        endpoint(&self.config.docs_base_url, segments)
    }

    // -- Files --

    /// All files matching `options`, following every page.
    pub fn files(&self, options: &FileListOptions) -> Result<Vec<DriveItem<'_>>> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.files_page(options, token.as_deref())?;
            items.extend(page.items);
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(items)
    }

    /// One page of files matching `options`.
    pub fn files_page(
        &self,
        options: &FileListOptions,
        page_token: Option<&str>,
    ) -> Result<FilePage<'_>> {
        let mut url = self.drive_url(&["files"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(q) = options.effective_query() {
                query.append_pair("q", &q.to_string());
            }
            query.append_pair("fields", &format!("nextPageToken,files({FILE_FIELDS})"));
            query.append_pair(
                "pageSize",
                &options.page_size.unwrap_or(self.config.page_size).to_string(),
            );
            if let Some(order_by) = &options.order_by {
                query.append_pair("orderBy", order_by);
            }
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        let list: FileList = self.get_json(url)?;
        Ok(FilePage {
            items: list
                .files
                .into_iter()
                .map(|resource| DriveItem::new(self, resource))
                .collect(),
            next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    /// Look up a file by id.
    pub fn file_by_id(&self, id: &str) -> Result<DriveItem<'_>> {
        File::fetch(self, id).map(DriveItem::from)
    }

    /// First non-trashed file named `title`, anywhere in the drive.
    pub fn file_by_title(&self, title: &str) -> Result<Option<DriveItem<'_>>> {
        let options = FileListOptions {
            page_size: Some(1),
            ..FileListOptions::matching(Query::name_eq(title))
        };
        Ok(self.files_page(&options, None)?.items.into_iter().next())
    }

    /// File reached by following folder titles from the root, e.g.
    /// `["reports", "2024", "budget"]`.
    pub fn file_by_title_path<S: AsRef<str>>(&self, path: &[S]) -> Result<Option<DriveItem<'_>>> {
        let (last, folders) = match path.split_last() {
            Some(split) => split,
            None => return Ok(None),
        };

        let mut collection = self.root_collection()?;
        for folder in folders {
            collection = match collection.subcollection_by_title(folder.as_ref())? {
                Some(next) => next,
                None => return Ok(None),
            };
        }
        collection.file_by_title(last.as_ref())
    }

    /// Look up a file from its web URL.
    pub fn file_by_url(&self, url: &str) -> Result<DriveItem<'_>> {
        self.file_by_id(&urls::file_id_from_url(url)?)
    }

    // -- Spreadsheets --

    /// Spreadsheets matching an optional extra query.
    pub fn spreadsheets(&self, query: Option<Query>) -> Result<Vec<Spreadsheet<'_>>> {
        let q = Query::mime_type_eq(mime::SPREADSHEET);
        let q = match query {
            Some(extra) => q.and(extra),
            None => q,
        };
        Ok(self
            .files(&FileListOptions::matching(q))?
            .into_iter()
            .filter_map(DriveItem::into_spreadsheet)
            .collect())
    }

    pub fn spreadsheet_by_key(&self, key: &str) -> Result<Spreadsheet<'_>> {
        self.file_by_id(key)?.into_spreadsheet().ok_or_else(|| {
            Error::UnexpectedResponse(format!("file {key} is not a spreadsheet"))
        })
    }

    pub fn spreadsheet_by_url(&self, url: &str) -> Result<Spreadsheet<'_>> {
        self.spreadsheet_by_key(&urls::file_id_from_url(url)?)
    }

    pub fn spreadsheet_by_title(&self, title: &str) -> Result<Option<Spreadsheet<'_>>> {
        let q = Query::name_eq(title).and(Query::mime_type_eq(mime::SPREADSHEET));
        let options = FileListOptions {
            page_size: Some(1),
            ..FileListOptions::matching(q)
        };
        Ok(self
            .files_page(&options, None)?
            .items
            .into_iter()
            .find_map(DriveItem::into_spreadsheet))
    }

    /// Worksheet identified by a spreadsheet URL carrying a `gid`.
    pub fn worksheet_by_url(&self, url: &str) -> Result<Worksheet<'_>> {
        let key = urls::file_id_from_url(url)?;
        let gid = urls::sheet_id_from_url(url)?;
        self.spreadsheet_by_key(&key)?
            .worksheet_by_sheet_id(gid)?
            .ok_or_else(|| Error::NotFound(format!("worksheet gid={gid} in spreadsheet {key}")))
    }

    /// Create an empty spreadsheet in the root folder.
    pub fn create_spreadsheet(&self, title: &str) -> Result<Spreadsheet<'_>> {
        self.create_file_in(title, mime::SPREADSHEET, None)?
            .into_spreadsheet()
            .ok_or_else(|| Error::UnexpectedResponse("created file is not a spreadsheet".into()))
    }

    // -- Collections --

    /// The root folder ("My Drive").
    pub fn root_collection(&self) -> Result<Collection<'_>> {
        Ok(Collection::root(File::fetch(self, "root")?))
    }

    pub fn collection_by_id(&self, id: &str) -> Result<Collection<'_>> {
        self.file_by_id(id)?
            .into_collection()
            .ok_or_else(|| Error::UnexpectedResponse(format!("file {id} is not a folder")))
    }

    pub fn collection_by_title(&self, title: &str) -> Result<Option<Collection<'_>>> {
        let q = Query::name_eq(title).and(Query::mime_type_eq(mime::FOLDER));
        let options = FileListOptions {
            page_size: Some(1),
            ..FileListOptions::matching(q)
        };
        Ok(self
            .files_page(&options, None)?
            .items
            .into_iter()
            .find_map(DriveItem::into_collection))
    }

    pub fn collection_by_url(&self, url: &str) -> Result<Collection<'_>> {
        self.collection_by_id(&urls::file_id_from_url(url)?)
    }

    /// Create a folder in the root folder.
    pub fn create_collection(&self, title: &str) -> Result<Collection<'_>> {
        self.create_file_in(title, mime::FOLDER, None)?
            .into_collection()
            .ok_or_else(|| Error::UnexpectedResponse("created file is not a folder".into()))
    }

    /// Create an empty file of the given type in the root folder.
    pub fn create_file(&self, title: &str, mime_type: &str) -> Result<DriveItem<'_>> {
        self.create_file_in(title, mime_type, None)
    }

    // -- Uploads --

    pub fn upload_from_bytes(
        &self,
        data: &[u8],
        title: &str,
        options: &UploadOptions,
    ) -> Result<DriveItem<'_>> {
        self.upload_in(data, title, options, None)
    }

    pub fn upload_from_string(
        &self,
        content: &str,
        title: &str,
        options: &UploadOptions,
    ) -> Result<DriveItem<'_>> {
        let options = UploadOptions {
            content_type: options
                .content_type
                .clone()
                .or_else(|| Some(mime::PLAIN_TEXT.to_string())),
            convert_to: options.convert_to.clone(),
        };
        self.upload_in(content.as_bytes(), title, &options, None)
    }

    /// Upload a local file; the title defaults to the file name and the
    /// content type is guessed from the extension when not given.
    pub fn upload_from_file(
        &self,
        path: impl AsRef<std::path::Path>,
        title: Option<&str>,
        options: &UploadOptions,
    ) -> Result<DriveItem<'_>> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let title = match title {
            Some(t) => t.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let options = UploadOptions {
            content_type: options
                .content_type
                .clone()
                .or_else(|| Some(crate::file::guess_content_type(path).to_string())),
            convert_to: options.convert_to.clone(),
        };
        self.upload_in(&data, &title, &options, None)
    }

    pub(crate) fn create_file_in(
        &self,
        title: &str,
        mime_type: &str,
        parent: Option<&str>,
    ) -> Result<DriveItem<'_>> {
        let metadata = FileMetadata {
            name: Some(title.to_string()),
            mime_type: Some(mime_type.to_string()),
            parents: parent.map(|p| vec![p.to_string()]),
            description: None,
        };
        let mut url = self.drive_url(&["files"])?;
        url.query_pairs_mut().append_pair("fields", FILE_FIELDS);

        tracing::info!("Creating {mime_type} '{title}'");
        let resource = self.send_json(Method::Post, url, &metadata)?;
        Ok(DriveItem::new(self, resource))
    }

    /// Create a file with content in one `multipart/related` upload.
    pub(crate) fn upload_in(
        &self,
        data: &[u8],
        title: &str,
        options: &UploadOptions,
        parent: Option<&str>,
    ) -> Result<DriveItem<'_>> {
        let metadata = FileMetadata {
            name: Some(title.to_string()),
            mime_type: options.convert_to.clone(),
            parents: parent.map(|p| vec![p.to_string()]),
            description: None,
        };
        let content_type = options.content_type.as_deref().unwrap_or(mime::OCTET_STREAM);

        let mut url = self.upload_url(&["files"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("fields", FILE_FIELDS);

        let body = multipart_related(&serde_json::to_vec(&metadata)?, content_type, data);
        tracing::info!("Uploading '{title}' ({} bytes, {content_type})", data.len());
        let response = self.execute(Method::Post, url, body)?;
        let resource = serde_json::from_slice(&response.body)?;
        Ok(DriveItem::new(self, resource))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("on_auth_fail", &self.on_auth_fail.is_some())
            .finish_non_exhaustive()
    }
}

/// `base` with `segments` appended as percent-encoded path segments
fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| Error::InvalidUrl(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Build a `multipart/related` body: JSON metadata, then the media.
fn multipart_related(metadata: &[u8], content_type: &str, data: &[u8]) -> RequestBody {
    let mut boundary = String::from("gdrive_sheets_part");
    while contains(data, boundary.as_bytes()) {
        boundary.push('_');
    }

    let mut body = Vec::with_capacity(metadata.len() + data.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    RequestBody::Bytes {
        content_type: format!("multipart/related; boundary={boundary}"),
        data: body,
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = endpoint(
            "https://sheets.googleapis.com/v4",
            &["spreadsheets", "key", "values", "'My Sheet'!R1C1:R2C2"],
        )
        .unwrap();
        assert_eq!(
            url.path(),
            "/v4/spreadsheets/key/values/'My%20Sheet'!R1C1:R2C2"
        );

        let url = endpoint("https://example.com/", &["files"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/files");
    }

    #[test]
    fn test_default_query_excludes_trashed() {
        let options = FileListOptions::default();
        assert_eq!(options.effective_query().unwrap().to_string(), "trashed = false");

        let options = FileListOptions::matching(Query::name_eq("a"));
        assert_eq!(
            options.effective_query().unwrap().to_string(),
            "name = 'a' and trashed = false"
        );

        let options = FileListOptions {
            include_trashed: true,
            ..FileListOptions::default()
        };
        assert!(options.effective_query().is_none());
    }

    #[test]
    fn test_multipart_body() {
        let body = multipart_related(br#"{"name":"a"}"#, "text/csv", b"x,y\n1,2\n");
        let RequestBody::Bytes { content_type, data } = body else {
            panic!("expected a byte body");
        };
        assert_eq!(content_type, "multipart/related; boundary=gdrive_sheets_part");
        let text = String::from_utf8(data).unwrap();
        assert!(text.starts_with("--gdrive_sheets_part\r\nContent-Type: application/json"));
        assert!(text.contains("Content-Type: text/csv\r\n\r\nx,y\n1,2\n\r\n"));
        assert!(text.ends_with("--gdrive_sheets_part--\r\n"));
    }

    #[test]
    fn test_multipart_boundary_avoids_data() {
        let body = multipart_related(b"{}", "text/plain", b"--gdrive_sheets_part");
        let RequestBody::Bytes { content_type, .. } = body else {
            panic!("expected a byte body");
        };
        assert_eq!(content_type, "multipart/related; boundary=gdrive_sheets_part_");
    }
}

//! Drive v3 resources: files and permissions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known Google mime types
pub mod mime {
    pub const FOLDER: &str = "application/vnd.google-apps.folder";
    pub const SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
    pub const DOCUMENT: &str = "application/vnd.google-apps.document";
    pub const PRESENTATION: &str = "application/vnd.google-apps.presentation";
    pub const CSV: &str = "text/csv";
    pub const PLAIN_TEXT: &str = "text/plain";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// Fields requested for every file listing / lookup
pub const FILE_FIELDS: &str =
    "id,name,mimeType,parents,webViewLink,size,createdTime,modifiedTime,trashed,exportLinks,description";

/// A Drive file resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    /// Size in bytes; Drive encodes int64 as a string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub export_links: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One page of `files.list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<File>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete_search: Option<bool>,
}

/// Writable file metadata for `files.create`, `files.update` and `files.copy`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Grantee kind of a permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionType {
    User,
    Group,
    Domain,
    Anyone,
}

/// Access level of a permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionRole {
    Owner,
    Organizer,
    FileOrganizer,
    Writer,
    Commenter,
    Reader,
}

/// A Drive permission (one ACL entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: PermissionType,
    pub role: PermissionRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_file_discovery: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Permission {
    /// A new entry granting `role` to a user by email address
    pub fn user(email: impl Into<String>, role: PermissionRole) -> Self {
        Self::new(PermissionType::User, role).with_email(email)
    }

    /// A new entry granting `role` to a group by email address
    pub fn group(email: impl Into<String>, role: PermissionRole) -> Self {
        Self::new(PermissionType::Group, role).with_email(email)
    }

    /// A new entry granting `role` to everyone in a domain
    pub fn domain(domain: impl Into<String>, role: PermissionRole) -> Self {
        let mut p = Self::new(PermissionType::Domain, role);
        p.domain = Some(domain.into());
        p
    }

    /// A new entry granting `role` to anyone with the link
    pub fn anyone(role: PermissionRole) -> Self {
        Self::new(PermissionType::Anyone, role)
    }

    fn new(kind: PermissionType, role: PermissionRole) -> Self {
        Self {
            id: None,
            kind,
            role,
            email_address: None,
            domain: None,
            allow_file_discovery: None,
            expiration_time: None,
            display_name: None,
        }
    }

    fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email_address = Some(email.into());
        self
    }
}

/// One page of `permissions.list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionList {
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

//! Access control lists (Drive permissions).

use serde_json::json;

use gdrive_sheets_protocol::{Permission, PermissionList, PermissionRole};

use crate::error::{Error, Result};
use crate::session::Session;
use crate::transport::{Method, RequestBody};

const PERMISSION_FIELDS: &str =
    "id,type,role,emailAddress,domain,allowFileDiscovery,expirationTime,displayName";

/// How the grantee is told about a new permission
#[derive(Debug, Clone, Default)]
pub struct NotificationOptions {
    /// `None` leaves the API default (notify users and groups).
    pub send_notification_email: Option<bool>,
    pub email_message: Option<String>,
    /// Required when granting [`PermissionRole::Owner`].
    pub transfer_ownership: bool,
}

impl NotificationOptions {
    /// Grant silently
    pub fn silent() -> Self {
        Self {
            send_notification_email: Some(false),
            ..Self::default()
        }
    }
}

/// The loaded permissions of one file
#[derive(Debug, Clone)]
pub struct Acl<'s> {
    session: &'s Session,
    file_id: String,
    entries: Vec<Permission>,
}

impl<'s> Acl<'s> {
    pub(crate) fn load(session: &'s Session, file_id: &str) -> Result<Self> {
        let mut acl = Self {
            session,
            file_id: file_id.to_string(),
            entries: Vec::new(),
        };
        acl.reload()?;
        Ok(acl)
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn entries(&self) -> &[Permission] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Permission> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-fetch every page of permissions.
    pub fn reload(&mut self) -> Result<()> {
        let mut entries = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let mut url = self
                .session
                .drive_url(&["files", &self.file_id, "permissions"])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("fields", &format!("nextPageToken,permissions({PERMISSION_FIELDS})"));
                query.append_pair("pageSize", &self.session.config().page_size.to_string());
                if let Some(t) = &token {
                    query.append_pair("pageToken", t);
                }
            }

            let page: PermissionList = self.session.get_json(url)?;
            entries.extend(page.permissions);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        self.entries = entries;
        Ok(())
    }

    /// Grant a new permission and append the created entry.
    pub fn push(&mut self, entry: Permission, options: &NotificationOptions) -> Result<&Permission> {
        let mut url = self
            .session
            .drive_url(&["files", &self.file_id, "permissions"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("fields", PERMISSION_FIELDS);
            if let Some(send) = options.send_notification_email {
                query.append_pair("sendNotificationEmail", if send { "true" } else { "false" });
            }
            if let Some(message) = &options.email_message {
                query.append_pair("emailMessage", message);
            }
            if options.transfer_ownership {
                query.append_pair("transferOwnership", "true");
            }
        }

        tracing::info!("Granting {:?} on {} to {:?}", entry.role, self.file_id, entry.kind);
        let created: Permission = self.session.send_json(Method::Post, url, &entry)?;
        self.entries.push(created);
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    /// Revoke a permission by id.
    pub fn delete(&mut self, permission_id: &str) -> Result<()> {
        let position = self.position(permission_id)?;
        let url = self
            .session
            .drive_url(&["files", &self.file_id, "permissions", permission_id])?;

        tracing::info!("Revoking permission {permission_id} on {}", self.file_id);
        self.session.execute(Method::Delete, url, RequestBody::Empty)?;
        self.entries.remove(position);
        Ok(())
    }

    /// Change the role of an existing permission.
    pub fn update_role(&mut self, permission_id: &str, role: PermissionRole) -> Result<&Permission> {
        let position = self.position(permission_id)?;
        let mut url = self
            .session
            .drive_url(&["files", &self.file_id, "permissions", permission_id])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("fields", PERMISSION_FIELDS);
            if role == PermissionRole::Owner {
                query.append_pair("transferOwnership", "true");
            }
        }

        let updated: Permission = self
            .session
            .send_json(Method::Patch, url, &json!({ "role": role }))?;
        self.entries[position] = updated;
        Ok(&self.entries[position])
    }

    fn position(&self, permission_id: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|p| p.id.as_deref() == Some(permission_id))
            .ok_or_else(|| Error::NotFound(format!("permission {permission_id} on {}", self.file_id)))
    }
}

impl<'a, 's> IntoIterator for &'a Acl<'s> {
    type Item = &'a Permission;
    type IntoIter = std::slice::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

//! Drive files, folders and permissions against a scripted transport.

mod common;

use gdrive_sheets::protocol::{mime, Permission, PermissionRole};
use gdrive_sheets::{
    DriveItem, Error, FileListOptions, Method, NotificationOptions, Query, RequestBody,
    UploadOptions,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use common::{assert_request, query_param, FakeTransport};

fn file_json(id: &str, name: &str, mime_type: &str) -> serde_json::Value {
    json!({"id": id, "name": name, "mimeType": mime_type, "parents": ["root"]})
}

#[test]
fn test_listing_follows_pages() {
    let fake = FakeTransport::new();
    let session = fake.session();

    fake.push_json(json!({
        "files": [
            file_json("s1", "Budget", mime::SPREADSHEET),
            file_json("d1", "Reports", mime::FOLDER)
        ],
        "nextPageToken": "page2"
    }));
    fake.push_json(json!({"files": [file_json("t1", "notes.txt", mime::PLAIN_TEXT)]}));

    let items = session
        .files(&FileListOptions::matching(Query::name_contains("e")))
        .unwrap();
    assert_eq!(items.len(), 3);
    assert!(matches!(items[0], DriveItem::Spreadsheet(_)));
    assert!(matches!(items[1], DriveItem::Collection(_)));
    assert!(matches!(items[2], DriveItem::File(_)));

    let requests = fake.requests();
    assert_eq!(requests.len(), 2);
    assert_request(&requests[0], Method::Get, "/drive/v3/files");
    assert_eq!(
        query_param(&requests[0], "q").as_deref(),
        Some("name contains 'e' and trashed = false")
    );
    assert_eq!(query_param(&requests[0], "pageToken"), None);
    assert_eq!(query_param(&requests[1], "pageToken").as_deref(), Some("page2"));
}

#[test]
fn test_listing_can_include_trash() {
    let fake = FakeTransport::new();
    let session = fake.session();

    fake.push_json(json!({"files": []}));
    let options = FileListOptions {
        include_trashed: true,
        order_by: Some("modifiedTime desc".into()),
        ..FileListOptions::default()
    };
    assert!(session.files(&options).unwrap().is_empty());

    let request = fake.last_request();
    assert_eq!(query_param(&request, "q"), None);
    assert_eq!(query_param(&request, "orderBy").as_deref(), Some("modifiedTime desc"));
    assert_eq!(query_param(&request, "pageSize").as_deref(), Some("100"));
}

#[test]
fn test_spreadsheet_by_url() {
    let fake = FakeTransport::new();
    let session = fake.session();

    fake.push_json(file_json("1AbC_d-9", "Budget", mime::SPREADSHEET));
    let spreadsheet = session
        .spreadsheet_by_url("https://docs.google.com/spreadsheets/d/1AbC_d-9/edit#gid=0")
        .unwrap();

    assert_eq!(spreadsheet.key(), "1AbC_d-9");
    assert_request(&fake.last_request(), Method::Get, "/drive/v3/files/1AbC_d-9");
}

#[test]
fn test_spreadsheet_by_key_rejects_other_files() {
    let fake = FakeTransport::new();
    let session = fake.session();

    fake.push_json(file_json("f1", "notes.txt", mime::PLAIN_TEXT));
    assert!(matches!(
        session.spreadsheet_by_key("f1"),
        Err(Error::UnexpectedResponse(_))
    ));
}

#[test]
fn test_missing_file_reports_status() {
    let fake = FakeTransport::new();
    let session = fake.session();

    fake.push(
        404,
        r#"{"error":{"code":404,"message":"File not found: nope.","status":"NOT_FOUND"}}"#,
    );
    let err = session.file_by_id("nope").unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.api_message().as_deref(), Some("File not found: nope."));
}

#[test]
fn test_transport_errors_propagate() {
    let fake = FakeTransport::new();
    let session = fake.session();

    assert!(matches!(session.file_by_id("x"), Err(Error::Transport(_))));
}

#[test]
fn test_upload_is_one_multipart_request() {
    let fake = FakeTransport::new();
    let session = fake.session();

    fake.push_json(file_json("u1", "data.csv", mime::SPREADSHEET));
    let options = UploadOptions::content_type(mime::CSV).convert_to(mime::SPREADSHEET);
    let item = session
        .upload_from_bytes(b"a,b\n1,2\n", "data.csv", &options)
        .unwrap();
    assert!(matches!(item, DriveItem::Spreadsheet(_)));

    let request = fake.last_request();
    assert_request(&request, Method::Post, "/upload/drive/v3/files");
    assert_eq!(query_param(&request, "uploadType").as_deref(), Some("multipart"));

    let (content_type, data) = match &request.body {
        RequestBody::Bytes { content_type, data } => (content_type.clone(), data.clone()),
        other => panic!("unexpected body {other:?}"),
    };
    assert!(content_type.starts_with("multipart/related; boundary="));
    let text = String::from_utf8(data).unwrap();
    assert!(text.contains(r#""mimeType":"application/vnd.google-apps.spreadsheet""#));
    assert!(text.contains("Content-Type: text/csv\r\n\r\na,b\n1,2\n"));
}

#[test]
fn test_upload_from_file_uses_file_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.txt");
    std::fs::write(&path, "hello").unwrap();

    let fake = FakeTransport::new();
    let session = fake.session();
    fake.push_json(file_json("u2", "report.txt", mime::PLAIN_TEXT));
    let item = session
        .upload_from_file(&path, None, &UploadOptions::default())
        .unwrap();
    assert_eq!(item.title(), "report.txt");

    let body = match fake.last_request().body {
        RequestBody::Bytes { data, .. } => String::from_utf8(data).unwrap(),
        other => panic!("unexpected body {other:?}"),
    };
    assert!(body.contains(r#""name":"report.txt""#));
    assert!(body.contains("Content-Type: text/plain\r\n\r\nhello"));
}

#[test]
fn test_download_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("copy.bin");

    let fake = FakeTransport::new();
    let session = fake.session();
    fake.push_json(file_json("b1", "blob.bin", mime::OCTET_STREAM));
    let file = session.file_by_id("b1").unwrap().into_file();

    fake.push(200, vec![0u8, 1, 2, 255]);
    file.download_to_file(&path).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), vec![0u8, 1, 2, 255]);
    assert_eq!(query_param(&fake.last_request(), "alt").as_deref(), Some("media"));
}

#[test]
fn test_export_and_trash() {
    let fake = FakeTransport::new();
    let session = fake.session();
    fake.push_json(file_json("s1", "Budget", mime::SPREADSHEET));
    let mut file = session.file_by_id("s1").unwrap().into_file();

    fake.push(200, "a,b\n");
    assert_eq!(file.export_as_string(mime::CSV).unwrap(), "a,b\n");
    let export = fake.last_request();
    assert_request(&export, Method::Get, "/drive/v3/files/s1/export");
    assert_eq!(query_param(&export, "mimeType").as_deref(), Some("text/csv"));

    let mut trashed = file_json("s1", "Budget", mime::SPREADSHEET);
    trashed["trashed"] = json!(true);
    fake.push_json(trashed);
    file.delete(false).unwrap();
    assert!(file.is_trashed());
    let patch = fake.last_request();
    assert_eq!(patch.method, Method::Patch);
    assert_eq!(patch.body.as_json().unwrap(), &json!({"trashed": true}));

    fake.push(204, "");
    file.delete(true).unwrap();
    assert_request(&fake.last_request(), Method::Delete, "/drive/v3/files/s1");
}

#[test]
fn test_collection_membership() {
    let fake = FakeTransport::new();
    let session = fake.session();

    fake.push_json(file_json("d1", "Reports", mime::FOLDER));
    let folder = session.collection_by_id("d1").unwrap();
    fake.push_json(file_json("t1", "notes.txt", mime::PLAIN_TEXT));
    let mut file = session.file_by_id("t1").unwrap().into_file();

    fake.push_json(json!({
        "id": "t1", "name": "notes.txt", "mimeType": mime::PLAIN_TEXT,
        "parents": ["root", "d1"]
    }));
    folder.add(&mut file).unwrap();
    assert_eq!(file.parents(), ["root", "d1"]);

    let request = fake.last_request();
    assert_request(&request, Method::Patch, "/drive/v3/files/t1");
    assert_eq!(query_param(&request, "addParents").as_deref(), Some("d1"));

    fake.push_json(json!({"files": [file_json("s1", "Budget", mime::SPREADSHEET)]}));
    let sheets = folder.spreadsheets().unwrap();
    assert_eq!(sheets.len(), 1);
    assert_eq!(
        query_param(&fake.last_request(), "q").as_deref(),
        Some("'d1' in parents and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false")
    );
}

#[test]
fn test_title_path_walks_folders() {
    let fake = FakeTransport::new();
    let session = fake.session();

    fake.push_json(json!({"id": "root-id", "name": "My Drive", "mimeType": mime::FOLDER}));
    fake.push_json(json!({"files": [file_json("d1", "reports", mime::FOLDER)]}));
    fake.push_json(json!({"files": [file_json("s9", "budget", mime::SPREADSHEET)]}));

    let item = session
        .file_by_title_path(&["reports", "budget"])
        .unwrap()
        .unwrap();
    assert_eq!(item.id(), "s9");

    let requests = fake.requests();
    assert_request(&requests[0], Method::Get, "/drive/v3/files/root");
    assert!(query_param(&requests[2], "q")
        .unwrap()
        .starts_with("'d1' in parents and name = 'budget'"));
}

#[test]
fn test_acl_grant_and_revoke() {
    let fake = FakeTransport::new();
    let session = fake.session();
    fake.push_json(file_json("s1", "Budget", mime::SPREADSHEET));
    let file = session.file_by_id("s1").unwrap().into_file();

    fake.push_json(json!({
        "permissions": [{"id": "p0", "type": "user", "role": "owner", "emailAddress": "me@example.com"}],
        "nextPageToken": "more"
    }));
    fake.push_json(json!({
        "permissions": [{"id": "p1", "type": "anyone", "role": "reader"}]
    }));
    let mut acl = file.acl().unwrap();
    assert_eq!(acl.len(), 2);

    fake.push_json(json!({
        "id": "p2", "type": "user", "role": "writer", "emailAddress": "bob@example.com"
    }));
    let created = acl
        .push(
            Permission::user("bob@example.com", PermissionRole::Writer),
            &NotificationOptions::silent(),
        )
        .unwrap();
    assert_eq!(created.id.as_deref(), Some("p2"));

    let grant = fake.last_request();
    assert_request(&grant, Method::Post, "/drive/v3/files/s1/permissions");
    assert_eq!(
        query_param(&grant, "sendNotificationEmail").as_deref(),
        Some("false")
    );
    assert_eq!(
        grant.body.as_json().unwrap(),
        &json!({"type": "user", "role": "writer", "emailAddress": "bob@example.com"})
    );

    fake.push(204, "");
    acl.delete("p1").unwrap();
    assert_request(
        &fake.last_request(),
        Method::Delete,
        "/drive/v3/files/s1/permissions/p1",
    );
    let ids: Vec<_> = acl.iter().filter_map(|p| p.id.as_deref()).collect();
    assert_eq!(ids, vec!["p0", "p2"]);

    assert!(matches!(acl.delete("p1"), Err(Error::NotFound(_))));
}

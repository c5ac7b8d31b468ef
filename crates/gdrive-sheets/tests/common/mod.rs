//! Scripted transport shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use gdrive_sheets::{
    HttpRequest, HttpResponse, Method, Session, SessionConfig, Transport, TransportError,
};
use serde_json::Value;

#[derive(Default)]
struct Inner {
    responses: VecDeque<HttpResponse>,
    requests: Vec<HttpRequest>,
}

/// Answers requests from a queue of canned responses and records every
/// request it sees. Running out of responses is a transport error.
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Rc<RefCell<Inner>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.inner
            .borrow_mut()
            .responses
            .push_back(HttpResponse::new(status, body));
    }

    pub fn push_json(&self, body: Value) {
        self.push(200, body.to_string());
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.borrow().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.borrow().requests.len()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.inner
            .borrow()
            .requests
            .last()
            .cloned()
            .expect("no request was sent")
    }

    pub fn session(&self) -> Session {
        Session::new(self.clone(), SessionConfig::default())
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut inner = self.inner.borrow_mut();
        inner.requests.push(request.clone());
        inner
            .responses
            .pop_front()
            .ok_or_else(|| TransportError::new(format!("no scripted response for {} {}", request.method, request.url)))
    }
}

/// Value of query parameter `name`, decoded
pub fn query_param(request: &HttpRequest, name: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

pub fn assert_request(request: &HttpRequest, method: Method, path: &str) {
    assert_eq!(request.method, method, "method of {}", request.url);
    assert_eq!(request.url.path(), path);
}

/// `files.get` reply for a spreadsheet
pub fn spreadsheet_file(key: &str, title: &str) -> Value {
    serde_json::json!({
        "id": key,
        "name": title,
        "mimeType": "application/vnd.google-apps.spreadsheet"
    })
}

/// `spreadsheets.get?fields=sheets.properties` reply
pub fn sheet_list(sheets: &[(i64, &str, u32, u32, u32)]) -> Value {
    let sheets: Vec<Value> = sheets
        .iter()
        .map(|(id, title, index, rows, cols)| {
            serde_json::json!({
                "properties": {
                    "sheetId": id,
                    "title": title,
                    "index": index,
                    "gridProperties": {"rowCount": rows, "columnCount": cols}
                }
            })
        })
        .collect();
    serde_json::json!({ "sheets": sheets })
}

/// Reload reply: one sheet whose grid data starts at A1
pub fn sheet_data(id: i64, title: &str, rows: u32, cols: u32, cells: Value) -> Value {
    serde_json::json!({
        "sheets": [{
            "properties": {
                "sheetId": id,
                "title": title,
                "gridProperties": {"rowCount": rows, "columnCount": cols}
            },
            "data": [{"rowData": cells}]
        }]
    })
}

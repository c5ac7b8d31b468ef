//! Extraction of file ids, spreadsheet keys and sheet ids from web URLs.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{Error, Result};

/// `/spreadsheets/d/<id>`, `/document/d/<id>`, `/file/d/<id>`, ...
static PATH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/d/([A-Za-z0-9_-]+)").expect("valid regex"));

/// `/drive/folders/<id>`, `/drive/u/0/folders/<id>`
static FOLDER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/folders/([A-Za-z0-9_-]+)").expect("valid regex"));

static GID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[&#?])gid=(\d+)").expect("valid regex"));

/// Drive file id referenced by a document, file or folder URL
pub fn file_id_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    let path = parsed.path();

    if let Some(caps) = PATH_ID.captures(path).or_else(|| FOLDER_ID.captures(path)) {
        return Ok(caps[1].to_string());
    }

    // Legacy links: ?id=<id> or ?key=<id>
    parsed
        .query_pairs()
        .find(|(k, _)| k == "id" || k == "key")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidUrl(format!("no file id in {url}")))
}

/// Sheet id (`gid`) referenced by a worksheet URL's query or fragment
pub fn sheet_id_from_url(url: &str) -> Result<i64> {
    let parsed = Url::parse(url)?;
    let gid = [parsed.fragment(), parsed.query()]
        .into_iter()
        .flatten()
        .find_map(|part| GID.captures(part))
        .and_then(|caps| caps[1].parse().ok());
    gid.ok_or_else(|| Error::InvalidUrl(format!("no gid in {url}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_ids() {
        assert_eq!(
            file_id_from_url("https://docs.google.com/spreadsheets/d/1AbC-d_9/edit#gid=0").unwrap(),
            "1AbC-d_9"
        );
        assert_eq!(
            file_id_from_url("https://drive.google.com/file/d/xyz/view?usp=sharing").unwrap(),
            "xyz"
        );
        assert_eq!(
            file_id_from_url("https://drive.google.com/drive/u/0/folders/F0lder").unwrap(),
            "F0lder"
        );
        assert_eq!(
            file_id_from_url("https://docs.google.com/spreadsheet/ccc?key=legacy&usp=x").unwrap(),
            "legacy"
        );
        assert_eq!(
            file_id_from_url("https://drive.google.com/open?id=opened").unwrap(),
            "opened"
        );
    }

    #[test]
    fn test_bad_urls() {
        assert!(matches!(
            file_id_from_url("https://example.com/nothing"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(file_id_from_url("not a url"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_sheet_ids() {
        assert_eq!(
            sheet_id_from_url("https://docs.google.com/spreadsheets/d/k/edit#gid=1234").unwrap(),
            1234
        );
        assert_eq!(
            sheet_id_from_url("https://docs.google.com/spreadsheets/d/k/edit?gid=7").unwrap(),
            7
        );
        assert!(sheet_id_from_url("https://docs.google.com/spreadsheets/d/k/edit").is_err());
    }
}

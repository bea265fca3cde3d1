//! Player URL construction.
//!
//! The remote player reads its query parameters positionally for some
//! layouts, so the key order below is fixed per reference variant:
//!
//! - activity: `activity`, `page`, `runKey`
//! - sequence: `page`, `preview`, `sequence`, `sequenceActivity`
//!
//! Keys without a value are omitted; `preview` is written as a bare flag.

use crate::ActivityReference;

/// Page token for a page id as understood by the player (`page_<id>`)
pub fn page_token(page_id: &str) -> String {
    format!("page_{}", page_id)
}

/// Full player URL for `reference`, showing `page` or the home view when `None`
pub fn navigation_url(base_url: &str, reference: &ActivityReference, page: Option<&str>) -> String {
    format!("{}?{}", base_url, navigation_query(reference, page))
}

/// Query string (without the leading `?`) for `reference` and `page`
pub fn navigation_query(reference: &ActivityReference, page: Option<&str>) -> String {
    let params: Vec<(&str, Option<String>)> = match reference {
        ActivityReference::Activity {
            resource_url,
            run_key,
            ..
        } => vec![
            ("activity", Some(encode(resource_url))),
            ("page", page.map(encode)),
            ("runKey", run_key.as_deref().map(encode)),
        ],
        ActivityReference::Sequence {
            resource_url,
            activity_id,
            preview,
            ..
        } => vec![
            ("page", page.map(encode)),
            ("preview", preview.then(String::new)),
            ("sequence", Some(encode(resource_url))),
            ("sequenceActivity", Some(encode(activity_id))),
        ],
    };

    params
        .into_iter()
        .filter_map(|(key, value)| {
            value.map(|v| {
                if v.is_empty() {
                    key.to_string()
                } else {
                    format!("{}={}", key, v)
                }
            })
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

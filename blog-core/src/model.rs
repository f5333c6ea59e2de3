use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LookupError;

/// Listing entry. `uid` is the stable identity and list key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireSummary", into = "WireSummary")]
pub struct PostSummary {
    pub uid: String,
    pub published_at: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// One page of the listing endpoint. `next_page_url == None` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostPage {
    #[serde(rename = "next_page", default)]
    pub next_page_url: Option<String>,
    #[serde(default, deserialize_with = "usable_summaries")]
    pub results: Vec<PostSummary>,
}

/// Entries that fail to convert (no uid, wrong shape) are dropped one by one
/// so the rest of the page stays usable.
fn usable_summaries<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<PostSummary>, D::Error> {
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<PostSummary>(value) {
            Ok(post) => Some(post),
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping malformed listing entry");
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Structured-text block as produced by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl RichTextBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: "paragraph".into(),
            text: text.into(),
            spans: Vec::new(),
            url: None,
            alt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub uid: String,
    pub published_at: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Banner,
    pub content: Vec<ContentSection>,
}

impl PostRecord {
    pub fn banner_url(&self) -> &str {
        &self.banner.url
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireSummary {
    #[serde(default)]
    uid: Option<String>,
    #[serde(default, with = "timestamp")]
    first_publication_date: Option<DateTime<Utc>>,
    data: WireSummaryData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireSummaryData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    subtitle: String,
    #[serde(default)]
    author: String,
}

impl TryFrom<WireSummary> for PostSummary {
    type Error = String;

    fn try_from(wire: WireSummary) -> Result<Self, Self::Error> {
        let uid = wire
            .uid
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| "post summary without uid".to_string())?;
        Ok(Self {
            uid,
            published_at: wire.first_publication_date,
            title: wire.data.title,
            subtitle: wire.data.subtitle,
            author: wire.data.author,
        })
    }
}

impl From<PostSummary> for WireSummary {
    fn from(post: PostSummary) -> Self {
        Self {
            uid: Some(post.uid),
            first_publication_date: post.published_at,
            data: WireSummaryData {
                title: post.title,
                subtitle: post.subtitle,
                author: post.author,
            },
        }
    }
}

/// Full post document as returned by a content-store search. Every field is
/// optional here so a missing one becomes a `MalformedRecord` instead of a
/// parse failure for the whole response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PostDocument {
    #[serde(default)]
    uid: Option<String>,
    #[serde(default, with = "timestamp")]
    first_publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    data: Option<PostDocumentData>,
}

#[derive(Debug, Clone, Deserialize)]
struct PostDocumentData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    banner: Option<WireBanner>,
    #[serde(default)]
    content: Option<Vec<WireSection>>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireBanner {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    alt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireSection {
    #[serde(default)]
    heading: Option<String>,
    #[serde(default)]
    body: Vec<RichTextBlock>,
}

impl PostDocument {
    pub(crate) fn into_record(self, slug: &str) -> Result<PostRecord, LookupError> {
        let malformed = |reason: &str| LookupError::MalformedRecord {
            slug: slug.to_owned(),
            reason: reason.to_owned(),
        };
        let data = self.data.ok_or_else(|| malformed("missing data"))?;
        let title = data.title.ok_or_else(|| malformed("missing title"))?;
        let author = data.author.ok_or_else(|| malformed("missing author"))?;
        let content = data
            .content
            .ok_or_else(|| malformed("missing content"))?
            .into_iter()
            .map(|section| ContentSection {
                heading: section.heading.unwrap_or_default(),
                body: section.body,
            })
            .collect();
        let banner = data
            .banner
            .map(|banner| Banner {
                url: banner.url.unwrap_or_default(),
                alt: banner.alt.unwrap_or_default(),
            })
            .unwrap_or_default();

        Ok(PostRecord {
            uid: self.uid.unwrap_or_else(|| slug.to_owned()),
            published_at: self.first_publication_date,
            title,
            subtitle: data.subtitle.unwrap_or_default(),
            author,
            banner,
            content,
        })
    }
}

/// Content-store timestamps look like `2021-03-15T19:25:28+0000`; RFC 3339
/// is accepted too. Unparsable values read as an unknown date.
mod timestamp {
    use super::*;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|value| parse(&value)))
    }

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        let parsed = DateTime::parse_from_rfc3339(value)
            .or_else(|_| DateTime::parse_from_str(value, FORMAT))
            .map(|dt| dt.with_timezone(&Utc));
        match parsed {
            Ok(ts) => Some(ts),
            Err(err) => {
                tracing::warn!(value, error = %err, "unparsable publication date");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn summary_uses_content_store_field_names() {
        let raw = r#"{
            "uid": "hello-world",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": { "title": "Hello", "subtitle": "First post", "author": "Ana" }
        }"#;
        let post: PostSummary = serde_json::from_str(raw).unwrap();
        assert_eq!(post.uid, "hello-world");
        assert_eq!(
            post.published_at,
            Some(Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap())
        );
        assert_eq!(post.author, "Ana");

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["data"]["title"], "Hello");
        assert_eq!(value["first_publication_date"], "2021-03-15T19:25:28+0000");
    }

    #[test]
    fn page_ignores_extra_search_fields() {
        let raw = r#"{
            "page": 1, "total_pages": 3, "next_page": "http://cms/page2",
            "results": [{ "uid": "a", "first_publication_date": null, "type": "post",
                          "data": { "title": "A", "subtitle": "", "author": "X", "banner": {} } }]
        }"#;
        let page: PostPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.next_page_url.as_deref(), Some("http://cms/page2"));
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].published_at, None);
    }

    #[test]
    fn summary_without_uid_is_rejected() {
        let raw = r#"{ "first_publication_date": null, "data": { "title": "A" } }"#;
        assert!(serde_json::from_str::<PostSummary>(raw).is_err());
    }

    #[test]
    fn page_drops_entries_without_uid() {
        let raw = r#"{
            "next_page": "http://cms/page2",
            "results": [
                { "uid": "good", "first_publication_date": null,
                  "data": { "title": "Good", "subtitle": "", "author": "Ana" } },
                { "first_publication_date": null, "data": { "title": "No uid" } },
                { "uid": "", "data": { "title": "Empty uid" } }
            ]
        }"#;
        let page: PostPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].uid, "good");
        assert_eq!(page.next_page_url.as_deref(), Some("http://cms/page2"));
    }

    #[test]
    fn document_missing_title_is_malformed() {
        let raw = r#"{ "uid": "x", "data": { "author": "A", "content": [] } }"#;
        let doc: PostDocument = serde_json::from_str(raw).unwrap();
        let err = doc.into_record("x").unwrap_err();
        assert!(matches!(err, LookupError::MalformedRecord { .. }));
        assert!(err.is_terminal());
    }

    #[test]
    fn garbage_date_reads_as_unknown() {
        assert_eq!(timestamp::parse("yesterday"), None);
        assert!(timestamp::parse("2021-03-15T00:00:00Z").is_some());
    }
}

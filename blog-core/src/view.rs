use serde::Serialize;

use crate::date_format::{display_date, Locale};
use crate::model::{Banner, PostPage, PostRecord, PostSummary};
use crate::pagination::PaginationState;
use crate::read_time;
use crate::rich_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub html: String,
}

/// Everything the detail template needs, dates already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Banner,
    pub published: String,
    pub read_time_minutes: u32,
    pub sections: Vec<SectionView>,
}

impl PostView {
    pub fn build(post: &PostRecord, locale: Locale) -> Self {
        Self {
            uid: post.uid.clone(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            banner: post.banner.clone(),
            published: display_date(post.published_at.as_ref(), locale),
            read_time_minutes: read_time::estimate(&post.content),
            sections: post
                .content
                .iter()
                .map(|section| SectionView {
                    heading: section.heading.clone(),
                    html: rich_text::as_html(&section.body),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingItem {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub published: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingView {
    pub items: Vec<ListingItem>,
    /// Present iff the "load more" control is shown.
    pub load_more: Option<String>,
}

impl ListingView {
    pub fn from_state(state: &PaginationState, locale: Locale) -> Self {
        Self {
            items: state
                .loaded_posts
                .iter()
                .map(|post| ListingItem::build(post, locale))
                .collect(),
            load_more: state.next_page_url.clone(),
        }
    }

    pub fn from_page(page: &PostPage, locale: Locale) -> Self {
        Self::from_state(&PaginationState::from_first_page(page.clone()), locale)
    }
}

impl ListingItem {
    fn build(post: &PostSummary, locale: Locale) -> Self {
        Self {
            uid: post.uid.clone(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            published: display_date(post.published_at.as_ref(), locale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentSection, RichTextBlock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn detail_view_formats_lazily() {
        let post = PostRecord {
            uid: "hello".into(),
            published_at: Some(Utc.with_ymd_and_hms(2021, 3, 15, 0, 0, 0).unwrap()),
            title: "Hello".into(),
            subtitle: "sub".into(),
            author: "Ana".into(),
            banner: Banner::default(),
            content: vec![ContentSection {
                heading: "Intro".into(),
                body: vec![RichTextBlock::paragraph("Olá <mundo>")],
            }],
        };
        let view = PostView::build(&post, Locale::PtBr);
        assert_eq!(view.published, "15 mar 2021");
        assert_eq!(view.read_time_minutes, 1);
        assert_eq!(view.sections[0].html, "<p>Olá &lt;mundo&gt;</p>");
    }

    #[test]
    fn listing_without_next_page_has_no_load_more() {
        let page = PostPage {
            next_page_url: None,
            results: vec![PostSummary {
                uid: "a".into(),
                published_at: None,
                title: "A".into(),
                subtitle: String::new(),
                author: "X".into(),
            }],
        };
        let view = ListingView::from_page(&page, Locale::EnUs);
        assert!(view.load_more.is_none());
        assert_eq!(view.items[0].published, "unknown date");
    }
}

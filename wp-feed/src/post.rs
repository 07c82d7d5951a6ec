use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Deserializer, Serialize};

use crate::date::{normalize, NormalizedDate};

macro_rules! selector {
    ($query:expr) => {{
        static SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse($query).unwrap());
        &SELECTOR
    }};
}

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub slug: String,
    pub title: Rendered,
    pub date: String,
    #[serde(default, deserialize_with = "fields_or_none")]
    pub acf: Option<Acf>,
    #[serde(default)]
    pub excerpt: Option<Rendered>,
    #[serde(default)]
    pub content: Option<Rendered>,
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<Embedded>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    pub rendered: String,
}

/// Custom fields attached to events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acf {
    #[serde(default, deserialize_with = "text_or_none")]
    pub data_evento: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub luogo: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub orario: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embedded {
    #[serde(rename = "wp:featuredmedia", default)]
    pub featured_media: Vec<Media>,
    #[serde(rename = "wp:term", default)]
    pub terms: Vec<Vec<Term>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

// The CMS sends `[]` or `false` instead of an object when no custom field is set.
fn fields_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Acf>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .is_object()
        .then(|| serde_json::from_value(value).ok())
        .flatten())
}

// Same story for single fields: an unset field may come back as `false` or `null`.
fn text_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<String>();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Post {
    pub fn event_date(&self) -> NormalizedDate {
        normalize(self.acf.as_ref().and_then(|acf| acf.data_evento.as_deref()))
    }

    pub fn publish_date(&self) -> NormalizedDate {
        normalize(Some(&self.date))
    }

    pub fn location(&self) -> Option<&str> {
        self.acf.as_ref()?.luogo.as_deref()
    }

    pub fn time_of_day(&self) -> Option<&str> {
        self.acf.as_ref()?.orario.as_deref()
    }

    #[must_use]
    pub fn plain_title(&self) -> String {
        html_to_text(&self.title.rendered)
    }

    #[must_use]
    pub fn plain_excerpt(&self) -> String {
        self.excerpt
            .as_ref()
            .map(|excerpt| html_to_text(&excerpt.rendered))
            .unwrap_or_default()
    }

    /// Estimated reading time, never below one minute.
    pub fn reading_minutes(&self) -> usize {
        let words = self
            .content
            .as_ref()
            .map(|content| html_to_text(&content.rendered).split_whitespace().count())
            .unwrap_or_default();

        words.div_ceil(WORDS_PER_MINUTE).max(1)
    }

    /// The embedded featured media, falling back to the first inline image.
    pub fn featured_image(&self) -> Option<String> {
        let embedded = self
            .embedded
            .as_ref()
            .and_then(|embedded| embedded.featured_media.first())
            .and_then(|media| media.source_url.clone());

        embedded.or_else(|| {
            let content = Html::parse_fragment(&self.content.as_ref()?.rendered);
            content
                .select(selector!("img[src]"))
                .next()?
                .value()
                .attr("src")
                .map(str::to_string)
        })
    }

    pub fn primary_category(&self) -> Option<&Term> {
        self.embedded.as_ref()?.terms.first()?.first()
    }
}

/// The collections the site reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Posts,
    Progetto,
    Evento,
    Escursione,
    Attivita,
    Alloggio,
}

impl PostType {
    pub const ALL: [PostType; 6] = [
        Self::Posts,
        Self::Progetto,
        Self::Evento,
        Self::Escursione,
        Self::Attivita,
        Self::Alloggio,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Progetto => "progetto",
            Self::Evento => "evento",
            Self::Escursione => "escursione",
            Self::Attivita => "attivita",
            Self::Alloggio => "alloggio",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|post_type| post_type.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown post type `{s}`"))
    }
}

#[cfg(test)]
pub(crate) fn event(id: u64, data_evento: Option<&str>) -> Post {
    Post {
        id,
        slug: format!("evento-{id}"),
        title: Rendered {
            rendered: format!("Evento {id}"),
        },
        date: "2024-01-01T09:00:00".to_string(),
        acf: Some(Acf {
            data_evento: data_evento.map(str::to_string),
            ..Acf::default()
        }),
        excerpt: None,
        content: None,
        embedded: None,
    }
}

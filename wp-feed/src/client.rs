use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::{PageQuery, Post, PostType};

const API_PATH: &str = "/wp-json/wp/v2";

pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
}

/// Reads collections from the CMS REST API.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: String,
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        let endpoint = format!("{}{API_PATH}", config.base_url.trim_end_matches('/'));

        Ok(Self { http, endpoint })
    }

    /// One page of `post_type`. Anything but a successful JSON array is an error.
    pub async fn fetch_page(&self, post_type: PostType, query: PageQuery) -> Result<Vec<Post>> {
        let mut params = vec![
            ("per_page", query.per_page.to_string()),
            ("page", query.page.to_string()),
        ];
        if query.embed {
            params.push(("_embed", "true".to_string()));
        }

        self.get(post_type, &params).await
    }

    pub async fn fetch_by_slug(&self, post_type: PostType, slug: &str) -> Result<Option<Post>> {
        let params = [("slug", slug.to_string()), ("_embed", "true".to_string())];
        let posts = self.get(post_type, &params).await?;
        Ok(posts.into_iter().next())
    }

    async fn get(&self, post_type: PostType, params: &[(&str, String)]) -> Result<Vec<Post>> {
        let url = format!("{}/{post_type}", self.endpoint);
        log::debug!("GET {url} {params:?}");

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("{url} responded with {status}"));
        }

        response
            .json::<Vec<Post>>()
            .await
            .with_context(|| format!("malformed {post_type} payload from {url}"))
    }
}

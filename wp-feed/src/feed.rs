use std::future::Future;

use serde::Serialize;

use crate::Post;

/// Query for one page of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub per_page: u32,
    pub page: u32,
    pub embed: bool,
}

/// An append-only, page-by-page accumulation of posts.
///
/// `exhausted` only ever goes from `false` to `true`. A failed fetch
/// exhausts the feed the same way a short page does; the failure message is
/// kept in `last_error` for callers that want to tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feed {
    posts: Vec<Post>,
    page_size: u32,
    current_page: u32,
    exhausted: bool,
    last_error: Option<String>,
}

impl Feed {
    pub fn new(page_size: u32) -> Self {
        Self {
            posts: Vec::new(),
            page_size: page_size.max(1),
            current_page: 0,
            exhausted: false,
            last_error: None,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The query `load_next` would issue, or `None` once exhausted.
    pub fn next_query(&self) -> Option<PageQuery> {
        (!self.exhausted).then_some(PageQuery {
            per_page: self.page_size,
            page: self.current_page + 1,
            embed: true,
        })
    }

    /// Folds the outcome of fetching `next_query()` into the feed.
    #[must_use]
    pub fn apply_page(mut self, outcome: anyhow::Result<Vec<Post>>) -> Self {
        if self.exhausted {
            return self;
        }

        match outcome {
            Ok(page) if page.is_empty() => {
                self.exhausted = true;
            }
            Ok(mut page) => {
                let received = page.len();
                self.posts.append(&mut page);
                self.current_page += 1;
                self.exhausted = received < self.page_size as usize;
            }
            Err(err) => {
                self.exhausted = true;
                self.last_error = Some(format!("{err:#}"));
            }
        }

        self
    }

    /// Fetches and applies the next page.
    ///
    /// A no-op once the feed is exhausted: `fetch` is not called. Dropping
    /// the returned future before it resolves leaves the feed untouched.
    pub async fn load_next<F, Fut>(&mut self, fetch: F) -> &Self
    where
        F: FnOnce(PageQuery) -> Fut,
        Fut: Future<Output = anyhow::Result<Vec<Post>>>,
    {
        let Some(query) = self.next_query() else {
            return self;
        };

        let outcome = fetch(query).await;

        match &outcome {
            Ok(page) => log::debug!("page {} returned {} posts", query.page, page.len()),
            Err(err) => log::warn!("page {} failed: {err:#}", query.page),
        }

        let page_size = self.page_size;
        let feed = std::mem::replace(self, Feed::new(page_size));
        *self = feed.apply_page(outcome);

        if self.exhausted {
            log::debug!("feed exhausted after {} posts", self.posts.len());
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::future;
    use std::time::Duration;

    use anyhow::anyhow;

    use super::*;
    use crate::post::event;

    fn page(first_id: u64, len: usize) -> Vec<Post> {
        (first_id..first_id + len as u64)
            .map(|id| event(id, None))
            .collect()
    }

    struct Backend {
        pages: RefCell<VecDeque<anyhow::Result<Vec<Post>>>>,
        seen: RefCell<Vec<PageQuery>>,
    }

    impl Backend {
        fn new(pages: impl IntoIterator<Item = anyhow::Result<Vec<Post>>>) -> Self {
            Self {
                pages: RefCell::new(pages.into_iter().collect()),
                seen: RefCell::default(),
            }
        }

        fn fetch(&self, query: PageQuery) -> future::Ready<anyhow::Result<Vec<Post>>> {
            self.seen.borrow_mut().push(query);
            let next = self
                .pages
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()));
            future::ready(next)
        }
    }

    #[test]
    fn starts_empty_on_page_zero() {
        let feed = Feed::new(12);
        assert!(feed.posts().is_empty());
        assert_eq!(feed.current_page(), 0);
        assert!(!feed.is_exhausted());
        assert_eq!(
            feed.next_query(),
            Some(PageQuery {
                per_page: 12,
                page: 1,
                embed: true
            })
        );
    }

    #[tokio::test]
    async fn accumulates_until_a_short_page() {
        let backend = Backend::new([Ok(page(1, 12)), Ok(page(13, 12)), Ok(page(25, 5))]);
        let mut feed = Feed::new(12);

        for _ in 0..3 {
            feed.load_next(|query| backend.fetch(query)).await;
        }

        assert_eq!(feed.posts().len(), 29);
        assert_eq!(feed.current_page(), 3);
        assert!(feed.is_exhausted());
        assert_eq!(
            backend.seen.borrow().iter().map(|q| q.page).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let ids = feed.posts().iter().map(|post| post.id).collect::<Vec<_>>();
        assert_eq!(ids, (1..=29).collect::<Vec<_>>());

        feed.load_next(|query| backend.fetch(query)).await;
        assert_eq!(feed.posts().len(), 29);
        assert_eq!(feed.current_page(), 3);
        assert_eq!(backend.seen.borrow().len(), 3);
    }

    #[tokio::test]
    async fn short_first_page_exhausts_immediately() {
        let backend = Backend::new([Ok(page(1, 3))]);
        let mut feed = Feed::new(12);

        feed.load_next(|query| backend.fetch(query)).await;

        assert_eq!(feed.posts().len(), 3);
        assert_eq!(feed.current_page(), 1);
        assert!(feed.is_exhausted());
        assert_eq!(feed.next_query(), None);
    }

    #[tokio::test]
    async fn empty_page_exhausts_without_advancing() {
        let backend = Backend::new([Ok(page(1, 2)), Ok(Vec::new())]);
        let mut feed = Feed::new(2);

        feed.load_next(|query| backend.fetch(query)).await;
        assert!(!feed.is_exhausted());

        feed.load_next(|query| backend.fetch(query)).await;
        assert!(feed.is_exhausted());
        assert_eq!(feed.current_page(), 1);
        assert_eq!(feed.posts().len(), 2);
        assert_eq!(feed.last_error(), None);
    }

    #[tokio::test]
    async fn failure_keeps_what_was_loaded() {
        let backend = Backend::new([Ok(page(1, 4)), Err(anyhow!("503 Service Unavailable"))]);
        let mut feed = Feed::new(4);

        feed.load_next(|query| backend.fetch(query)).await;
        feed.load_next(|query| backend.fetch(query)).await;

        assert!(feed.is_exhausted());
        assert_eq!(feed.posts().len(), 4);
        assert_eq!(feed.current_page(), 1);
        assert_eq!(feed.last_error(), Some("503 Service Unavailable"));
    }

    #[test]
    fn failure_on_first_page_leaves_it_empty() {
        let feed = Feed::new(12).apply_page(Err(anyhow!("connection refused")));
        assert!(feed.is_exhausted());
        assert!(feed.posts().is_empty());
        assert_eq!(feed.current_page(), 0);
    }

    #[test]
    fn duplicates_are_passed_through() {
        let feed = Feed::new(2)
            .apply_page(Ok(page(1, 2)))
            .apply_page(Ok(page(2, 2)));

        let ids = feed.posts().iter().map(|post| post.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 2, 3]);
    }

    #[test]
    fn exhaustion_is_final() {
        let feed = Feed::new(12).apply_page(Ok(page(1, 3)));
        let again = feed.clone().apply_page(Ok(page(4, 12)));
        assert_eq!(again, feed);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        assert_eq!(Feed::new(0).page_size(), 1);
    }

    #[tokio::test]
    async fn dropped_load_leaves_feed_untouched() {
        let mut feed = Feed::new(12).apply_page(Ok(page(1, 12)));
        let before = feed.clone();

        let pending = tokio::time::timeout(
            Duration::from_millis(10),
            feed.load_next(|_| future::pending::<anyhow::Result<Vec<Post>>>()),
        )
        .await;

        assert!(pending.is_err());
        assert_eq!(feed, before);
    }
}

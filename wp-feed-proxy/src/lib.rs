use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use wp_feed::{
    calendar, upcoming, CalendarGrid, Client, Feed, PageQuery, Post, PostType, Term, ViewMode,
    YearMonth,
};

pub mod cli;

const MAX_NEWS_PAGES: u32 = 20;
const EVENTS_CALENDAR_NAME: &str = "Eventi";

pub struct Settings {
    /// Public URL of the site, used for links in exported calendars.
    pub site: String,
    pub per_page: u32,
    pub events_per_page: u32,
}

#[derive(Clone)]
struct AppState {
    client: Client,
    settings: Arc<Settings>,
}

pub fn router(client: Client, settings: Settings) -> Router {
    Router::new()
        .route("/news", get(handle_news))
        .route("/events", get(handle_events))
        .route("/events.ics", get(handle_events_ics))
        .route("/:post_type/:slug", get(handle_post))
        .with_state(AppState {
            client,
            settings: Arc::new(settings),
        })
}

#[derive(Deserialize)]
struct NewsQuery {
    pages: Option<u32>,
}

#[derive(Serialize)]
struct NewsResponse<'a> {
    posts: &'a [Post],
    page: u32,
    exhausted: bool,
    error: Option<&'a str>,
}

async fn handle_news(State(state): State<AppState>, Query(query): Query<NewsQuery>) -> Response {
    let pages = query.pages.unwrap_or(1).clamp(1, MAX_NEWS_PAGES);
    let mut feed = Feed::new(state.settings.per_page);

    for _ in 0..pages {
        if feed.is_exhausted() {
            break;
        }
        feed.load_next(|query| state.client.fetch_page(PostType::Posts, query))
            .await;
    }

    Json(NewsResponse {
        posts: feed.posts(),
        page: feed.current_page(),
        exhausted: feed.is_exhausted(),
        error: feed.last_error(),
    })
    .into_response()
}

#[derive(Deserialize)]
struct EventsQuery {
    view: Option<String>,
    year: Option<i32>,
    month: Option<i32>,
    today: Option<NaiveDate>,
}

#[derive(Serialize)]
struct EventList<'a> {
    view: ViewMode,
    today: NaiveDate,
    events: Vec<&'a Post>,
}

#[derive(Serialize)]
struct EventCalendar<'a> {
    view: ViewMode,
    previous: YearMonth,
    next: YearMonth,
    grid: CalendarGrid<'a>,
}

async fn handle_events(State(state): State<AppState>, Query(query): Query<EventsQuery>) -> Response {
    let view = match query.view.as_deref().map(str::parse::<ViewMode>).transpose() {
        Ok(view) => view.unwrap_or_default(),
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    let today = query.today.unwrap_or_else(|| Local::now().date_naive());
    let events = fetch_events(&state).await;

    match view {
        ViewMode::List => Json(EventList {
            view,
            today,
            events: upcoming(&events, today),
        })
        .into_response(),
        ViewMode::Calendar => {
            let target = YearMonth::new(
                query.year.unwrap_or(today.year()),
                query.month.unwrap_or(today.month() as i32),
            );

            Json(EventCalendar {
                view,
                previous: target.previous(),
                next: target.next(),
                grid: calendar::build_for(target, &events),
            })
            .into_response()
        }
    }
}

async fn handle_events_ics(State(state): State<AppState>) -> Response {
    let events = fetch_events(&state).await;
    let calendar = wp_feed::to_ics(EVENTS_CALENDAR_NAME, &state.settings.site, &events);

    ([("content-type", "text/calendar")], calendar.to_string()).into_response()
}

// A failed fetch shows up as an empty collection, same as no events at all.
async fn fetch_events(state: &AppState) -> Vec<Post> {
    let query = PageQuery {
        per_page: state.settings.events_per_page,
        page: 1,
        embed: true,
    };

    match state.client.fetch_page(PostType::Evento, query).await {
        Ok(events) => events,
        Err(err) => {
            log::warn!("Failed to fetch events: {err:#}");
            Vec::new()
        }
    }
}

#[derive(Serialize)]
struct PostDetail<'a> {
    post: &'a Post,
    title: String,
    excerpt: String,
    reading_minutes: usize,
    featured_image: Option<String>,
    category: Option<&'a Term>,
    event_date: Option<NaiveDate>,
}

async fn handle_post(
    State(state): State<AppState>,
    Path((post_type, slug)): Path<(String, String)>,
) -> Response {
    let Ok(post_type) = post_type.parse::<PostType>() else {
        return (StatusCode::BAD_REQUEST, format!("Unknown post type `{post_type}`"))
            .into_response();
    };

    let post = match state.client.fetch_by_slug(post_type, &slug).await {
        Ok(Some(post)) => post,
        Ok(None) => return (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(err) => {
            log::warn!("Failed to fetch {post_type} `{slug}`: {err:#}");
            return (StatusCode::NOT_FOUND, "Post not found").into_response();
        }
    };

    Json(PostDetail {
        post: &post,
        title: post.plain_title(),
        excerpt: post.plain_excerpt(),
        reading_minutes: post.reading_minutes(),
        featured_image: post.featured_image(),
        category: post.primary_category(),
        event_date: post.event_date().date(),
    })
    .into_response()
}

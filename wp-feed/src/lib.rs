//! Feed, upcoming-events and month-calendar logic for a site backed by the
//! WordPress REST API.

pub mod calendar;
pub mod client;
pub mod date;
pub mod events;
pub mod feed;
mod post;

#[cfg(feature = "ics")]
mod ics;

pub use calendar::{build, CalendarCell, CalendarGrid, ViewMode, YearMonth};
pub use client::Client;
pub use date::{normalize, DateFormat, NormalizedDate};
pub use events::upcoming;
pub use feed::{Feed, PageQuery};
pub use post::{Acf, Embedded, Media, Post, PostType, Rendered, Term};

#[cfg(feature = "ics")]
pub use crate::ics::to_ics;

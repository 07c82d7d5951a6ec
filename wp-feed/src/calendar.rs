use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::Post;

/// Which rendering of the event collection the caller wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Calendar,
}

impl FromStr for ViewMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(Self::List),
            "calendar" => Ok(Self::Calendar),
            other => Err(anyhow::anyhow!("unknown view `{other}`")),
        }
    }
}

/// A month of a year, with `month` always in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Any month number is accepted and carried into the year, so month 0
    /// is December of the previous year and month 13 January of the next.
    pub fn new(year: i32, month: i32) -> Self {
        let index = i64::from(year) * 12 + i64::from(month) - 1;
        Self {
            year: index.div_euclid(12).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days(self) -> Option<u32> {
        let first = self.first_day()?;
        let next = first.checked_add_months(Months::new(1))?;
        Some(next.signed_duration_since(first).num_days() as u32)
    }

    /// The previous month, or `self` at the edge of the representable range.
    #[must_use]
    pub fn previous(self) -> Self {
        self.shift(|first| first.checked_sub_months(Months::new(1)))
    }

    /// The next month, or `self` at the edge of the representable range.
    #[must_use]
    pub fn next(self) -> Self {
        self.shift(|first| first.checked_add_months(Months::new(1)))
    }

    fn shift(self, step: impl FnOnce(NaiveDate) -> Option<NaiveDate>) -> Self {
        self.first_day().and_then(step).map_or(self, Self::of)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalendarCell<'a> {
    Blank,
    Day { day: u32, events: Vec<&'a Post> },
}

impl CalendarCell<'_> {
    pub fn day(&self) -> Option<u32> {
        match self {
            Self::Blank => None,
            Self::Day { day, .. } => Some(*day),
        }
    }

    pub fn events(&self) -> &[&Post] {
        match self {
            Self::Blank => &[],
            Self::Day { events, .. } => events,
        }
    }

    pub fn has_events(&self) -> bool {
        !self.events().is_empty()
    }
}

/// A Monday-first month view. Rows are seven cells wide; the last row is
/// not padded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarGrid<'a> {
    pub year: i32,
    pub month: u32,
    pub leading_blanks: u32,
    pub days_in_month: u32,
    pub cells: Vec<CalendarCell<'a>>,
}

impl<'a> CalendarGrid<'a> {
    pub const WIDTH: usize = 7;

    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell<'a>]> {
        self.cells.chunks(Self::WIDTH)
    }

    pub fn day(&self, day: u32) -> Option<&CalendarCell<'a>> {
        if day == 0 || day > self.days_in_month {
            return None;
        }
        self.cells.get((self.leading_blanks + day - 1) as usize)
    }
}

/// Lays out `month` of `year` and places every event on its day.
///
/// `month` may be outside `1..=12`; see [`YearMonth::new`].
pub fn build(year: i32, month: i32, posts: &[Post]) -> CalendarGrid<'_> {
    build_for(YearMonth::new(year, month), posts)
}

pub fn build_for(target: YearMonth, posts: &[Post]) -> CalendarGrid<'_> {
    let (Some(first), Some(days_in_month)) = (target.first_day(), target.days()) else {
        return CalendarGrid {
            year: target.year,
            month: target.month,
            leading_blanks: 0,
            days_in_month: 0,
            cells: Vec::new(),
        };
    };

    let leading_blanks = first.weekday().num_days_from_monday();

    let mut buckets = vec![Vec::new(); days_in_month as usize];
    for post in posts {
        let Some(date) = post.event_date().date() else {
            continue;
        };

        if YearMonth::of(date) == target {
            buckets[date.day0() as usize].push(post);
        }
    }

    let cells = std::iter::repeat_with(|| CalendarCell::Blank)
        .take(leading_blanks as usize)
        .chain(
            buckets
                .into_iter()
                .zip(1..)
                .map(|(events, day)| CalendarCell::Day { day, events }),
        )
        .collect();

    CalendarGrid {
        year: target.year,
        month: target.month,
        leading_blanks,
        days_in_month,
        cells,
    }
}

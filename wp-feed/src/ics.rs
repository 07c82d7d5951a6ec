use chrono::NaiveTime;
use ics::{
    components::Parameter,
    parameters::TzIDParam,
    properties::{DtStart, Location, RRule, Summary, TzName, URL},
    Daylight, Standard, TimeZone,
};

use crate::Post;

const TIMEZONE: &str = "Europe/Rome";
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H.%M"];

/// All posts with a usable event date, as one iCalendar feed.
///
/// `site` is used for event UIDs and links, e.g. `https://example.org`.
#[must_use]
pub fn to_ics<'a>(name: &'a str, site: &str, posts: &[Post]) -> ics::ICalendar<'a> {
    let mut cet_standard = Standard::new("19701025T030000", "+0200", "+0100");
    cet_standard.push(TzName::new("CET"));
    cet_standard.push(RRule::new("FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU"));

    let mut cest_daylight = Daylight::new("19700329T020000", "+0100", "+0200");
    cest_daylight.push(TzName::new("CEST"));
    cest_daylight.push(RRule::new("FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU"));

    let mut timezone = TimeZone::daylight(TIMEZONE, cest_daylight);
    timezone.add_standard(cet_standard);

    let mut icalendar = ics::ICalendar::new("2.0", name);
    icalendar.add_timezone(timezone);

    for event in posts.iter().filter_map(|post| post.to_ics(site)) {
        icalendar.add_event(event);
    }

    icalendar
}

impl Post {
    /// `None` when the post has no usable event date.
    #[must_use]
    pub fn to_ics(&self, site: &str) -> Option<ics::Event<'static>> {
        let date = self.event_date().date()?;
        let stamp = self
            .publish_date()
            .instant()
            .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
            .format("%Y%m%dT%H%M%S")
            .to_string();

        let host = site
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        let mut event = ics::Event::new(format!("evento-{}@{host}", self.id), stamp);

        let start = match self.time_of_day().and_then(parse_time) {
            Some(time) => {
                let mut start = DtStart::new(date.and_time(time).format("%Y%m%dT%H%M%S").to_string());
                start.add(TzIDParam::new(TIMEZONE));
                start
            }
            None => {
                let mut start = DtStart::new(date.format("%Y%m%d").to_string());
                start.add(Parameter::new("VALUE", "DATE"));
                start
            }
        };

        event.push(start);
        event.push(Summary::new(ics::escape_text(self.plain_title())));
        event.push(URL::new(format!(
            "{}/eventi/{}",
            site.trim_end_matches('/'),
            self.slug
        )));

        if let Some(location) = self.location() {
            event.push(Location::new(ics::escape_text(location.to_string())));
        }

        Some(event)
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim().trim_start_matches("ore").trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

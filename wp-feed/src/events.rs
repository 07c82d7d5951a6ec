use chrono::NaiveDate;

use crate::Post;

/// Events happening on `today` or later, soonest first.
///
/// Events without a usable date are left out. Events sharing a date keep
/// the order they had in `posts`.
pub fn upcoming(posts: &[Post], today: NaiveDate) -> Vec<&Post> {
    let mut dated = posts
        .iter()
        .filter_map(|post| Some((post.event_date().instant()?, post)))
        .filter(|(instant, _)| instant.date() >= today)
        .collect::<Vec<_>>();

    dated.sort_by_key(|(instant, _)| *instant);
    dated.into_iter().map(|(_, post)| post).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::event;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn ids(posts: &[&Post]) -> Vec<u64> {
        posts.iter().map(|post| post.id).collect()
    }

    #[test]
    fn empty_in_empty_out() {
        assert!(upcoming(&[], today()).is_empty());
    }

    #[test]
    fn past_and_undated_events_are_dropped() {
        let posts = [
            event(1, Some("14/06/2024")),
            event(2, Some("15/06/2024")),
            event(3, None),
            event(4, Some("someday")),
            event(5, Some("01/01/2020")),
            event(6, Some("2024-06-14T23:59:59")),
        ];

        assert_eq!(ids(&upcoming(&posts, today())), vec![2]);
    }

    #[test]
    fn time_of_day_does_not_matter_for_today() {
        let posts = [event(1, Some("2024-06-15T00:00:01")), event(2, Some("2024-06-15T08:00:00"))];
        assert_eq!(ids(&upcoming(&posts, today())), vec![1, 2]);
    }

    #[test]
    fn sorted_ascending_and_stable_on_ties() {
        let posts = [
            event(1, Some("20/07/2024")),
            event(2, Some("16/06/2024")),
            event(3, Some("20/07/2024")),
            event(4, Some("2024-06-16")),
            event(5, Some("15/06/2024")),
        ];

        let result = upcoming(&posts, today());
        assert_eq!(ids(&result), vec![5, 2, 4, 1, 3]);

        let dates = result
            .iter()
            .map(|post| post.event_date().instant().unwrap())
            .collect::<Vec<_>>();
        assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn input_is_left_alone() {
        let posts = vec![event(1, Some("20/07/2024")), event(2, Some("16/06/2024"))];
        let before = posts.clone();

        let _ = upcoming(&posts, today());
        assert_eq!(posts, before);
    }
}

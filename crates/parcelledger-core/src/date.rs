//! Delivery date resolution from free text.
//!
//! Shipping emails phrase delivery estimates in many ways. Rules are tried in
//! a fixed priority order and the first one that yields a valid calendar date
//! wins. Relative phrases ("arriving today", "arriving Friday") are anchored to
//! the date the message was sent, never to the wall clock.
//!
//! Month/day phrases assume the sent date's year. A December email estimating
//! "January 3" therefore resolves to January of the same year; this is a known
//! limitation.

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::{Captures, Regex};

macro_rules! month {
    () => {
        r"\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b\.?"
    };
}

macro_rules! leading_weekday {
    () => {
        r"(?:(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*,?\s+)?"
    };
}

macro_rules! date_pattern {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($pattern).ok());
    };
}

date_pattern!(
    RE_ARRIVING_WEEKDAY,
    r"(?i)\barriving\s+(?:on\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b"
);
date_pattern!(
    RE_ARRIVING_MONTH_DAY,
    concat!(
        r"(?i)\barriving\s+(?:on\s+)?",
        leading_weekday!(),
        month!(),
        r"\s+(\d{1,2})(?:st|nd|rd|th)?\b"
    )
);
date_pattern!(
    RE_ARRIVING_DAY_MONTH,
    concat!(
        r"(?i)\barriving\s+(?:on\s+)?",
        leading_weekday!(),
        r"(\d{1,2})(?:st|nd|rd|th)?\s+",
        month!()
    )
);
date_pattern!(
    RE_ESTIMATE_MONTH_DAY,
    concat!(
        r"(?i)(?:(?:estimated\s+)?delivery|expected|arrives\s+by)[^\n\d]{0,40}?",
        month!(),
        r"\s+(\d{1,2})(?:st|nd|rd|th)?\b"
    )
);
date_pattern!(
    RE_ESTIMATE_DAY_MONTH,
    concat!(
        r"(?i)(?:(?:estimated\s+)?delivery|expected|arrives\s+by)[^\n\d]{0,40}?",
        r"\b(\d{1,2})(?:st|nd|rd|th)?\s+",
        month!()
    )
);
date_pattern!(
    RE_NUMERIC,
    r"(?i)(?:delivery|expected|arrives?)[^\n]*?\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b"
);
date_pattern!(
    RE_BY_MONTH_DAY,
    concat!(
        r"(?i)\b(?:by|before)\b[^\n]*?",
        month!(),
        r"\s+(\d{1,2})(?:st|nd|rd|th)?\b"
    )
);
date_pattern!(
    RE_BY_DAY_MONTH,
    concat!(
        r"(?i)\b(?:by|before)\b[^\n]*?",
        r"\b(\d{1,2})(?:st|nd|rd|th)?\s+",
        month!()
    )
);

/// One heuristic in the resolution chain.
#[derive(Debug, Clone, Copy)]
pub struct DateRule {
    /// Short identifier, used in logs and tests.
    pub name: &'static str,
    resolve: fn(&str, NaiveDate) -> Option<NaiveDate>,
}

impl DateRule {
    /// Apply this rule alone to `text`, anchored at `sent`.
    #[must_use]
    pub fn apply(&self, text: &str, sent: NaiveDate) -> Option<NaiveDate> {
        (self.resolve)(text, sent)
    }
}

/// Rules in priority order.
pub const RULES: [DateRule; 6] = [
    DateRule {
        name: "today",
        resolve: arriving_today,
    },
    DateRule {
        name: "arriving_weekday",
        resolve: arriving_weekday,
    },
    DateRule {
        name: "arriving_date",
        resolve: arriving_date,
    },
    DateRule {
        name: "estimated_date",
        resolve: estimated_date,
    },
    DateRule {
        name: "numeric_date",
        resolve: numeric_date,
    },
    DateRule {
        name: "by_date",
        resolve: by_date,
    },
];

/// Resolve the estimated delivery date in `text` for a message sent on `sent`.
#[must_use]
pub fn resolve_delivery_date(text: &str, sent: NaiveDate) -> Option<NaiveDate> {
    resolve_with_rule(text, sent).map(|(_, date)| date)
}

/// Like [`resolve_delivery_date`], also naming the rule that fired.
#[must_use]
pub fn resolve_with_rule(text: &str, sent: NaiveDate) -> Option<(&'static str, NaiveDate)> {
    RULES
        .iter()
        .find_map(|rule| rule.apply(text, sent).map(|date| (rule.name, date)))
}

fn arriving_today(text: &str, sent: NaiveDate) -> Option<NaiveDate> {
    let lower = text.to_lowercase();
    (lower.contains("arriving today") || lower.contains("delivered today")).then_some(sent)
}

fn arriving_weekday(text: &str, sent: NaiveDate) -> Option<NaiveDate> {
    let caps = RE_ARRIVING_WEEKDAY.as_ref()?.captures(text)?;
    let target = weekday_from_name(&caps[1])?;
    next_weekday_on_or_after(sent, target)
}

fn arriving_date(text: &str, sent: NaiveDate) -> Option<NaiveDate> {
    month_day_or_day_month(text, sent, &RE_ARRIVING_MONTH_DAY, &RE_ARRIVING_DAY_MONTH)
}

fn estimated_date(text: &str, sent: NaiveDate) -> Option<NaiveDate> {
    month_day_or_day_month(text, sent, &RE_ESTIMATE_MONTH_DAY, &RE_ESTIMATE_DAY_MONTH)
}

fn by_date(text: &str, sent: NaiveDate) -> Option<NaiveDate> {
    month_day_or_day_month(text, sent, &RE_BY_MONTH_DAY, &RE_BY_DAY_MONTH)
}

/// Day/month/year, the order used by the carriers in the registry.
fn numeric_date(text: &str, _sent: NaiveDate) -> Option<NaiveDate> {
    let caps = RE_NUMERIC.as_ref()?.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year = match caps[3].len() {
        2 => 2000 + caps[3].parse::<i32>().ok()?,
        4 => caps[3].parse::<i32>().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_day_or_day_month(
    text: &str,
    sent: NaiveDate,
    month_day: &LazyLock<Option<Regex>>,
    day_month: &LazyLock<Option<Regex>>,
) -> Option<NaiveDate> {
    let from_month_day = month_day
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| date_from_captures(&caps, 1, 2, sent.year()));

    from_month_day.or_else(|| {
        day_month
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| date_from_captures(&caps, 2, 1, sent.year()))
    })
}

fn date_from_captures(
    caps: &Captures<'_>,
    month_group: usize,
    day_group: usize,
    year: i32,
) -> Option<NaiveDate> {
    let month = month_from_name(caps.get(month_group)?.as_str())?;
    let day: u32 = caps.get(day_group)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.to_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Scans at most a week ahead; the sent date itself counts.
fn next_weekday_on_or_after(start: NaiveDate, target: Weekday) -> Option<NaiveDate> {
    (0..7)
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .find(|date| date.weekday() == target)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(name: &str) -> DateRule {
        *RULES.iter().find(|r| r.name == name).unwrap()
    }

    // 2024-01-01 is a Monday.
    fn monday() -> NaiveDate {
        date(2024, 1, 1)
    }

    #[test]
    fn test_patterns_compile() {
        for re in [
            &RE_ARRIVING_WEEKDAY,
            &RE_ARRIVING_MONTH_DAY,
            &RE_ARRIVING_DAY_MONTH,
            &RE_ESTIMATE_MONTH_DAY,
            &RE_ESTIMATE_DAY_MONTH,
            &RE_NUMERIC,
            &RE_BY_MONTH_DAY,
            &RE_BY_DAY_MONTH,
        ] {
            assert!(re.is_some());
        }
    }

    #[test]
    fn test_arriving_today_is_sent_date() {
        assert_eq!(
            resolve_delivery_date("Good news! Arriving today by 8pm", monday()),
            Some(monday())
        );
        assert_eq!(
            resolve_delivery_date("Your parcel was delivered today", monday()),
            Some(monday())
        );
    }

    #[test]
    fn test_today_beats_numeric_date() {
        let text = "Arriving today.\nEstimated delivery: 05/01/2024";
        assert_eq!(resolve_with_rule(text, monday()), Some(("today", monday())));
    }

    #[test]
    fn test_arriving_weekday_later_in_week() {
        assert_eq!(
            resolve_delivery_date("Order # 123-4567890-1234567, arriving Friday", monday()),
            Some(date(2024, 1, 5))
        );
    }

    #[test]
    fn test_arriving_weekday_same_day() {
        assert_eq!(
            resolve_delivery_date("Arriving Monday", monday()),
            Some(monday())
        );
    }

    #[test]
    fn test_arriving_weekday_wraps_into_next_week() {
        // Wednesday 2024-01-03 → Tuesday 2024-01-09.
        assert_eq!(
            rule("arriving_weekday").apply("arriving tuesday", date(2024, 1, 3)),
            Some(date(2024, 1, 9))
        );
    }

    #[test]
    fn test_arriving_month_day() {
        let r = rule("arriving_date");
        assert_eq!(r.apply("Arriving January 12", monday()), Some(date(2024, 1, 12)));
        assert_eq!(r.apply("arriving Fri, Jan 12", monday()), Some(date(2024, 1, 12)));
        assert_eq!(r.apply("Arriving 12th February", monday()), Some(date(2024, 2, 12)));
        assert_eq!(r.apply("arriving soon", monday()), None);
    }

    #[test]
    fn test_estimated_delivery_month_day() {
        let r = rule("estimated_date");
        assert_eq!(
            r.apply("Estimated delivery: March 3", monday()),
            Some(date(2024, 3, 3))
        );
        assert_eq!(
            r.apply("Expected 14 Feb", monday()),
            Some(date(2024, 2, 14))
        );
        assert_eq!(
            r.apply("Arrives by Sat, Jan 6", monday()),
            Some(date(2024, 1, 6))
        );
    }

    #[test]
    fn test_numeric_date_is_day_month_year() {
        let r = rule("numeric_date");
        assert_eq!(
            r.apply("Estimated delivery 15/01/2024", monday()),
            Some(date(2024, 1, 15))
        );
        assert_eq!(
            r.apply("Expected: 5-2-24", monday()),
            Some(date(2024, 2, 5))
        );
        assert_eq!(r.apply("Invoice 15/01/2024", monday()), None);
    }

    #[test]
    fn test_by_date() {
        let r = rule("by_date");
        assert_eq!(r.apply("Get it by March 2", monday()), Some(date(2024, 3, 2)));
        assert_eq!(
            r.apply("Should be with you before 9 January", monday()),
            Some(date(2024, 1, 9))
        );
    }

    #[test]
    fn test_invalid_calendar_date_falls_through() {
        let text = "Arriving February 30\nGet it by March 2";
        assert_eq!(rule("arriving_date").apply(text, monday()), None);
        assert_eq!(resolve_delivery_date(text, monday()), Some(date(2024, 3, 2)));
    }

    #[test]
    fn test_words_starting_with_month_prefix_are_not_months() {
        assert_eq!(rule("arriving_date").apply("Arriving marketplace 2", monday()), None);
        assert_eq!(rule("arriving_date").apply("Arriving 3 decorations", monday()), None);
        assert_eq!(rule("estimated_date").apply("Delivery decision 3 days", monday()), None);
        assert_eq!(rule("estimated_date").apply("Expected 2 separately", monday()), None);
        assert_eq!(
            resolve_with_rule("Sold by Amazon Marketplace 2 items in this order", monday()),
            None
        );
        assert_eq!(rule("by_date").apply("Signed by the mayor 4 times", monday()), None);
    }

    #[test]
    fn test_month_abbreviations() {
        assert_eq!(
            rule("estimated_date").apply("Estimated delivery: Sept 9", monday()),
            Some(date(2024, 9, 9))
        );
        assert_eq!(
            rule("by_date").apply("Get it by Dec. 24", monday()),
            Some(date(2024, 12, 24))
        );
        assert_eq!(
            rule("arriving_date").apply("Arriving 3 June", monday()),
            Some(date(2024, 6, 3))
        );
    }

    #[test]
    fn test_invalid_numeric_date_is_none() {
        assert_eq!(
            resolve_delivery_date("Expected delivery 31/02/2024", monday()),
            None
        );
    }

    #[test]
    fn test_no_date() {
        assert_eq!(
            resolve_delivery_date("Thanks for shopping with us", monday()),
            None
        );
    }

    #[test]
    fn test_month_day_assumes_sent_year() {
        let sent = date(2024, 12, 28);
        assert_eq!(
            resolve_delivery_date("Arriving January 3", sent),
            Some(date(2024, 1, 3))
        );
    }

    #[test]
    fn test_rule_priority_order() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            [
                "today",
                "arriving_weekday",
                "arriving_date",
                "estimated_date",
                "numeric_date",
                "by_date"
            ]
        );
    }
}

use chrono::{Duration, NaiveDate};

use super::EmailCampaign;

pub const DEFAULT_WINDOW_DAYS: u32 = 14;
pub const MAX_WINDOW_DAYS: u32 = 366;

const SEND_DATE_FORMAT: &str = "%Y-%m-%d";

/// Keeps the campaigns sending within `days` of `from` (both ends
/// inclusive), earliest first. Campaigns sharing a date are ordered by
/// descending priority score, falling back to the type's score when a
/// campaign has none.
pub fn arrange(campaigns: Vec<EmailCampaign>, from: NaiveDate, days: u32) -> Vec<EmailCampaign> {
    let until = from + Duration::days(i64::from(days.min(MAX_WINDOW_DAYS)));

    let mut scheduled: Vec<(NaiveDate, EmailCampaign)> = campaigns
        .into_iter()
        .filter_map(|campaign| {
            NaiveDate::parse_from_str(&campaign.send_date, SEND_DATE_FORMAT)
                .ok()
                .map(|date| (date, campaign))
        })
        .filter(|(date, _)| *date >= from && *date <= until)
        .collect();

    scheduled.sort_by(|(date_a, a), (date_b, b)| {
        date_a
            .cmp(date_b)
            .then_with(|| b.effective_priority().total_cmp(&a.effective_priority()))
    });

    scheduled.into_iter().map(|(_, campaign)| campaign).collect()
}

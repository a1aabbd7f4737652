use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::AvailabilityRow;

/// Daily slot template, 10:00 to 19:00 in 45-minute steps. The booking flow
/// and the admin availability editor both read this constant; a closed hour
/// an admin picks is always a value a customer could have been offered.
pub const SLOT_TEMPLATE: [&str; 13] = [
    "10:00", "10:45", "11:30", "12:15", "13:00", "13:45", "14:30", "15:15", "16:00", "16:45",
    "17:30", "18:15", "19:00",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Zero-padded local calendar date key, the only form dates are stored in.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

fn slot_time(slot: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(slot, "%H:%M").ok()
}

/// Bookable slots for one barber on one date.
///
/// Starts from the full template, empties out entirely when the barber has
/// the day off, drops the record's closed hours, and on the current day also
/// drops times that have already passed `now` (local wall clock). Dates in
/// the past yield nothing; future dates are never filtered by time.
pub fn available_slots(
    date: &str,
    barber: &str,
    records: &[AvailabilityRow],
    now: NaiveDateTime,
) -> Vec<String> {
    let Some(day) = parse_date(date) else {
        return Vec::new();
    };
    if day < now.date() {
        return Vec::new();
    }

    let record = records
        .iter()
        .find(|row| row.barber == barber && row.date == date);
    if record.map(|row| row.is_off).unwrap_or(false) {
        return Vec::new();
    }

    let closed: HashSet<String> = record
        .map(|row| row.closed_slots().into_iter().collect())
        .unwrap_or_default();
    let today = day == now.date();

    SLOT_TEMPLATE
        .iter()
        .filter(|slot| !closed.contains(**slot))
        .filter(|slot| {
            if !today {
                return true;
            }
            slot_time(slot).map(|time| time > now.time()).unwrap_or(false)
        })
        .map(|slot| slot.to_string())
        .collect()
}

/// Slots offered before a barber is chosen: a slot stays bookable as long
/// as at least one of the given barbers could take it. With no barbers on
/// the books, the date is checked against an empty record set instead.
pub fn union_slots(
    date: &str,
    barber_names: &[String],
    records: &[AvailabilityRow],
    now: NaiveDateTime,
) -> Vec<String> {
    if barber_names.is_empty() {
        return available_slots(date, "", records, now);
    }

    let per_barber: Vec<HashSet<String>> = barber_names
        .iter()
        .map(|name| available_slots(date, name, records, now).into_iter().collect())
        .collect();

    SLOT_TEMPLATE
        .iter()
        .filter(|slot| per_barber.iter().any(|set| set.contains(**slot)))
        .map(|slot| slot.to_string())
        .collect()
}

/// Barbers that cannot be selected at all for the given date.
pub fn off_barbers(date: &str, records: &[AvailabilityRow]) -> HashSet<String> {
    records
        .iter()
        .filter(|row| row.date == date && row.is_off)
        .map(|row| row.barber.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(barber: &str, date: &str, is_off: bool, closed: &[&str]) -> AvailabilityRow {
        AvailabilityRow {
            barber: barber.to_string(),
            date: date.to_string(),
            is_off,
            closed_hours: serde_json::to_string(closed).unwrap(),
        }
    }

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    #[test]
    fn no_record_means_full_template() {
        let slots = available_slots("2025-06-10", "Ahmet", &[], at("2025-06-01", "12:00"));
        assert_eq!(slots, SLOT_TEMPLATE.map(String::from).to_vec());
    }

    #[test]
    fn day_off_yields_no_slots() {
        let records = vec![record("Ahmet", "2025-06-10", true, &[])];
        let slots = available_slots("2025-06-10", "Ahmet", &records, at("2025-06-01", "12:00"));
        assert!(slots.is_empty());
    }

    #[test]
    fn closed_hours_are_removed() {
        let records = vec![record("Ahmet", "2025-06-10", false, &["10:00", "14:30"])];
        let slots = available_slots("2025-06-10", "Ahmet", &records, at("2025-06-01", "12:00"));
        assert!(!slots.contains(&"10:00".to_string()));
        assert!(!slots.contains(&"14:30".to_string()));
        assert_eq!(slots.len(), SLOT_TEMPLATE.len() - 2);
    }

    #[test]
    fn records_for_other_barbers_do_not_apply() {
        let records = vec![record("Emre", "2025-06-10", true, &[])];
        let slots = available_slots("2025-06-10", "Ahmet", &records, at("2025-06-01", "12:00"));
        assert_eq!(slots.len(), SLOT_TEMPLATE.len());
    }

    #[test]
    fn today_drops_past_times() {
        let slots = available_slots("2025-06-10", "Ahmet", &[], at("2025-06-10", "13:00"));
        assert_eq!(
            slots,
            vec!["13:45", "14:30", "15:15", "16:00", "16:45", "17:30", "18:15", "19:00"]
        );
    }

    #[test]
    fn past_dates_have_nothing_available() {
        let slots = available_slots("2025-06-09", "Ahmet", &[], at("2025-06-10", "08:00"));
        assert!(slots.is_empty());
    }

    #[test]
    fn future_dates_ignore_the_clock() {
        let slots = available_slots("2025-06-11", "Ahmet", &[], at("2025-06-10", "23:00"));
        assert_eq!(slots.len(), SLOT_TEMPLATE.len());
    }

    #[test]
    fn unparseable_dates_are_not_bookable() {
        let slots = available_slots("10.06.2025", "Ahmet", &[], at("2025-06-01", "12:00"));
        assert!(slots.is_empty());
    }

    #[test]
    fn off_barbers_collects_only_matching_date() {
        let records = vec![
            record("Ahmet", "2025-06-10", true, &[]),
            record("Emre", "2025-06-11", true, &[]),
            record("Luca", "2025-06-10", false, &["10:00"]),
        ];
        let off = off_barbers("2025-06-10", &records);
        assert!(off.contains("Ahmet"));
        assert!(!off.contains("Emre"));
        assert!(!off.contains("Luca"));
    }

    #[test]
    fn date_key_zero_pads() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        assert_eq!(date_key(day), "2025-06-03");
    }
}

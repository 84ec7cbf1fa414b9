use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A timezone the user can switch to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeZoneOption {
    /// Signed UTC offset in hours, possibly fractional (e.g. `5.75`)
    pub offset_hours: f64,
    /// IANA zone id, e.g. `Asia/Kolkata`
    pub zone_id: String,
    /// Name shown to the user and in the "select this result" hint
    pub city_name: String,
    /// Text typed into the zone picker's search field
    pub search_query: String,
}

struct ZoneTemplate {
    zone_id: &'static str,
    city_name: &'static str,
    search_query: Option<&'static str>,
}

const fn template(zone_id: &'static str, city_name: &'static str) -> ZoneTemplate {
    ZoneTemplate {
        zone_id,
        city_name,
        search_query: None,
    }
}

const fn template_with_query(
    zone_id: &'static str,
    city_name: &'static str,
    search_query: &'static str,
) -> ZoneTemplate {
    ZoneTemplate {
        zone_id,
        city_name,
        search_query: Some(search_query),
    }
}

// City names are the ones the stock Russian-locale zone picker lists.
// Offsets come from the tz rules at the time the list is built.
const TEMPLATES: &[ZoneTemplate] = &[
    template("Pacific/Niue", "Ниуэ"),
    template("Pacific/Rarotonga", "Американское Самоа"),
    template("Pacific/Gambier", "Французская Полинезия"),
    template("Pacific/Pitcairn", "Питкэрн"),
    template("America/Guatemala", "Гватемала"),
    template("America/Bogota", "Колумбия"),
    template("America/La_Paz", "Боливия"),
    template("America/Buenos_Aires", "Аргентина"),
    template("Atlantic/South_Georgia", "Южная Георгия"),
    template("Atlantic/Cape_Verde", "Кабо-Верде"),
    template("Africa/Abidjan", "Кот-д'Ивуар"),
    template("Africa/Algiers", "Алжир"),
    template("Africa/Johannesburg", "ЮАР"),
    template("Africa/Nairobi", "Кения"),
    template("Asia/Dubai", "ОАЭ"),
    template("Asia/Tashkent", "Узбекистан"),
    template("Asia/Tehran", "Иран"),
    template("Asia/Kabul", "Афганистан"),
    template("Asia/Kolkata", "Индия"),
    template("Asia/Kathmandu", "Непал"),
    template("Asia/Yangon", "Мьянма"),
    template("Asia/Dhaka", "Бангладеш"),
    template("Asia/Bangkok", "Таиланд"),
    template("Asia/Singapore", "Сингапур"),
    template("Asia/Tokyo", "Япония"),
    template_with_query("Australia/Adelaide", "Аделаида", "Австралия"),
    template_with_query("Australia/Darwin", "Дарвин", "Австралия"),
    template_with_query("Australia/Lord_Howe", "Лорд-Хау", "Австралия"),
    template("Pacific/Port_Moresby", "Новая Гвинея"),
    template("Pacific/Guadalcanal", "Соломоновы"),
    template("Pacific/Fiji", "Фиджи"),
    template_with_query("Pacific/Chatham", "Чатем", "Новая Зеландия"),
    template("Pacific/Apia", "Самоа"),
    template("Pacific/Kiritimati", "Кирибати"),
];

impl TimeZoneOption {
    pub fn new(offset_hours: f64, zone_id: &str, city_name: &str, search_query: &str) -> Self {
        Self {
            offset_hours,
            zone_id: zone_id.to_string(),
            city_name: city_name.to_string(),
            search_query: search_query.to_string(),
        }
    }

    /// All built-in options with their current offsets, sorted by offset
    pub fn default_list() -> Vec<TimeZoneOption> {
        Self::default_list_at(Utc::now())
    }

    /// All built-in options with the offsets in effect at `instant`.
    ///
    /// Sorted by offset, stable for equal offsets, so the order shifts as
    /// zones enter and leave daylight saving time.
    pub fn default_list_at(instant: DateTime<Utc>) -> Vec<TimeZoneOption> {
        let mut options: Vec<_> = TEMPLATES
            .iter()
            .filter_map(|t| {
                let Some(offset_hours) = offset_hours_at(t.zone_id, instant) else {
                    warn!(zone = t.zone_id, "Zone missing from the tz database, skipping");
                    return None;
                };
                Some(TimeZoneOption {
                    offset_hours,
                    zone_id: t.zone_id.to_string(),
                    city_name: t.city_name.to_string(),
                    search_query: t.search_query.unwrap_or(t.city_name).to_string(),
                })
            })
            .collect();
        options.sort_by(|a, b| a.offset_hours.total_cmp(&b.offset_hours));
        options
    }

    pub fn find(zone_id: &str) -> Option<TimeZoneOption> {
        Self::find_at(zone_id, Utc::now())
    }

    pub fn find_at(zone_id: &str, instant: DateTime<Utc>) -> Option<TimeZoneOption> {
        Self::default_list_at(instant)
            .into_iter()
            .find(|option| option.zone_id.eq_ignore_ascii_case(zone_id))
    }

    pub fn offset_label(&self) -> String {
        format_offset(self.offset_hours)
    }
}

/// Format an hour offset as `±HH:MM`, with `+` for zero.
///
/// Minutes are rounded from the fractional part: `5.75` gives `+05:45`.
pub fn format_offset(offset_hours: f64) -> String {
    let total_minutes = (offset_hours * 60.0).round() as i64;
    let sign = if total_minutes < 0 { '-' } else { '+' };
    let total_minutes = total_minutes.unsigned_abs();
    format!("{sign}{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// UTC offset in hours of an IANA zone at `instant`
fn offset_hours_at(zone_id: &str, instant: DateTime<Utc>) -> Option<f64> {
    let tz: Tz = zone_id.parse().ok()?;
    let seconds = tz
        .offset_from_utc_datetime(&instant.naive_utc())
        .fix()
        .local_minus_utc();
    Some(f64::from(seconds) / 3600.0)
}

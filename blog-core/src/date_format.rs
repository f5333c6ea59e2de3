use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    pub fn abbreviated_months(self) -> &'static [&'static str; 12] {
        match self {
            Locale::PtBr => &[
                "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
            ],
            Locale::EnUs => &[
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
            ],
        }
    }

    pub fn unknown_date(self) -> &'static str {
        match self {
            Locale::PtBr => "data desconhecida",
            Locale::EnUs => "unknown date",
        }
    }

    pub fn html_lang(self) -> &'static str {
        match self {
            Locale::PtBr => "pt-BR",
            Locale::EnUs => "en-US",
        }
    }
}

/// `dd mmm yyyy` with the locale's abbreviated month, e.g. `15 mar 2021`.
pub fn format_date(ts: &DateTime<Utc>, locale: Locale) -> String {
    let month = locale.abbreviated_months()[ts.month0() as usize];
    format!("{} {} {}", ts.format("%d"), month, ts.format("%Y"))
}

/// Null-guarded variant used by the renderers.
pub fn display_date(ts: Option<&DateTime<Utc>>, locale: Locale) -> String {
    match ts {
        Some(ts) => format_date(ts, locale),
        None => locale.unknown_date().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_brazilian_portuguese() {
        let ts = Utc.with_ymd_and_hms(2021, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(format_date(&ts, Locale::PtBr), "15 mar 2021");
    }

    #[test]
    fn pads_single_digit_days() {
        let ts = Utc.with_ymd_and_hms(2020, 2, 5, 23, 59, 0).unwrap();
        assert_eq!(format_date(&ts, Locale::PtBr), "05 fev 2020");
        assert_eq!(format_date(&ts, Locale::EnUs), "05 Feb 2020");
    }

    #[test]
    fn missing_date_is_labelled() {
        assert_eq!(display_date(None, Locale::PtBr), "data desconhecida");
    }
}

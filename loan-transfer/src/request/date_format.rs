use chrono::NaiveDate;

pub(super) const DEFAULT_DATE_FORMAT: &str = "yyyy-MM-dd";
pub(super) const DEFAULT_LOCALE: &str = "en";

/// Translates a `yyyy-MM-dd` style pattern into a chrono format string.
/// Returns `None` for patterns containing unsupported letters.
pub(super) fn to_chrono_format(pattern: &str) -> Option<String> {
    let mut res = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let token = match (c, run) {
            ('y', 4) => "%Y",
            ('y', 2) => "%y",
            ('M', 4) => "%B",
            ('M', 3) => "%b",
            ('M', 1..=2) => "%m",
            ('d', 1..=2) => "%d",
            ('%', _) => "%%",
            (c, _) if c.is_ascii_alphabetic() => return None,
            _ => {
                res.extend(std::iter::repeat(c).take(run));
                i += run;
                continue;
            }
        };
        let repeats = if c == '%' { run } else { 1 };
        for _ in 0..repeats {
            res.push_str(token);
        }
        i += run;
    }
    Some(res)
}

pub(super) fn is_supported_locale(locale: &str) -> bool {
    let language = locale.split(['_', '-']).next().unwrap_or_default();
    language.eq_ignore_ascii_case("en")
}

pub(super) fn parse_date(value: &str, chrono_format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), chrono_format).ok()
}

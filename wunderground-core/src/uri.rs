//! Request URI construction.
//!
//! A request URI has the shape
//! `<base>/<api key>/<feature>[/<feature>...]/<key:value>[/<key:value>...]/<tail>.<format>`.
//! It is a pure function of its inputs, which is what lets the client use it
//! as the cache key. Empty feature lists and empty settings contribute no
//! segment at all.

use chrono::NaiveDate;
use std::{collections::BTreeMap, fmt::Display};

use crate::ResponseFormat;

pub const DEFAULT_BASE_URL: &str = "http://api.wunderground.com/api";

/// Short `key:value` options embedded in the path, rendered in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings(BTreeMap<String, String>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a setting; the value is rendered with `Display`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Display) -> &mut Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Start from `defaults`, then apply every entry of `self` on top.
    pub fn merged_over(&self, defaults: &Settings) -> Settings {
        let mut merged = defaults.clone();
        merged.0.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// The `/`-joined `key:value` segment.
    pub fn segment(&self) -> String {
        self.0.iter().map(|(k, v)| format!("{k}:{v}")).collect::<Vec<_>>().join("/")
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = Settings::new();
        for (k, v) in iter {
            settings.insert(k, v);
        }
        settings
    }
}

/// Last path segment before the format suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tail {
    /// Location-scoped lookup, rendered as `q/<query>`.
    Query(String),
    /// Fixed segment for endpoints that take no query.
    Literal(&'static str),
}

impl Tail {
    pub const VIEW: Tail = Tail::Literal("view");

    pub fn query(query: impl Display) -> Self {
        Tail::Query(query.to_string())
    }

    fn render(&self) -> String {
        match self {
            Tail::Query(q) => format!("q/{q}"),
            Tail::Literal(lit) => (*lit).to_string(),
        }
    }
}

pub fn build_uri<S: AsRef<str>>(
    base: &str,
    api_key: &str,
    features: &[S],
    settings: &Settings,
    tail: &Tail,
    format: ResponseFormat,
) -> String {
    let mut segments: Vec<String> = vec![base.trim_end_matches('/').to_string(), api_key.to_string()];
    segments.extend(features.iter().map(|f| f.as_ref().to_string()).filter(|f| !f.is_empty()));

    if !settings.is_empty() {
        segments.push(settings.segment());
    }
    segments.push(tail.render());

    format!("{}.{}", segments.join("/"), format)
}

/// Feature name of a history lookup for one calendar day, e.g. `history_20170101`.
pub fn history_feature(date: NaiveDate) -> String {
    format!("history_{}", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang_en() -> Settings {
        Settings::new().with("lang", "EN")
    }

    #[test]
    fn builds_single_feature_query_uri() {
        let uri = build_uri(
            DEFAULT_BASE_URL,
            "key",
            &["alerts"],
            &lang_en(),
            &Tail::query(12345),
            ResponseFormat::Json,
        );
        assert_eq!(uri, "http://api.wunderground.com/api/key/alerts/lang:EN/q/12345.json");
    }

    #[test]
    fn keeps_feature_order() {
        let uri = build_uri(
            DEFAULT_BASE_URL,
            "key",
            &["forecast", "alerts"],
            &lang_en(),
            &Tail::query("CA/San_Francisco"),
            ResponseFormat::Xml,
        );
        assert_eq!(
            uri,
            "http://api.wunderground.com/api/key/forecast/alerts/lang:EN/q/CA/San_Francisco.xml"
        );
    }

    #[test]
    fn literal_tail_has_no_query_prefix() {
        let uri = build_uri(
            DEFAULT_BASE_URL,
            "key",
            &["currenthurricane"],
            &lang_en(),
            &Tail::VIEW,
            ResponseFormat::Json,
        );
        assert_eq!(uri, "http://api.wunderground.com/api/key/currenthurricane/lang:EN/view.json");
    }

    #[test]
    fn settings_render_sorted_regardless_of_insertion_order() {
        let a = Settings::new().with("bestfct", 1).with("lang", "EN");
        let b = Settings::new().with("lang", "EN").with("bestfct", 1);
        assert_eq!(a.segment(), "bestfct:1/lang:EN");
        assert_eq!(a.segment(), b.segment());

        let tail = Tail::query(12345);
        assert_eq!(
            build_uri("http://x", "k", &["forecast"], &a, &tail, ResponseFormat::Json),
            build_uri("http://x", "k", &["forecast"], &b, &tail, ResponseFormat::Json),
        );
    }

    #[test]
    fn caller_settings_override_defaults() {
        let defaults = lang_en();
        let merged = Settings::new().with("lang", "FR").with("pws", 0).merged_over(&defaults);
        assert_eq!(merged.segment(), "lang:FR/pws:0");
        assert_eq!(defaults.get("lang"), Some("EN"));
    }

    #[test]
    fn defaults_survive_unrelated_overrides() {
        let merged = Settings::new().with("pws", 1).merged_over(&lang_en());
        assert_eq!(merged.get("lang"), Some("EN"));
        assert_eq!(merged.get("pws"), Some("1"));
    }

    #[test]
    fn empty_features_and_settings_are_omitted() {
        let features: [&str; 0] = [];
        let uri = build_uri(
            "http://x/api/",
            "key",
            &features,
            &Settings::new(),
            &Tail::query("q1"),
            ResponseFormat::Json,
        );
        assert_eq!(uri, "http://x/api/key/q/q1.json");
    }

    #[test]
    fn settings_from_iterator() {
        let settings: Settings = [("pws", 1), ("bestfct", 0)].into_iter().collect();
        assert_eq!(settings.segment(), "bestfct:0/pws:1");
    }

    #[test]
    fn history_feature_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        assert_eq!(history_feature(date), "history_20170101");

        let early = NaiveDate::from_ymd_opt(987, 3, 9).unwrap();
        assert_eq!(history_feature(early), "history_09870309");
    }
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Wire format of hit and query timestamps.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One recorded visit of a public endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EndpointHit {
    pub app: String,
    pub uri: String,
    pub ip: String,
    /// Defaults to the time of arrival when absent.
    #[serde(default, alias = "timeStamp", with = "datetime::option")]
    #[schema(value_type = Option<String>, example = "2030-01-01 12:00:00")]
    pub timestamp: Option<NaiveDateTime>,
}

impl EndpointHit {
    pub fn new(app: impl Into<String>, uri: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            uri: uri.into(),
            ip: ip.into(),
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Hit count of one (app, uri) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ViewStats {
    pub app: String,
    pub uri: String,
    pub hits: i64,
}

/// Parameters of a `GET /stats` call.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsQuery {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub uris: Vec<String>,
    pub unique: bool,
}

impl StatsQuery {
    /// Query string pairs; `uris` is sent comma separated and omitted when empty.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("start", self.start.format(DATE_TIME_FORMAT).to_string()),
            ("end", self.end.format(DATE_TIME_FORMAT).to_string()),
        ];
        if !self.uris.is_empty() {
            params.push(("uris", self.uris.join(",")));
        }
        params.push(("unique", self.unique.to_string()));
        params
    }
}

/// Serde adapter for `NaiveDateTime` in `DATE_TIME_FORMAT`.
pub mod datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::DATE_TIME_FORMAT;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(DATE_TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT).map_err(de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer, de};

        use super::DATE_TIME_FORMAT;

        pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => serializer.serialize_str(&value.format(DATE_TIME_FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.trim().is_empty() => {
                    NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT)
                        .map(Some)
                        .map_err(de::Error::custom)
                }
                _ => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT).unwrap()
    }

    #[test]
    fn test_hit_accepts_legacy_timestamp_key() {
        let hit: EndpointHit = serde_json::from_str(
            r#"{"app":"ewm-main","uri":"/events/1","ip":"10.0.0.1","timeStamp":"2030-01-01 12:00:00"}"#,
        )
        .unwrap();
        assert_eq!(hit.timestamp, Some(at("2030-01-01 12:00:00")));
    }

    #[test]
    fn test_hit_serializes_timestamp_in_wire_format() {
        let hit = EndpointHit::new("ewm-main", "/events", "127.0.0.1").at(at("2030-01-01 08:05:00"));
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["timestamp"], "2030-01-01 08:05:00");
    }

    #[test]
    fn test_query_params() {
        let query = StatsQuery {
            start: at("2020-01-01 00:00:00"),
            end: at("2030-01-01 00:00:00"),
            uris: vec!["/events/1".to_string(), "/events/2".to_string()],
            unique: true,
        };
        let params = query.to_params();
        assert_eq!(params[0], ("start", "2020-01-01 00:00:00".to_string()));
        assert_eq!(params[2], ("uris", "/events/1,/events/2".to_string()));
        assert_eq!(params[3], ("unique", "true".to_string()));

        let query = StatsQuery {
            uris: Vec::new(),
            ..query
        };
        assert!(!query.to_params().iter().any(|(k, _)| *k == "uris"));
    }
}

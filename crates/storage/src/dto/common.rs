use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};
use utoipa::{IntoParams, ToSchema};
use validator::ValidationError;

/// Wire format for every timestamp exchanged by the API.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `from` is the index of the first element, `size` the page length.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default)]
    pub from: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    10
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            from: 0,
            size: default_size(),
        }
    }
}

impl PaginationParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.size < 1 || self.size > 1000 {
            return Err("size must be between 1 and 1000".to_string());
        }
        Ok(())
    }

    /// Offset of the page containing `from`.
    pub fn offset(&self) -> i64 {
        i64::from(self.from / self.size.max(1)) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
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
        parse(&raw).map_err(de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveDateTime, String> {
        NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT)
            .map_err(|_| format!("Wrong date format: '{}', expected yyyy-MM-dd HH:mm:ss", raw))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer, de};

        pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.filter(|s| !s.trim().is_empty())
                .map(|s| super::parse(&s).map_err(de::Error::custom))
                .transpose()
        }
    }
}

/// Reject strings made only of whitespace
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Deserialize a comma separated query value (`ids=1,2,3`) into a list.
pub fn comma_separated<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;

    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<T>().map_err(de::Error::custom))
            .collect::<Result<Vec<T>, _>>()
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Ids {
        #[serde(default, deserialize_with = "comma_separated")]
        ids: Option<Vec<i64>>,
    }

    #[derive(Deserialize)]
    struct Stamp {
        #[serde(with = "datetime")]
        at: chrono::NaiveDateTime,
    }

    #[test]
    fn test_offset_rounds_down_to_page() {
        let page = PaginationParams { from: 25, size: 10 };
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let page = PaginationParams { from: 0, size: 0 };
        assert!(page.validate().is_err());
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_comma_separated_ids() {
        let ids: Ids = serde_json::from_str(r#"{"ids": "1, 2,3"}"#).unwrap();
        assert_eq!(ids.ids, Some(vec![1, 2, 3]));

        let missing: Ids = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.ids, None);

        assert!(serde_json::from_str::<Ids>(r#"{"ids": "1,x"}"#).is_err());
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Concerts").is_ok());
        assert!(not_blank(" x ").is_ok());

        let err = not_blank(" \t\n").unwrap_err();
        assert_eq!(err.code, "blank");
    }

    #[test]
    fn test_datetime_format() {
        let stamp: Stamp = serde_json::from_str(r#"{"at": "2030-05-01 18:30:00"}"#).unwrap();
        let expected = NaiveDate::from_ymd_opt(2030, 5, 1)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        assert_eq!(stamp.at, expected);

        assert!(serde_json::from_str::<Stamp>(r#"{"at": "2030-05-01T18:30:00"}"#).is_err());
    }
}

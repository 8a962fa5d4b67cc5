pub mod appointment;
pub mod doctor;
pub mod enums;
pub mod service;
pub mod user;

pub use appointment::*;
pub use doctor::*;
pub use enums::*;
pub use service::*;
pub use user::*;

/// Optional integer field that also accepts a numeric string, as sent by
/// HTML form clients. An empty string counts as absent.
pub fn deserialize_flexible_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct FlexibleInt;

    impl<'de> de::Visitor<'de> for FlexibleInt {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an integer or a string holding one")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            i64::try_from(v)
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(FlexibleInt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Form {
        #[serde(default, deserialize_with = "deserialize_flexible_int")]
        doctor_id: Option<i64>,
    }

    fn parse(json: &str) -> Result<Option<i64>, serde_json::Error> {
        serde_json::from_str::<Form>(json).map(|f| f.doctor_id)
    }

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        assert_eq!(parse(r#"{"doctorId":7}"#).unwrap(), Some(7));
        assert_eq!(parse(r#"{"doctorId":"7"}"#).unwrap(), Some(7));
        assert_eq!(parse(r#"{"doctorId":" 12 "}"#).unwrap(), Some(12));
    }

    #[test]
    fn empty_null_and_missing_are_absent() {
        assert_eq!(parse(r#"{"doctorId":""}"#).unwrap(), None);
        assert_eq!(parse(r#"{"doctorId":null}"#).unwrap(), None);
        assert_eq!(parse("{}").unwrap(), None);
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        assert!(parse(r#"{"doctorId":"abc"}"#).is_err());
        assert!(parse(r#"{"doctorId":1.5}"#).is_err());
        assert!(parse(r#"{"doctorId":true}"#).is_err());
    }
}

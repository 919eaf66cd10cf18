/// Serde adapter for durations written as humantime strings (`"15s"`,
/// `"30days"`). Plain integers are accepted as seconds.
pub mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(u64),
    }

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => humantime::parse_duration(text.trim())
                .map_err(|e| D::Error::custom(format!("invalid duration {text:?}: {e}"))),
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Deserialize, Serialize)]
    struct Holder {
        #[serde(with = "super::humantime_duration")]
        ttl: Duration,
    }

    #[test]
    fn parses_text_and_seconds() {
        let text: Holder = serde_json::from_str(r#"{"ttl":"1h 30m"}"#).unwrap();
        assert_eq!(text.ttl, Duration::from_secs(90 * 60));

        let secs: Holder = serde_json::from_str(r#"{"ttl":45}"#).unwrap();
        assert_eq!(secs.ttl, Duration::from_secs(45));

        assert!(serde_json::from_str::<Holder>(r#"{"ttl":"soon"}"#).is_err());
    }

    #[test]
    fn serializes_as_humantime() {
        let json = serde_json::to_string(&Holder {
            ttl: Duration::from_secs(15),
        })
        .unwrap();
        assert_eq!(json, r#"{"ttl":"15s"}"#);
    }
}

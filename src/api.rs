pub mod client;
pub mod error;
pub mod session;
pub mod status;

// deserialize a counter leniently, anything that is not a non-negative number becomes 0
mod lenient_count {
    use serde::de::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(count_from_value).unwrap_or(0))
    }

    fn count_from_value(value: &Value) -> Option<u32> {
        match value {
            Value::Number(number) => {
                if let Some(int) = number.as_u64() {
                    Some(u32::try_from(int).unwrap_or(u32::MAX))
                } else {
                    number
                        .as_f64()
                        .filter(|float| float.is_finite() && *float >= 0.0)
                        .map(|float| float.min(u32::MAX as f64) as u32)
                }
            }
            Value::String(string) => string.trim().parse::<u32>().ok(),
            _ => None,
        }
    }
}

// deserialize a flag leniently, `true` or the string "true" is set, anything else becomes false
mod lenient_flag {
    use serde::de::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Bool(flag)) => flag,
            Some(Value::String(string)) => string.trim().eq_ignore_ascii_case("true"),
            _ => false,
        })
    }
}

use anyhow::anyhow;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::{fmt::Display, str::FromStr};

/// Display preferences. Always persisted as one record.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "lenient_size")]
    pub city_size: f64,
    #[serde(deserialize_with = "lenient_size")]
    pub country_size: f64,
    #[serde(deserialize_with = "lenient_size")]
    pub time_size: f64,
    #[serde(deserialize_with = "lenient_size")]
    pub date_size: f64,
    pub date_format: DateFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            city_size: 1.8,
            country_size: 0.9,
            time_size: 2.8,
            date_size: 1.1,
            date_format: DateFormat::default(),
        }
    }
}

/// Which of the four size knobs to change
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SizeField {
    City,
    Country,
    Time,
    Date,
}

impl Settings {
    /// Get a copy with one size replaced
    pub fn with_size(self, field: SizeField, size: f64) -> Self {
        let mut settings = self;
        match field {
            SizeField::City => settings.city_size = size,
            SizeField::Country => settings.country_size = size,
            SizeField::Time => settings.time_size = size,
            SizeField::Date => settings.date_size = size,
        }
        settings
    }

    pub fn with_date_format(self, date_format: DateFormat) -> Self {
        Self {
            date_format,
            ..self
        }
    }
}

impl FromStr for SizeField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "city" => Ok(Self::City),
            "country" => Ok(Self::Country),
            "time" => Ok(Self::Time),
            "date" => Ok(Self::Date),
            _ => Err(anyhow!(
                "Unknown size `{s}`, expected city, country, time or date"
            )),
        }
    }
}

/// How the date line on each card is rendered
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `Tuesday, March 5`
    Full,
    /// `03/05/2024`
    Us,
    /// `2024-03-05`
    Intl,
    /// `Mar 5`
    Short,
    /// `Tuesday`
    Day,
    /// `Tue, Mar 5`. Anything unrecognized in persisted settings lands here,
    /// and serde requires that to be the last variant
    #[default]
    #[serde(other)]
    Std,
}

impl DateFormat {
    pub const ALL: &'static [Self] = &[
        Self::Std,
        Self::Full,
        Self::Us,
        Self::Intl,
        Self::Short,
        Self::Day,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Std => "std",
            Self::Full => "full",
            Self::Us => "us",
            Self::Intl => "intl",
            Self::Short => "short",
            Self::Day => "day",
        }
    }
}

impl FromStr for DateFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.name() == s)
            .ok_or_else(|| anyhow!("Unknown date format `{s}`"))
    }
}

impl Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Sizes have been written as both numbers and numeric strings, accept either
fn lenient_size<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(f64),
        Text(String),
    }

    let size = match Size::deserialize(deserializer)? {
        Size::Number(size) => size,
        Size::Text(text) => text.trim().parse().map_err(de::Error::custom)?,
    };
    if size.is_finite() && size > 0.0 {
        Ok(size)
    } else {
        Err(de::Error::custom(format!("Invalid size {size}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_sizes() {
        let settings: Settings = serde_json::from_str(
            r#"{"city_size": "2.5", "time_size": 3, "date_format": "intl"}"#,
        )
        .unwrap();
        assert_eq!(
            settings,
            Settings {
                city_size: 2.5,
                time_size: 3.0,
                date_format: DateFormat::Intl,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_invalid_size() {
        assert!(serde_json::from_str::<Settings>(r#"{"city_size": "big"}"#)
            .is_err());
        assert!(
            serde_json::from_str::<Settings>(r#"{"date_size": -1}"#).is_err()
        );
    }

    #[test]
    fn test_unknown_date_format() {
        let settings: Settings =
            serde_json::from_str(r#"{"date_format": "klingon"}"#).unwrap();
        assert_eq!(settings.date_format, DateFormat::Std);
    }

    #[test]
    fn test_date_format_names() {
        for &format in DateFormat::ALL {
            assert_eq!(format.name().parse::<DateFormat>().unwrap(), format);
            assert_eq!(
                serde_json::to_string(&format).unwrap(),
                format!("\"{format}\"")
            );
        }
        assert!("iso".parse::<DateFormat>().is_err());
    }

    #[test]
    fn test_with_size() {
        let settings = Settings::default().with_size(SizeField::Country, 1.5);
        assert_eq!(settings.country_size, 1.5);
        assert_eq!(settings.city_size, Settings::default().city_size);
    }
}

// Copyright (C) 2017 Hove and/or its affiliates.
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, version 3.

// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.

// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>
//! Some utilities for serialize / deserialize GTFS objects.

use crate::objects::Date;
use chrono::NaiveDate;

/// deserialize u8 as bool
/// returns an error if non boolean value
pub fn de_from_u8<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::{
        de::{Error, Unexpected::Other},
        Deserialize,
    };
    let i = <u8 as Deserialize<'de>>::deserialize(deserializer)?;
    if i == 0 || i == 1 {
        Ok(i != 0)
    } else {
        Err(D::Error::invalid_value(
            Other(&format!("{} non boolean value", i)),
            &"boolean",
        ))
    }
}

/// serialize bool as u8
// The signature of the function must pass by reference for 'serde' to be able to use the function
pub fn ser_from_bool<S>(v: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u8(*v as u8)
}

/// deserialize date from String in the `YYYYMMDD` GTFS format
pub fn de_from_date_string<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let s = String::deserialize(deserializer)?;

    NaiveDate::parse_from_str(&s, "%Y%m%d").map_err(serde::de::Error::custom)
}

/// serialize naive date to String in the `YYYYMMDD` GTFS format
// The signature of the function must pass by reference for 'serde' to be able to use the function
pub fn ser_from_naive_date<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let s = format!("{}", date.format("%Y%m%d"));
    serializer.serialize_str(&s)
}

/// deserialize date from String in the `M/D/YYYY` format used by the
/// calendar-exception rules files
pub fn de_from_rule_date_string<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let s = String::deserialize(deserializer)?;

    NaiveDate::parse_from_str(&s, "%m/%d/%Y").map_err(serde::de::Error::custom)
}

/// deserialize type T or returns its default value
pub fn de_with_empty_default<'de, T: Default, D>(de: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    use serde::Deserialize;
    Option::<T>::deserialize(de).map(|opt| opt.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct DateWrapper {
        #[serde(
            deserialize_with = "de_from_date_string",
            serialize_with = "ser_from_naive_date"
        )]
        date: Date,
    }

    #[test]
    fn serde_gtfs_date() {
        let json = r#"{"date":"20240215"}"#;
        let wrapper: DateWrapper = serde_json::from_str(json).unwrap();
        assert_eq!(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(), wrapper.date);
        assert_eq!(json, serde_json::to_string(&wrapper).unwrap());
    }

    #[test]
    fn de_invalid_gtfs_date() {
        let result: Result<DateWrapper, _> = serde_json::from_str(r#"{"date":"2024-02-15"}"#);
        assert!(result.is_err());
    }

    #[derive(Debug, Deserialize)]
    struct RuleDateWrapper {
        #[serde(deserialize_with = "de_from_rule_date_string")]
        date: Date,
    }

    #[test]
    fn de_rule_date() {
        let wrapper: RuleDateWrapper = serde_json::from_str(r#"{"date":"7/4/2024"}"#).unwrap();
        assert_eq!(NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(), wrapper.date);
    }

    #[derive(Debug, Deserialize)]
    struct BoolWrapper {
        #[serde(deserialize_with = "de_from_u8")]
        value: bool,
    }

    #[test]
    fn de_u8_as_bool() {
        let wrapper: BoolWrapper = serde_json::from_str(r#"{"value":1}"#).unwrap();
        assert!(wrapper.value);
        let wrapper: BoolWrapper = serde_json::from_str(r#"{"value":0}"#).unwrap();
        assert!(!wrapper.value);
        let result: Result<BoolWrapper, _> = serde_json::from_str(r#"{"value":2}"#);
        assert!(result.is_err());
    }
}

//! Preference and hotel payloads sent with each question.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A primitive attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Free text
    Text(String),
    /// Any number (prices, ratings, match scores)
    Number(f64),
    /// List of labels (amenities, tags)
    List(Vec<String>),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::List(value)
    }
}

impl From<&[&str]> for AttributeValue {
    fn from(value: &[&str]) -> Self {
        AttributeValue::List(value.iter().map(|s| s.to_string()).collect())
    }
}

macro_rules! attribute_map {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub BTreeMap<String, AttributeValue>);

        impl $name {
            /// Empty map
            pub fn new() -> Self {
                Self::default()
            }

            /// Set an attribute, builder style
            pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
                self.0.insert(key.into(), value.into());
                self
            }

            /// Look up an attribute
            pub fn get(&self, key: &str) -> Option<&AttributeValue> {
                self.0.get(key)
            }
        }
    };
}

attribute_map!(
    /// Traveller preferences (`travel_reason`, `room_type`, ...)
    Preferences
);

attribute_map!(
    /// One hotel the assistant may talk about
    HotelRecord
);

impl Preferences {
    /// Preferences the chat page sends when the user has not set any
    pub fn leisure_defaults() -> Self {
        Self::new()
            .with("travel_reason", "leisure")
            .with(
                "preferred_amenities",
                vec!["Free WiFi".to_string(), "Pool".to_string()],
            )
            .with("room_type", "Suite")
    }
}

impl HotelRecord {
    /// Hotels the chat page sends as context with every question
    pub fn catalog() -> Vec<Self> {
        vec![
            hotel("1", "Grand Luxe Palace", "Downtown Paris", "Paris", "France")
                .with("rating", 4.8)
                .with("price", 350.0)
                .with("aiScore", 95.0)
                .with("amenities", &["Free WiFi", "Pool", "Spa", "Restaurant", "Gym", "Room Service", "Parking", "Bar"][..]),
            hotel("2", "Oceanfront Resort & Spa", "Beachfront", "Maldives", "Maldives")
                .with("rating", 4.9)
                .with("price", 450.0)
                .with("aiScore", 92.0)
                .with("amenities", &["Private Beach", "Infinity Pool", "Spa", "Water Sports", "Restaurant", "Bar", "Diving Center"][..]),
            hotel("3", "Tokyo Skyline Hotel", "Shibuya District", "Tokyo", "Japan")
                .with("rating", 4.7)
                .with("price", 280.0)
                .with("aiScore", 88.0)
                .with("amenities", &["Free WiFi", "Restaurant", "Bar", "Gym", "Business Center", "Rooftop Terrace"][..]),
            hotel("4", "Manhattan Heights", "Midtown Manhattan", "New York", "USA")
                .with("rating", 4.6)
                .with("price", 320.0)
                .with("aiScore", 90.0)
                .with("amenities", &["Free WiFi", "Gym", "Restaurant", "Bar", "Concierge", "Valet Parking"][..]),
            hotel("5", "Dubai Marina Towers", "Dubai Marina", "Dubai", "UAE")
                .with("rating", 4.8)
                .with("price", 400.0)
                .with("aiScore", 87.0)
                .with("amenities", &["Infinity Pool", "Spa", "Multiple Restaurants", "Beach Club", "Gym", "Kids Club"][..]),
            hotel("6", "Alpine Retreat", "Swiss Alps", "Zermatt", "Switzerland")
                .with("rating", 4.9)
                .with("price", 480.0)
                .with("aiScore", 91.0)
                .with("amenities", &["Ski-in/Ski-out", "Spa", "Restaurant", "Bar", "Ski Storage", "Heated Pool"][..]),
        ]
    }
}

fn hotel(id: &str, name: &str, location: &str, city: &str, country: &str) -> HotelRecord {
    HotelRecord::new()
        .with("id", id)
        .with("name", name)
        .with("location", location)
        .with("city", city)
        .with("country", country)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_serialization() {
        let prefs = Preferences::leisure_defaults();
        let json = serde_json::to_value(&prefs).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "preferred_amenities": ["Free WiFi", "Pool"],
                "room_type": "Suite",
                "travel_reason": "leisure"
            })
        );
    }

    #[test]
    fn test_hotel_record_parse() {
        let hotel: HotelRecord = serde_json::from_str(
            r#"{"name":"Grand Luxe Palace","price":350,"amenities":["Spa","Pool"]}"#,
        )
        .unwrap();

        assert_eq!(hotel.get("price"), Some(&AttributeValue::Number(350.0)));
        assert_eq!(
            hotel.get("name"),
            Some(&AttributeValue::Text("Grand Luxe Palace".into()))
        );
    }

    #[test]
    fn test_catalog_covers_canned_hotels() {
        let catalog = HotelRecord::catalog();
        let names: Vec<&AttributeValue> = catalog.iter().filter_map(|h| h.get("name")).collect();

        assert_eq!(names.len(), 6);
        for name in ["Grand Luxe Palace", "Tokyo Skyline Hotel", "Dubai Marina Towers"] {
            assert!(names.contains(&&AttributeValue::Text(name.into())));
        }
        assert_eq!(catalog[0].get("price"), Some(&AttributeValue::Number(350.0)));
    }
}

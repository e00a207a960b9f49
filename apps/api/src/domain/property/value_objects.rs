use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a listing is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    Sale,
    Rent,
    Event,
}

/// Kind of real estate being listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    House,
    Commercial,
    EventHall,
}

/// Availability of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Available,
    Sold,
    Rented,
    Unavailable,
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($ty::$variant => write!(f, $text)),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(format!("Unknown {}: {}", stringify!($ty), s)),
                }
            }
        }
    };
}

text_enum!(PriceType { Sale => "sale", Rent => "rent", Event => "event" });
text_enum!(PropertyType {
    Apartment => "apartment",
    House => "house",
    Commercial => "commercial",
    EventHall => "event_hall",
});
text_enum!(PropertyStatus {
    Available => "available",
    Sold => "sold",
    Rented => "rented",
    Unavailable => "unavailable",
});

/// True for absolute http(s) URLs with a host
pub fn is_web_url(candidate: &str) -> bool {
    match reqwest::Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_type_text_matches_serde() {
        assert_eq!(PropertyType::EventHall.to_string(), "event_hall");
        assert_eq!(
            serde_json::to_string(&PropertyType::EventHall).unwrap(),
            "\"event_hall\""
        );
        assert_eq!("event_hall".parse::<PropertyType>().unwrap(), PropertyType::EventHall);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("gone".parse::<PropertyStatus>().is_err());
    }

    #[test]
    fn web_urls() {
        assert!(is_web_url("https://cdn.example.com/a.jpg"));
        assert!(is_web_url("http://localhost:8080/img.png"));
        assert!(!is_web_url("ftp://example.com/a.jpg"));
        assert!(!is_web_url("not a url"));
        assert!(!is_web_url("/relative/path.jpg"));
    }
}

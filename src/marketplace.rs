//! Marketplaces the storefront aggregates from
//!
//! Tags only; there is no integration with the marketplaces themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported marketplaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Marketplace {
    #[default]
    #[serde(rename = "ozon")]
    Ozon,
    #[serde(rename = "wb")]
    Wildberries,
    #[serde(rename = "yandex")]
    Yandex,
}

impl Marketplace {
    pub const ALL: [Marketplace; 3] = [
        Marketplace::Ozon,
        Marketplace::Wildberries,
        Marketplace::Yandex,
    ];

    /// Storage tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Marketplace::Ozon => "ozon",
            Marketplace::Wildberries => "wb",
            Marketplace::Yandex => "yandex",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ozon" => Some(Marketplace::Ozon),
            "wb" | "wildberries" => Some(Marketplace::Wildberries),
            "yandex" | "yandex-market" | "ym" => Some(Marketplace::Yandex),
            _ => None,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Marketplace::Ozon => "Ozon",
            Marketplace::Wildberries => "Wildberries",
            Marketplace::Yandex => "Yandex Market",
        }
    }

    /// Storefront home page, used when seeding demo content
    pub fn home_url(&self) -> &'static str {
        match self {
            Marketplace::Ozon => "https://ozon.ru",
            Marketplace::Wildberries => "https://wildberries.ru",
            Marketplace::Yandex => "https://market.yandex.ru",
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Which marketplaces a promo code can be used on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PromoScope {
    #[default]
    All,
    Only(Marketplace),
}

impl PromoScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromoScope::All => "all",
            PromoScope::Only(m) => m.as_str(),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Some(PromoScope::All);
        }
        Marketplace::from_str(s).map(PromoScope::Only)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PromoScope::All => "All marketplaces",
            PromoScope::Only(m) => m.display_name(),
        }
    }

    /// `All` applies to every marketplace
    pub fn applies_to(&self, marketplace: Marketplace) -> bool {
        match self {
            PromoScope::All => true,
            PromoScope::Only(m) => *m == marketplace,
        }
    }
}

impl fmt::Display for PromoScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// Flat tag on the wire: "all" | "ozon" | "wb" | "yandex"
impl Serialize for PromoScope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PromoScope {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        PromoScope::from_str(&tag)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown marketplace '{tag}'")))
    }
}

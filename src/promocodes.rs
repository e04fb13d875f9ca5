//! Promo codes
//!
//! A code may be scoped to one marketplace or to all of them, and may carry
//! a last valid date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::marketplace::{Marketplace, PromoScope};
use crate::persistence::{BlobStore, keys, load_json, save_json};
use crate::{Error, Result, next_id, require};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promocode {
    pub id: u32,
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Display discount as entered ("15%", "500 ₽")
    pub discount: String,
    #[serde(default)]
    pub marketplace: PromoScope,
    /// Last day the code works; `None` never expires
    #[serde(default, with = "optional_date")]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub url: String,
}

impl Promocode {
    /// Expired once `today` is past the last valid day.
    ///
    /// The last day itself still counts as valid. Comparing the current
    /// instant against midnight UTC of `valid_until` would instead expire a
    /// code at the start of its last day.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.valid_until.is_some_and(|last| last < today)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromocodeDraft {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub discount: String,
    #[serde(default)]
    pub marketplace: PromoScope,
    #[serde(default, with = "optional_date")]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub url: String,
}

/// Expiry filter for the promo list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromoStatus {
    #[default]
    All,
    Active,
    Expired,
}

impl PromoStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(PromoStatus::All),
            "active" => Some(PromoStatus::Active),
            "expired" => Some(PromoStatus::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Promocodes {
    pub promocodes: Vec<Promocode>,
}

impl Promocodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.promocodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.promocodes.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Promocode> {
        self.promocodes.iter().find(|p| p.id == id)
    }

    pub fn add(&mut self, draft: PromocodeDraft) -> Result<&Promocode> {
        let promo = Promocode {
            id: next_id(self.promocodes.iter().map(|p| p.id)),
            code: require("code", &draft.code)?,
            title: require("title", &draft.title)?,
            description: draft.description.trim().to_string(),
            discount: require("discount", &draft.discount)?,
            marketplace: draft.marketplace,
            valid_until: draft.valid_until,
            url: draft.url.trim().to_string(),
        };
        log::info!("Promo code {} added: {}", promo.id, promo.code);
        self.promocodes.insert(0, promo);
        Ok(&self.promocodes[0])
    }

    pub fn delete(&mut self, id: u32) -> Result<Promocode> {
        let pos = self
            .promocodes
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::not_found("Promo code", id))?;
        Ok(self.promocodes.remove(pos))
    }

    /// Codes usable on `marketplace` (or any, when `None`) with the given status.
    /// Codes scoped to all marketplaces match every marketplace filter.
    pub fn filter(
        &self,
        marketplace: Option<Marketplace>,
        status: PromoStatus,
        today: NaiveDate,
    ) -> Vec<&Promocode> {
        self.promocodes
            .iter()
            .filter(|p| marketplace.is_none_or(|m| p.marketplace.applies_to(m)))
            .filter(|p| match status {
                PromoStatus::All => true,
                PromoStatus::Active => !p.is_expired(today),
                PromoStatus::Expired => p.is_expired(today),
            })
            .collect()
    }

    pub fn find_by_code(&self, code: &str) -> Option<&Promocode> {
        let code = code.trim();
        self.promocodes
            .iter()
            .find(|p| p.code.eq_ignore_ascii_case(code))
    }

    /// Look up a code a visitor wants to use
    pub fn redeem(&self, code: &str, today: NaiveDate) -> Result<&Promocode> {
        let promo = self
            .find_by_code(code)
            .ok_or_else(|| Error::not_found("Promo code", code.trim()))?;
        if promo.is_expired(today) {
            return Err(Error::Validation(format!("promo code {} has expired", promo.code)));
        }
        Ok(promo)
    }

    pub fn load(store: &dyn BlobStore) -> Result<Option<Self>> {
        let promocodes: Option<Self> = load_json(store, keys::PROMOCODES)?;
        if let Some(promocodes) = &promocodes {
            log::info!("Loaded {} promo codes", promocodes.len());
        }
        Ok(promocodes)
    }

    pub fn save(&self, store: &mut dyn BlobStore) -> Result<()> {
        save_json(store, keys::PROMOCODES, self)
    }
}

/// `"YYYY-MM-DD"`, with `""` meaning no date (as the admin form submits it)
mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

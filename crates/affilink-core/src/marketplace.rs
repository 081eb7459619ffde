//! Marketplaces an offer can belong to.
//!
//! The set of marketplaces is closed, so behavior per marketplace lives in a
//! static table of plain functions keyed by the [`Marketplace`] variant.

use crate::error::MarketplaceError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Marketplace {
    Lazada,
    Shopee,
}

/// UTM tracking parameters baked into a link's target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtmParams {
    pub campaign: String,
    pub source: Option<String>,
    pub medium: Option<String>,
}

impl UtmParams {
    /// Returns the query pairs in the order they are applied.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("utm_campaign", self.campaign.as_str())];
        if let Some(source) = &self.source {
            pairs.push(("utm_source", source.as_str()));
        }
        if let Some(medium) = &self.medium {
            pairs.push(("utm_medium", medium.as_str()));
        }
        pairs
    }
}

/// Per-marketplace behavior.
pub struct MarketplaceProfile {
    pub name: &'static str,
    pub matches_host: fn(&str) -> bool,
    pub build_affiliate_url: fn(&str, &UtmParams) -> Result<String, MarketplaceError>,
}

static LAZADA: MarketplaceProfile = MarketplaceProfile {
    name: "LAZADA",
    matches_host: is_lazada_host,
    build_affiliate_url: append_utm_params,
};

static SHOPEE: MarketplaceProfile = MarketplaceProfile {
    name: "SHOPEE",
    matches_host: is_shopee_host,
    build_affiliate_url: append_utm_params,
};

impl Marketplace {
    pub const ALL: [Marketplace; 2] = [Marketplace::Lazada, Marketplace::Shopee];

    pub fn profile(self) -> &'static MarketplaceProfile {
        match self {
            Marketplace::Lazada => &LAZADA,
            Marketplace::Shopee => &SHOPEE,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.profile().name
    }

    /// Returns `true` if `url` points at this marketplace.
    pub fn matches(self, url: &str) -> bool {
        (self.profile().matches_host)(url)
    }

    /// Finds the marketplace an offer URL belongs to.
    pub fn detect(url: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|marketplace| marketplace.matches(url))
    }

    /// Builds the tracked target URL for an offer of this marketplace.
    pub fn build_affiliate_url(
        self,
        external_url: &str,
        utm: &UtmParams,
    ) -> Result<String, MarketplaceError> {
        (self.profile().build_affiliate_url)(external_url, utm)
    }
}

impl Display for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Marketplace {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|marketplace| marketplace.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MarketplaceError::Unknown(s.to_string()))
    }
}

fn is_lazada_host(url: &str) -> bool {
    host_contains(url, "lazada")
}

fn is_shopee_host(url: &str) -> bool {
    host_contains(url, "shopee")
}

fn host_contains(url: &str, marker: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host.contains(marker)))
        .unwrap_or(false)
}

fn append_utm_params(external_url: &str, utm: &UtmParams) -> Result<String, MarketplaceError> {
    let mut url = Url::parse(external_url).map_err(|e| MarketplaceError::InvalidUrl {
        url: external_url.to_string(),
        reason: e.to_string(),
    })?;

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    for (key, value) in utm.pairs() {
        set_query_param(&mut pairs, key, value);
    }

    url.query_pairs_mut().clear().extend_pairs(&pairs);
    Ok(url.into())
}

/// Replaces the first `key` in place and drops later duplicates, or appends
/// the pair when `key` is absent.
fn set_query_param(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    let mut seen = false;
    pairs.retain_mut(|(k, v)| {
        if k.as_str() != key {
            return true;
        }
        if seen {
            return false;
        }
        seen = true;
        *v = value.to_string();
        true
    });
    if !seen {
        pairs.push((key.to_string(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summer() -> UtmParams {
        UtmParams {
            campaign: "summer2025".to_string(),
            source: Some("website".to_string()),
            medium: Some("affiliate".to_string()),
        }
    }

    #[test]
    fn builds_url_with_all_utm_params() {
        let url = Marketplace::Lazada
            .build_affiliate_url("https://www.lazada.co.th/products/matcha-powder-123", &summer())
            .unwrap();
        assert_eq!(
            url,
            "https://www.lazada.co.th/products/matcha-powder-123?utm_campaign=summer2025&utm_source=website&utm_medium=affiliate"
        );
    }

    #[test]
    fn optional_utm_params_are_skipped() {
        let utm = UtmParams {
            campaign: "summer2025".to_string(),
            source: None,
            medium: None,
        };
        let url = Marketplace::Lazada
            .build_affiliate_url("https://www.lazada.co.th/products/matcha-powder-123", &utm)
            .unwrap();
        assert_eq!(
            url,
            "https://www.lazada.co.th/products/matcha-powder-123?utm_campaign=summer2025"
        );
    }

    #[test]
    fn existing_params_are_replaced_not_duplicated() {
        let utm = UtmParams {
            campaign: "summer2025".to_string(),
            source: None,
            medium: None,
        };
        let url = Marketplace::Shopee
            .build_affiliate_url(
                "https://shopee.co.th/Matcha-Powder-456?utm_campaign=old&ref=1&utm_campaign=dup",
                &utm,
            )
            .unwrap();
        assert_eq!(
            url,
            "https://shopee.co.th/Matcha-Powder-456?utm_campaign=summer2025&ref=1"
        );
    }

    #[test]
    fn invalid_offer_url_is_rejected() {
        let err = Marketplace::Shopee
            .build_affiliate_url("not a url", &summer())
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::InvalidUrl { .. }));
    }

    #[test]
    fn detect_by_host() {
        assert_eq!(
            Marketplace::detect("https://www.lazada.co.th/products/x"),
            Some(Marketplace::Lazada)
        );
        assert_eq!(
            Marketplace::detect("https://shopee.co.th/Yoga-Mat-Premium-012"),
            Some(Marketplace::Shopee)
        );
        assert_eq!(Marketplace::detect("https://example.com/lazada"), None);
        assert_eq!(Marketplace::detect("lazada"), None);
    }

    #[test]
    fn parse_and_serialize_names() {
        assert_eq!("LAZADA".parse::<Marketplace>().unwrap(), Marketplace::Lazada);
        assert_eq!("shopee".parse::<Marketplace>().unwrap(), Marketplace::Shopee);
        assert!("AMAZON".parse::<Marketplace>().is_err());
        assert_eq!(
            serde_json::to_string(&Marketplace::Shopee).unwrap(),
            "\"SHOPEE\""
        );
    }
}

use crate::marketplace::{Marketplace, UtmParams};
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an affiliate link.
    LinkId
);
uuid_id!(ProductId);
uuid_id!(CampaignId);

/// Identifier of a recorded click, assigned by the store.
pub type ClickId = u64;

/// The natural key of a link: one link per product, campaign and marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkKey {
    pub product_id: ProductId,
    pub campaign_id: CampaignId,
    pub marketplace: Marketplace,
}

/// A stored affiliate link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub product_id: ProductId,
    pub campaign_id: CampaignId,
    pub marketplace: Marketplace,
    pub short_code: ShortCode,
    /// Offer URL with the campaign's UTM parameters already applied.
    pub target_url: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Link {
    pub fn key(&self) -> LinkKey {
        LinkKey {
            product_id: self.product_id,
            campaign_id: self.campaign_id,
            marketplace: self.marketplace,
        }
    }

    pub fn resolved(&self) -> ResolvedLink {
        ResolvedLink {
            id: self.id,
            target_url: self.target_url.clone(),
        }
    }
}

/// The minimal view of a link needed to redirect: this is what gets cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLink {
    pub id: LinkId,
    pub target_url: String,
}

/// A link together with its durable click total.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSummary {
    pub link: Link,
    pub click_count: u64,
}

/// A truncated SHA-256 digest of a client address, as 16 lowercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientHash(String);

impl ClientHash {
    pub const HEX_LEN: usize = 16;

    /// Wraps an already-derived digest prefix.
    pub fn new_unchecked(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ClientHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A click waiting to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClick {
    pub link_id: LinkId,
    pub timestamp: Timestamp,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub client_hash: Option<ClientHash>,
}

/// A persisted click. Clicks are append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Click {
    pub id: ClickId,
    pub link_id: LinkId,
    pub timestamp: Timestamp,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub client_hash: Option<ClientHash>,
}

impl Click {
    pub fn from_new(id: ClickId, click: NewClick) -> Self {
        Self {
            id,
            link_id: click.link_id,
            timestamp: click.timestamp,
            referrer: click.referrer,
            user_agent: click.user_agent,
            client_hash: click.client_hash,
        }
    }
}

/// A product listing on one marketplace.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub product_id: ProductId,
    pub marketplace: Marketplace,
    pub store_name: String,
    pub external_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub slug: String,
    pub utm_campaign: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub is_active: bool,
}

impl Campaign {
    pub fn utm_params(&self) -> UtmParams {
        UtmParams {
            campaign: self.utm_campaign.clone(),
            source: self.utm_source.clone(),
            medium: self.utm_medium.clone(),
        }
    }
}

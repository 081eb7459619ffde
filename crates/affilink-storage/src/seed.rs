//! Demo catalog for local runs: three products on both marketplaces, one
//! campaign, and a link for every offer.

use crate::memory::InMemoryRepository;
use affilink_core::repository::{LinkRepository, Result};
use affilink_core::{
    Campaign, CampaignId, Link, LinkId, Marketplace, Offer, ProductId, ShortCode, StorageError,
};
use jiff::Timestamp;
use tracing::info;
use uuid::Uuid;

pub const DEMO_CAMPAIGN_ID: CampaignId =
    CampaignId::from_uuid(Uuid::from_u128(0x5f1e_0c2a_7b3d_4e8f_9a10_2025_0000_0001));

struct DemoOffer {
    product: u128,
    marketplace: Marketplace,
    store_name: &'static str,
    external_url: &'static str,
    short_code: &'static str,
}

const DEMO_OFFERS: [DemoOffer; 6] = [
    DemoOffer {
        product: 0x0a11_0000_0000_4000_8000_0000_0000_0001,
        marketplace: Marketplace::Lazada,
        store_name: "Green Tea House",
        external_url: "https://www.lazada.co.th/products/matcha-powder-123",
        short_code: "matcha-lz",
    },
    DemoOffer {
        product: 0x0a11_0000_0000_4000_8000_0000_0000_0001,
        marketplace: Marketplace::Shopee,
        store_name: "Organic Tea Shop",
        external_url: "https://shopee.co.th/Matcha-Powder-456",
        short_code: "matcha-sp",
    },
    DemoOffer {
        product: 0x0a11_0000_0000_4000_8000_0000_0000_0002,
        marketplace: Marketplace::Lazada,
        store_name: "Fitness World",
        external_url: "https://www.lazada.co.th/products/yoga-mat-789",
        short_code: "yoga-lz",
    },
    DemoOffer {
        product: 0x0a11_0000_0000_4000_8000_0000_0000_0002,
        marketplace: Marketplace::Shopee,
        store_name: "Active Life Store",
        external_url: "https://shopee.co.th/Yoga-Mat-Premium-012",
        short_code: "yoga-sp",
    },
    DemoOffer {
        product: 0x0a11_0000_0000_4000_8000_0000_0000_0003,
        marketplace: Marketplace::Lazada,
        store_name: "Tech Gadgets Pro",
        external_url: "https://www.lazada.co.th/products/earbuds-321",
        short_code: "earbuds-lz",
    },
    DemoOffer {
        product: 0x0a11_0000_0000_4000_8000_0000_0000_0003,
        marketplace: Marketplace::Shopee,
        store_name: "Digital Store",
        external_url: "https://shopee.co.th/Wireless-Earbuds-654",
        short_code: "earbuds-sp",
    },
];

pub fn demo_campaign() -> Campaign {
    Campaign {
        id: DEMO_CAMPAIGN_ID,
        name: "Summer Deal 2025".to_string(),
        slug: "summer-deal-2025".to_string(),
        utm_campaign: "summer2025".to_string(),
        utm_source: Some("website".to_string()),
        utm_medium: Some("affiliate".to_string()),
        is_active: true,
    }
}

/// Loads the demo catalog and links into `repo`.
///
/// Returns the seeded links. Running it twice fails with `Conflict`.
pub async fn seed_demo(repo: &InMemoryRepository) -> Result<Vec<Link>> {
    let campaign = demo_campaign();
    let utm = campaign.utm_params();
    repo.put_campaign(campaign);

    let now = Timestamp::now();
    let mut links = Vec::with_capacity(DEMO_OFFERS.len());

    for demo in &DEMO_OFFERS {
        let product_id = ProductId::from_uuid(Uuid::from_u128(demo.product));
        repo.put_offer(Offer {
            product_id,
            marketplace: demo.marketplace,
            store_name: demo.store_name.to_string(),
            external_url: demo.external_url.to_string(),
        });

        let target_url = demo
            .marketplace
            .build_affiliate_url(demo.external_url, &utm)
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        let link = Link {
            id: LinkId::new(),
            product_id,
            campaign_id: DEMO_CAMPAIGN_ID,
            marketplace: demo.marketplace,
            short_code: ShortCode::new_unchecked(demo.short_code),
            target_url,
            created_at: now,
            updated_at: now,
        };
        repo.insert_link(&link).await?;
        links.push(link);
    }

    info!(links = links.len(), "Seeded demo catalog");
    Ok(links)
}

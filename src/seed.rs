//! Demo content for a fresh store
//!
//! Each collection is written only when its key is absent, so deleting every
//! product leaves an empty catalog rather than bringing the demo back.

use chrono::NaiveDate;

use crate::articles::{Article, Articles};
use crate::catalog::{Catalog, Product};
use crate::marketplace::{Marketplace, PromoScope};
use crate::persistence::{BlobStore, keys};
use crate::posts::{ComparisonPost, PostProduct, Posts};
use crate::promocodes::{Promocode, Promocodes};
use crate::settings::Settings;
use crate::Result;

fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn product(
    id: u32,
    title: &str,
    description: &str,
    price: &str,
    marketplace: Marketplace,
    photo: &str,
) -> Product {
    Product {
        id,
        title: title.to_string(),
        description: description.to_string(),
        price: price.to_string(),
        marketplace,
        url: marketplace.home_url().to_string(),
        image_url: format!("https://images.unsplash.com/{photo}?w=400&h=400&fit=crop"),
        is_favorite: false,
    }
}

pub fn demo_catalog() -> Catalog {
    use Marketplace::*;
    Catalog {
        products: vec![
            product(
                1,
                "Wireless TWS earbuds",
                "Clear sound, up to 24 hours of playback, fast USB-C charging",
                "2 490 ₽",
                Ozon,
                "photo-1590658165737-15a047b7a0b5",
            ),
            product(
                2,
                "Smart speaker with voice assistant",
                "Voice control, smart home hub, rich sound",
                "3 990 ₽",
                Yandex,
                "photo-1543512214-318c7553f230",
            ),
            product(
                3,
                "Mi Band 8 fitness tracker",
                "Health monitoring, 120+ workout modes, AMOLED display",
                "1 790 ₽",
                Wildberries,
                "photo-1575311373937-040b8e1fd5b6",
            ),
            product(
                4,
                "Mechanical RGB keyboard",
                "Blue switches, RGB backlight, detachable cable",
                "4 290 ₽",
                Ozon,
                "photo-1595225476474-87563907a212",
            ),
            product(
                5,
                "MX Master 3 wireless mouse",
                "Ergonomic shape, up to 70 days per charge, fast scrolling",
                "6 990 ₽",
                Yandex,
                "photo-1527864550417-7fd91fc51a46",
            ),
            product(
                6,
                "JBL portable speaker",
                "IPX7 waterproof, 12 hours of playback, deep bass",
                "3 490 ₽",
                Wildberries,
                "photo-1608043152269-423dbba4e7e1",
            ),
        ],
    }
}

pub fn demo_promocodes() -> Promocodes {
    Promocodes {
        promocodes: vec![
            Promocode {
                id: 1,
                code: "ELECTRONICS2024".to_string(),
                title: "Electronics sale".to_string(),
                description: "15% off all electronics and gadgets".to_string(),
                discount: "15%".to_string(),
                marketplace: PromoScope::Only(Marketplace::Ozon),
                valid_until: date(2024, 12, 31),
                url: Marketplace::Ozon.home_url().to_string(),
            },
            Promocode {
                id: 2,
                code: "FIRSTORDER".to_string(),
                title: "First order discount".to_string(),
                description: "Special offer for new customers".to_string(),
                discount: "500 ₽".to_string(),
                marketplace: PromoScope::Only(Marketplace::Wildberries),
                valid_until: date(2024, 11, 15),
                url: Marketplace::Wildberries.home_url().to_string(),
            },
        ],
    }
}

pub fn demo_posts() -> Posts {
    let created_at = date(2024, 11, 20).unwrap_or_default();
    Posts {
        posts: vec![ComparisonPost {
            id: 1,
            title: "Wireless earbuds under 3000 ₽".to_string(),
            description: "A detailed look at popular budget TWS earbuds".to_string(),
            products: vec![
                PostProduct {
                    title: "Xiaomi Redmi Buds 4".to_string(),
                    price: "2 490 ₽".to_string(),
                    marketplace: Marketplace::Ozon,
                    url: Marketplace::Ozon.home_url().to_string(),
                    pros: "Great sound, long battery life".to_string(),
                    cons: "No active noise cancelling".to_string(),
                },
                PostProduct {
                    title: "Haylou GT7".to_string(),
                    price: "2 190 ₽".to_string(),
                    marketplace: Marketplace::Wildberries,
                    url: Marketplace::Wildberries.home_url().to_string(),
                    pros: "Low latency, solid build".to_string(),
                    cons: "Average bass".to_string(),
                },
            ],
            created_at,
        }],
    }
}

pub fn demo_articles() -> Articles {
    Articles {
        articles: vec![Article {
            id: 1,
            title: "How to choose wireless earbuds in 2024".to_string(),
            content: "Wireless earbuds have become part of everyday life. This guide covers \
                      what matters when choosing a pair: sound quality, battery life, fit, \
                      and extras such as noise cancelling."
                .to_string(),
            author: "Admin".to_string(),
            tags: vec![
                "Earbuds".to_string(),
                "Guides".to_string(),
                "Electronics".to_string(),
            ],
            image_url:
                "https://images.unsplash.com/photo-1590658165737-15a047b7a0b5?w=800&h=400&fit=crop"
                    .to_string(),
            created_at: date(2024, 11, 20).unwrap_or_default(),
        }],
    }
}

/// Write demo collections that are missing from `store`; returns the keys written
pub fn seed(store: &mut dyn BlobStore, settings: &Settings) -> Result<Vec<&'static str>> {
    let mut written = Vec::new();
    if !settings.seed_demo_content {
        return Ok(written);
    }

    if !store.contains(keys::PRODUCTS)? {
        demo_catalog().save(store)?;
        written.push(keys::PRODUCTS);
    }
    if !store.contains(keys::PROMOCODES)? {
        demo_promocodes().save(store)?;
        written.push(keys::PROMOCODES);
    }
    if !store.contains(keys::COMPARISON_POSTS)? {
        demo_posts().save(store)?;
        written.push(keys::COMPARISON_POSTS);
    }
    if !store.contains(keys::ARTICLES)? {
        demo_articles().save(store)?;
        written.push(keys::ARTICLES);
    }

    if !written.is_empty() {
        log::info!("Seeded demo content: {}", written.join(", "));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_seed_fresh_store() {
        let mut store = MemoryStore::new();
        let written = seed(&mut store, &Settings::default()).unwrap();
        assert_eq!(written.len(), 4);

        let catalog = Catalog::load(&store).unwrap().unwrap();
        assert_eq!(catalog.len(), 6);
        assert!(catalog.products.iter().all(|p| !p.is_favorite));
        assert_eq!(Promocodes::load(&store).unwrap().unwrap().len(), 2);
        assert_eq!(Posts::load(&store).unwrap().unwrap().posts[0].products.len(), 2);
        assert_eq!(Articles::load(&store).unwrap().unwrap().articles[0].tags.len(), 3);
    }

    #[test]
    fn test_seed_keeps_existing_and_empty_collections() {
        let mut store = MemoryStore::new();
        Catalog::new().save(&mut store).unwrap();

        let written = seed(&mut store, &Settings::default()).unwrap();
        assert!(!written.contains(&keys::PRODUCTS));
        assert!(Catalog::load(&store).unwrap().unwrap().is_empty());

        // second run writes nothing
        assert!(seed(&mut store, &Settings::default()).unwrap().is_empty());
    }

    #[test]
    fn test_seed_disabled() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            seed_demo_content: false,
            ..Settings::default()
        };
        assert!(seed(&mut store, &settings).unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_demo_promos_use_marketplace_scope() {
        let promos = demo_promocodes();
        let first = promos.find_by_code("electronics2024").unwrap();
        assert_eq!(first.marketplace, PromoScope::Only(Marketplace::Ozon));
        assert_eq!(first.valid_until, date(2024, 12, 31));
    }
}

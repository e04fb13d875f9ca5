//! The storefront over a single blob store
//!
//! `Storefront` loads every collection at startup and writes the affected
//! blob back after each mutation. Browsing, favorites, comparison, promo
//! lookup, likes, comments and visit tracking are open to every visitor;
//! content management, comment moderation, user management and the
//! analytics dashboard need an administrator session.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::analytics::{Analytics, BlobAnalytics, PageStats, PageSummary, Section};
use crate::articles::{self, Article, ArticleDraft, Articles};
use crate::auth::{Auth, Role, SessionUser, UserSummary};
use crate::catalog::{Catalog, CatalogTab, Product, ProductDraft};
use crate::comparison::{Comparison, ComparisonRow};
use crate::engagement::{BlobEngagement, Comment, Engagement, LikeSummary, NewComment};
use crate::fingerprint::{self, VisitorTraits};
use crate::marketplace::Marketplace;
use crate::persistence::BlobStore;
use crate::platform::{self, time::now_millis};
use crate::posts::{self, ComparisonPost, PostDraft, Posts};
use crate::promocodes::{PromoStatus, Promocode, PromocodeDraft, Promocodes};
use crate::seed;
use crate::settings::Settings;
use crate::upload::{self, MediaStore, UploadRequest, UploadedImage};
use crate::{Error, Result};

/// Analytics overview for the admin panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub total_unique_visitors: usize,
    pub pages: Vec<PageSummary>,
    pub section_views: Vec<(&'static str, u64)>,
}

pub struct Storefront<S: BlobStore> {
    store: S,
    settings: Settings,
    auth: Auth,
    catalog: Catalog,
    articles: Articles,
    promocodes: Promocodes,
    posts: Posts,
    comparison: Comparison,
    rng: Pcg32,
}

impl<S: BlobStore> Storefront<S> {
    /// Load settings, seed demo content if needed, restore the session
    pub fn open(store: S) -> Result<Self> {
        Self::open_with_seed(store, now_millis() as u64)
    }

    /// Like `open`, with a fixed seed for visitor tokens and upload names
    pub fn open_with_seed(mut store: S, rng_seed: u64) -> Result<Self> {
        let settings = Settings::load(&store)?;
        seed::seed(&mut store, &settings)?;

        let auth = Auth::load(&store, &settings)?;
        let catalog = Catalog::load(&store)?.unwrap_or_default();
        let articles = Articles::load(&store)?.unwrap_or_default();
        let promocodes = Promocodes::load(&store)?.unwrap_or_default();
        let posts = Posts::load(&store)?.unwrap_or_default();
        let comparison = Comparison::load(&store, settings.max_compare)?;

        log::info!(
            "Storefront opened: {} products, {} articles, {} promo codes, {} posts",
            catalog.len(),
            articles.len(),
            promocodes.len(),
            posts.len()
        );

        Ok(Self {
            store,
            settings,
            auth,
            catalog,
            articles,
            promocodes,
            posts,
            comparison,
            rng: Pcg32::seed_from_u64(rng_seed),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace and persist the settings (admin only)
    pub fn update_settings(&mut self, settings: Settings) -> Result<()> {
        self.auth.require_admin()?;
        let mut comparison = self.comparison.clone();
        comparison.set_limit(settings.max_compare);
        settings.save(&mut self.store)?;
        comparison.save(&mut self.store)?;
        self.settings = settings;
        self.comparison = comparison;
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // === Accounts ===

    pub fn current_user(&self) -> Option<&SessionUser> {
        self.auth.current()
    }

    pub fn is_admin(&self) -> bool {
        self.auth.is_admin()
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<SessionUser> {
        let settings = &self.settings;
        commit(
            &mut self.store,
            &mut self.auth,
            |auth| Ok(auth.login(settings, email, password)?.clone()),
            Auth::save_session,
        )
    }

    pub fn register(&mut self, email: &str, password: &str, confirm: &str) -> Result<SessionUser> {
        let settings = &self.settings;
        commit(
            &mut self.store,
            &mut self.auth,
            |auth| Ok(auth.register(settings, email, password, confirm)?.clone()),
            save_accounts,
        )
    }

    pub fn logout(&mut self) -> Result<()> {
        commit(
            &mut self.store,
            &mut self.auth,
            |auth| {
                auth.logout();
                Ok(())
            },
            Auth::save_session,
        )
    }

    /// Pick up a session persisted by someone else sharing the store
    pub fn restore_session(&mut self) -> Result<Option<&SessionUser>> {
        self.auth.restore(&self.store, &self.settings)?;
        Ok(self.auth.current())
    }

    pub fn change_password(&mut self, current: &str, new: &str, confirm: &str) -> Result<()> {
        let settings = &self.settings;
        commit(
            &mut self.store,
            &mut self.auth,
            |auth| auth.change_password(settings, current, new, confirm),
            Auth::save_users,
        )
    }

    pub fn list_users(&self) -> Result<Vec<UserSummary>> {
        self.auth.list_users()
    }

    pub fn toggle_role(&mut self, email: &str) -> Result<Role> {
        commit(
            &mut self.store,
            &mut self.auth,
            |auth| auth.toggle_role(email),
            save_accounts,
        )
    }

    pub fn delete_user(&mut self, email: &str) -> Result<()> {
        commit(
            &mut self.store,
            &mut self.auth,
            |auth| auth.delete_user(email),
            save_accounts,
        )
    }

    // === Catalog ===

    pub fn products(&self) -> &[Product] {
        &self.catalog.products
    }

    pub fn product(&self, id: u32) -> Result<&Product> {
        self.catalog.get(id).ok_or_else(|| Error::not_found("Product", id))
    }

    pub fn search_products(&self, query: &str, tab: CatalogTab) -> Vec<&Product> {
        self.catalog.search(query, tab)
    }

    pub fn products_on(&self, marketplace: Option<Marketplace>) -> Vec<&Product> {
        self.catalog.by_marketplace(marketplace)
    }

    pub fn favorites_count(&self) -> usize {
        self.catalog.favorites_count()
    }

    pub fn add_product(&mut self, draft: ProductDraft) -> Result<Product> {
        self.auth.require_admin()?;
        let image = &self.settings.default_product_image;
        commit(
            &mut self.store,
            &mut self.catalog,
            |catalog| Ok(catalog.add(draft, image)?.clone()),
            Catalog::save,
        )
    }

    pub fn update_product(&mut self, id: u32, draft: ProductDraft) -> Result<Product> {
        self.auth.require_admin()?;
        let image = &self.settings.default_product_image;
        commit(
            &mut self.store,
            &mut self.catalog,
            |catalog| Ok(catalog.update(id, draft, image)?.clone()),
            Catalog::save,
        )
    }

    pub fn delete_product(&mut self, id: u32) -> Result<Product> {
        self.auth.require_admin()?;
        let product = commit(
            &mut self.store,
            &mut self.catalog,
            |catalog| catalog.delete(id),
            Catalog::save,
        )?;
        log::info!("Product {} deleted", id);
        Ok(product)
    }

    /// Flip the favorite flag; returns the new state
    pub fn toggle_favorite(&mut self, id: u32) -> Result<bool> {
        commit(
            &mut self.store,
            &mut self.catalog,
            |catalog| catalog.toggle_favorite(id),
            Catalog::save,
        )
    }

    // === Comparison ===

    pub fn comparison(&self) -> &Comparison {
        &self.comparison
    }

    pub fn comparison_rows(&self) -> Vec<ComparisonRow> {
        self.comparison.rows()
    }

    /// Catalog products that can still be added to the comparison
    pub fn comparison_candidates(&self, query: &str) -> Vec<&Product> {
        self.comparison.available(&self.catalog.products, query)
    }

    pub fn compare_add(&mut self, id: u32) -> Result<()> {
        let product = self.product(id)?.clone();
        commit(
            &mut self.store,
            &mut self.comparison,
            |comparison| comparison.add(product),
            Comparison::save,
        )
    }

    pub fn compare_remove(&mut self, id: u32) -> Result<Product> {
        commit(
            &mut self.store,
            &mut self.comparison,
            |comparison| comparison.remove(id),
            Comparison::save,
        )
    }

    pub fn compare_clear(&mut self) -> Result<()> {
        commit(
            &mut self.store,
            &mut self.comparison,
            |comparison| {
                comparison.clear();
                Ok(())
            },
            Comparison::save,
        )
    }

    // === Comparison posts ===

    pub fn posts(&self) -> &[ComparisonPost] {
        &self.posts.posts
    }

    pub fn add_post(&mut self, draft: PostDraft) -> Result<ComparisonPost> {
        self.auth.require_admin()?;
        commit(
            &mut self.store,
            &mut self.posts,
            |posts| Ok(posts.add(draft, platform::today())?.clone()),
            Posts::save,
        )
    }

    pub fn delete_post(&mut self, id: u32) -> Result<ComparisonPost> {
        self.auth.require_admin()?;
        let post = commit(
            &mut self.store,
            &mut self.posts,
            |posts| posts.delete(id),
            Posts::save,
        )?;
        log::info!("Comparison post {} deleted", id);
        Ok(post)
    }

    pub fn post_share_url(&self, id: u32) -> Result<String> {
        self.posts
            .get(id)
            .map(|p| posts::share_url(&self.settings.site_origin, p.id))
            .ok_or_else(|| Error::not_found("Comparison post", id))
    }

    // === Articles ===

    pub fn articles(&self) -> &[Article] {
        &self.articles.articles
    }

    pub fn article(&self, id: u32) -> Result<&Article> {
        self.articles.get(id).ok_or_else(|| Error::not_found("Article", id))
    }

    pub fn articles_tagged(&self, tag: &str) -> Vec<&Article> {
        self.articles.with_tag(tag)
    }

    pub fn add_article(&mut self, draft: ArticleDraft) -> Result<Article> {
        self.auth.require_admin()?;
        let image = &self.settings.default_article_image;
        commit(
            &mut self.store,
            &mut self.articles,
            |articles| Ok(articles.add(draft, image, platform::today())?.clone()),
            Articles::save,
        )
    }

    pub fn update_article(&mut self, id: u32, draft: ArticleDraft) -> Result<Article> {
        self.auth.require_admin()?;
        let image = &self.settings.default_article_image;
        commit(
            &mut self.store,
            &mut self.articles,
            |articles| Ok(articles.update(id, draft, image)?.clone()),
            Articles::save,
        )
    }

    pub fn delete_article(&mut self, id: u32) -> Result<Article> {
        self.auth.require_admin()?;
        let article = commit(
            &mut self.store,
            &mut self.articles,
            |articles| articles.delete(id),
            Articles::save,
        )?;
        log::info!("Article {} deleted", id);
        Ok(article)
    }

    pub fn article_share_url(&self, id: u32) -> Result<String> {
        let article = self.article(id)?;
        Ok(articles::share_url(&self.settings.site_origin, article.id))
    }

    // === Promo codes ===

    pub fn promocodes(&self, marketplace: Option<Marketplace>, status: PromoStatus) -> Vec<&Promocode> {
        self.promocodes.filter(marketplace, status, platform::today())
    }

    pub fn redeem(&self, code: &str) -> Result<&Promocode> {
        self.promocodes.redeem(code, platform::today())
    }

    pub fn add_promocode(&mut self, draft: PromocodeDraft) -> Result<Promocode> {
        self.auth.require_admin()?;
        commit(
            &mut self.store,
            &mut self.promocodes,
            |promocodes| Ok(promocodes.add(draft)?.clone()),
            Promocodes::save,
        )
    }

    pub fn delete_promocode(&mut self, id: u32) -> Result<Promocode> {
        self.auth.require_admin()?;
        let promo = commit(
            &mut self.store,
            &mut self.promocodes,
            |promocodes| promocodes.delete(id),
            Promocodes::save,
        )?;
        log::info!("Promo code {} deleted", id);
        Ok(promo)
    }

    // === Visitors ===

    /// Fingerprint of this visitor, remembered in the store
    pub fn visitor_fingerprint(&mut self, traits: &VisitorTraits) -> Result<String> {
        fingerprint::visitor_fingerprint(&mut self.store, traits, &mut self.rng)
    }

    /// Fingerprint hidden from analytics while the admin is logged in
    pub fn admin_fingerprint(&self) -> String {
        fingerprint::admin_fingerprint(self.auth.current())
    }

    fn engagement(&mut self) -> BlobEngagement<&mut S> {
        BlobEngagement::new(&mut self.store)
    }

    fn analytics(&mut self) -> BlobAnalytics<&mut S> {
        BlobAnalytics::new(&mut self.store)
    }

    pub fn like(&mut self, article_id: u32, fingerprint: &str) -> Result<bool> {
        self.engagement().like(article_id, fingerprint)
    }

    pub fn unlike(&mut self, article_id: u32, fingerprint: &str) -> Result<()> {
        self.engagement().unlike(article_id, fingerprint)
    }

    pub fn likes(&mut self, article_id: u32, fingerprint: Option<&str>) -> Result<LikeSummary> {
        self.engagement().likes(article_id, fingerprint)
    }

    pub fn comments(&mut self, article_id: u32) -> Result<Vec<Comment>> {
        self.engagement().comments(article_id)
    }

    pub fn add_comment(&mut self, comment: NewComment) -> Result<Comment> {
        self.engagement().add_comment(comment, platform::now())
    }

    /// Remove a comment (admin only)
    pub fn delete_comment(&mut self, id: u32) -> Result<Comment> {
        self.auth.require_admin()?;
        self.engagement().delete_comment(id)
    }

    /// Record a page visit unless it is the logged-in admin browsing
    pub fn track_visit(&mut self, page_path: &str, fingerprint: &str) -> Result<bool> {
        let admin = self.admin_fingerprint();
        // the admin's visits go under the admin fingerprint, which analytics skips
        let visitor = if self.auth.is_admin() { admin.as_str() } else { fingerprint };
        self.analytics()
            .track_visit(page_path, visitor, &admin, platform::now())
    }

    pub fn record_view(&mut self, section: Section) -> Result<u64> {
        self.analytics().record_view(section)
    }

    pub fn page_stats(&mut self, page_path: &str) -> Result<PageStats> {
        let admin = self.admin_fingerprint();
        self.analytics().page_stats(page_path, &admin)
    }

    /// Visitor statistics (admin only)
    pub fn dashboard(&mut self) -> Result<Dashboard> {
        let admin = self.auth.require_admin().map(|_| self.admin_fingerprint())?;
        let analytics = self.analytics();

        let mut section_views = Vec::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            section_views.push((section.as_str(), analytics.views(section)?));
        }
        Ok(Dashboard {
            total_unique_visitors: analytics.total_unique_visitors(&admin)?,
            pages: analytics.all_stats(&admin)?,
            section_views,
        })
    }

    // === Media ===

    /// Store an article image and return its public URL (admin only)
    pub fn upload_image<M: MediaStore + ?Sized>(
        &mut self,
        media: &mut M,
        request: &UploadRequest,
    ) -> Result<UploadedImage> {
        self.auth.require_admin()?;
        upload::upload_image(media, request, &self.settings.cdn_base_url, &mut self.rng)
    }
}

/// Apply `change` to a copy of `current`, persist the copy, then keep it.
/// A failed change or save leaves `current` untouched.
fn commit<C: Clone, T>(
    store: &mut dyn BlobStore,
    current: &mut C,
    change: impl FnOnce(&mut C) -> Result<T>,
    save: impl FnOnce(&C, &mut dyn BlobStore) -> Result<()>,
) -> Result<T> {
    let mut next = current.clone();
    let out = change(&mut next)?;
    save(&next, store)?;
    *current = next;
    Ok(out)
}

fn save_accounts(auth: &Auth, store: &mut dyn BlobStore) -> Result<()> {
    auth.save_users(store)?;
    auth.save_session(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::PromoScope;
    use crate::error::StorageError;
    use crate::persistence::{MemoryStore, keys};
    use std::cell::Cell;
    use std::rc::Rc;
    use crate::posts::PostProduct;
    use crate::upload::MemoryMedia;

    fn open(store: MemoryStore) -> Storefront<MemoryStore> {
        Storefront::open_with_seed(store, 1).unwrap()
    }

    fn admin() -> Storefront<MemoryStore> {
        let mut shop = open(MemoryStore::new());
        shop.login("admin", "changeme").unwrap();
        shop
    }

    fn product_draft(title: &str) -> ProductDraft {
        ProductDraft {
            title: title.to_string(),
            description: "Noise cancelling".to_string(),
            price: "9 990 ₽".to_string(),
            marketplace: Marketplace::Yandex,
            url: "https://market.yandex.ru/p/1".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_open_seeds_demo_content() {
        let shop = open(MemoryStore::new());
        assert_eq!(shop.products().len(), 6);
        assert_eq!(shop.articles().len(), 1);
        assert_eq!(shop.posts().len(), 1);
        assert_eq!(shop.promocodes(None, PromoStatus::All).len(), 2);
        assert!(shop.current_user().is_none());
        assert_eq!(shop.products_on(Some(Marketplace::Ozon)).len(), 2);
    }

    #[test]
    fn test_content_mutations_need_admin() {
        let mut shop = open(MemoryStore::new());
        assert!(matches!(shop.add_product(product_draft("X")), Err(Error::Unauthorized)));
        assert!(matches!(shop.delete_article(1), Err(Error::Unauthorized)));

        shop.register("bob@example.com", "secret1", "secret1").unwrap();
        assert!(matches!(shop.delete_product(1), Err(Error::Forbidden)));
        assert!(matches!(shop.delete_promocode(1), Err(Error::Forbidden)));
        assert!(matches!(shop.delete_post(1), Err(Error::Forbidden)));
        assert!(matches!(shop.delete_comment(1), Err(Error::Forbidden)));
        assert!(matches!(shop.dashboard(), Err(Error::Forbidden)));
        assert!(matches!(shop.list_users(), Err(Error::Forbidden)));
        assert_eq!(shop.products().len(), 6);
    }

    #[test]
    fn test_mutations_write_through() {
        let mut shop = admin();
        let added = shop.add_product(product_draft("Headphones")).unwrap();
        assert_eq!(added.id, 7);
        assert_eq!(added.image_url, shop.settings().default_product_image);
        shop.delete_article(1).unwrap();
        shop.toggle_favorite(2).unwrap();

        let reopened = open(shop.into_store());
        assert_eq!(reopened.products()[0].title, "Headphones");
        assert!(reopened.product(2).unwrap().is_favorite);
        // seeding does not bring deleted content back
        assert!(reopened.articles().is_empty());
        // the admin session survives a restart
        assert!(reopened.is_admin());
    }

    #[test]
    fn test_favorites_are_open_to_visitors() {
        let mut shop = open(MemoryStore::new());
        assert!(shop.toggle_favorite(3).unwrap());
        assert_eq!(shop.favorites_count(), 1);
        let favorites = shop.search_products("", CatalogTab::Favorites);
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, 3);
        assert!(matches!(shop.toggle_favorite(99), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_comparison_selection() {
        let mut shop = open(MemoryStore::new());
        shop.compare_add(1).unwrap();
        shop.compare_add(2).unwrap();
        assert!(shop.compare_add(1).is_err());
        assert!(matches!(shop.compare_add(42), Err(Error::NotFound { .. })));
        assert_eq!(shop.comparison_candidates("").len(), 4);
        assert_eq!(shop.comparison_rows()[0].values.len(), 2);

        let mut reopened = open(shop.into_store());
        assert_eq!(reopened.comparison().selected.len(), 2);
        reopened.compare_clear().unwrap();
        assert!(reopened.comparison().selected.is_empty());
    }

    #[test]
    fn test_posts_and_share_urls() {
        let mut shop = admin();
        let post = shop
            .add_post(PostDraft {
                title: "Speakers".to_string(),
                description: "Two portable speakers".to_string(),
                products: vec![
                    PostProduct {
                        title: "JBL Flip".to_string(),
                        ..PostProduct::default()
                    },
                    PostProduct {
                        title: "Marshall Emberton".to_string(),
                        ..PostProduct::default()
                    },
                ],
            })
            .unwrap();
        assert_eq!(post.id, 2);
        assert_eq!(
            shop.post_share_url(post.id).unwrap(),
            "http://localhost:8080/#comparison-post-2"
        );
        assert_eq!(
            shop.article_share_url(1).unwrap(),
            "http://localhost:8080/#article-1"
        );
        assert!(shop.article_share_url(9).is_err());
    }

    #[test]
    fn test_promocode_management() {
        let mut shop = admin();
        let promo = shop
            .add_promocode(PromocodeDraft {
                code: "ALLDAY".to_string(),
                title: "Everywhere".to_string(),
                discount: "5%".to_string(),
                marketplace: PromoScope::All,
                ..PromocodeDraft::default()
            })
            .unwrap();
        assert_eq!(promo.id, 3);
        assert_eq!(shop.redeem("allday").unwrap().id, 3);
        assert_eq!(
            shop.promocodes(Some(Marketplace::Yandex), PromoStatus::All).len(),
            1
        );
        shop.delete_promocode(3).unwrap();
        assert!(shop.redeem("ALLDAY").is_err());
    }

    #[test]
    fn test_engagement_through_storefront() {
        let mut shop = open(MemoryStore::new());
        let fp = shop.visitor_fingerprint(&VisitorTraits::default()).unwrap();
        assert!(shop.like(1, &fp).unwrap());
        assert!(shop.likes(1, Some(&fp)).unwrap().user_liked);

        let comment = shop
            .add_comment(NewComment {
                article_id: 1,
                content: "Helpful, thanks".to_string(),
                visitor_fingerprint: fp.clone(),
                ..NewComment::default()
            })
            .unwrap();
        assert_eq!(comment.author_name, "Anonymous");

        shop.login("admin", "changeme").unwrap();
        shop.delete_comment(comment.id).unwrap();
        assert!(shop.comments(1).unwrap().is_empty());
    }

    #[test]
    fn test_admin_visits_hidden() {
        let mut shop = open(MemoryStore::new());
        let fp = shop.visitor_fingerprint(&VisitorTraits::default()).unwrap();
        assert!(shop.track_visit("/", &fp).unwrap());
        shop.record_view(Section::Catalog).unwrap();

        // same browser, now logged in as admin
        shop.login("admin", "changeme").unwrap();
        assert_eq!(shop.visitor_fingerprint(&VisitorTraits::default()).unwrap(), fp);
        assert!(!shop.track_visit("/", &fp).unwrap());
        assert!(!shop.track_visit("/articles", &fp).unwrap());

        let dashboard = shop.dashboard().unwrap();
        assert_eq!(dashboard.total_unique_visitors, 1);
        assert_eq!(dashboard.pages.len(), 1);
        assert_eq!(dashboard.pages[0].page_path, "/");
        assert_eq!(dashboard.section_views[0], ("catalog", 1));
        assert_eq!(shop.page_stats("/").unwrap().unique_visitors, 1);
    }

    #[test]
    fn test_admin_first_visit_not_counted() {
        let mut shop = admin();
        let fp = shop.visitor_fingerprint(&VisitorTraits::default()).unwrap();
        assert!(!shop.track_visit("/", &fp).unwrap());
        assert_eq!(shop.dashboard().unwrap().total_unique_visitors, 0);

        shop.logout().unwrap();
        assert!(shop.track_visit("/", &fp).unwrap());
    }

    /// Memory store whose writes to one key can be made to fail
    struct FailingStore {
        inner: MemoryStore,
        failing: Rc<Cell<Option<&'static str>>>,
    }

    impl BlobStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if self.failing.get() == Some(key) {
                return Err(StorageError::Backend(format!("write to {key} refused")).into());
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>> {
            self.inner.keys()
        }
    }

    fn failing_shop() -> (Storefront<FailingStore>, Rc<Cell<Option<&'static str>>>) {
        let failing = Rc::new(Cell::new(None));
        let store = FailingStore {
            inner: MemoryStore::new(),
            failing: Rc::clone(&failing),
        };
        let mut shop = Storefront::open_with_seed(store, 1).unwrap();
        shop.login("admin", "changeme").unwrap();
        (shop, failing)
    }

    #[test]
    fn test_failed_write_keeps_memory_unchanged() {
        let (mut shop, failing) = failing_shop();

        failing.set(Some(keys::PRODUCTS));
        assert!(matches!(
            shop.add_product(product_draft("Ghost")),
            Err(Error::Storage(_))
        ));
        assert!(shop.toggle_favorite(1).is_err());
        assert_eq!(shop.products().len(), 6);
        assert!(!shop.product(1).unwrap().is_favorite);

        // the next successful write must not carry the failed add along
        failing.set(None);
        shop.toggle_favorite(1).unwrap();
        let reopened = Storefront::open_with_seed(shop.into_store(), 1).unwrap();
        assert_eq!(reopened.products().len(), 6);
        assert!(reopened.products().iter().all(|p| p.title != "Ghost"));
        assert!(reopened.product(1).unwrap().is_favorite);
    }

    #[test]
    fn test_failed_session_write_keeps_login_state() {
        let (mut shop, failing) = failing_shop();

        failing.set(Some(keys::CURRENT_USER));
        assert!(shop.logout().is_err());
        assert!(shop.is_admin());

        failing.set(Some(keys::COMPARISON));
        assert!(shop.compare_add(1).is_err());
        assert!(shop.comparison().selected.is_empty());
    }

    #[test]
    fn test_user_management() {
        let mut shop = open(MemoryStore::new());
        shop.register("ann@example.com", "secret1", "secret1").unwrap();
        shop.logout().unwrap();
        assert!(shop.store().get(keys::CURRENT_USER).unwrap().is_none());

        shop.login("admin", "changeme").unwrap();
        assert_eq!(shop.list_users().unwrap().len(), 1);
        assert_eq!(shop.toggle_role("ann@example.com").unwrap(), Role::Admin);
        shop.logout().unwrap();

        // promoted users can manage content
        shop.login("ann@example.com", "secret1").unwrap();
        assert!(shop.delete_post(1).is_ok());
        shop.delete_user("ann@example.com").unwrap();
        assert!(shop.current_user().is_none());
    }

    #[test]
    fn test_upload_needs_admin() {
        let mut shop = open(MemoryStore::new());
        let mut media = MemoryMedia::new();
        let request = UploadRequest {
            image: "aGVsbG8=".to_string(),
            filename: Some("cover.png".to_string()),
        };
        assert!(matches!(
            shop.upload_image(&mut media, &request),
            Err(Error::Unauthorized)
        ));

        shop.login("admin", "changeme").unwrap();
        let uploaded = shop.upload_image(&mut media, &request).unwrap();
        assert!(uploaded.url.starts_with("https://cdn.example.com/shopsage/articles/"));
        assert_eq!(media.len(), 1);
    }

    #[test]
    fn test_settings_change_limits_comparison() {
        let mut shop = admin();
        for id in 1..=4 {
            shop.compare_add(id).unwrap();
        }
        let settings = Settings {
            max_compare: 2,
            ..shop.settings().clone()
        };
        shop.update_settings(settings).unwrap();
        assert_eq!(shop.comparison().selected.len(), 2);

        let reopened = open(shop.into_store());
        assert_eq!(reopened.comparison().limit(), 2);
    }
}

//! Browser bindings (wasm32 only)
//!
//! `WebStorefront` wraps a `Storefront` over LocalStorage for the page
//! script. Structured arguments and results travel as JSON strings; errors
//! come back as their display text.

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::analytics::Section;
use crate::articles::ArticleDraft;
use crate::catalog::{CatalogTab, ProductDraft};
use crate::engagement::NewComment;
use crate::marketplace::Marketplace;
use crate::platform::browser::visitor_traits;
use crate::platform::storage::LocalStore;
use crate::posts::PostDraft;
use crate::promocodes::{PromoStatus, PromocodeDraft};
use crate::storefront::Storefront;
use crate::upload::{MemoryMedia, UploadRequest};
use crate::{Error, Result};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("ShopSage starting...");
}

fn js_error(e: Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> std::result::Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error(e.into()))
}

fn from_json<T: DeserializeOwned>(json: &str) -> std::result::Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| js_error(e.into()))
}

fn respond<T: Serialize>(result: Result<T>) -> std::result::Result<String, JsValue> {
    result.map_err(js_error).and_then(|value| to_json(&value))
}

fn section(name: &str) -> std::result::Result<Section, JsValue> {
    Section::from_str(name).ok_or_else(|| JsValue::from_str(&format!("Unknown section '{name}'")))
}

#[wasm_bindgen]
pub struct WebStorefront {
    shop: Storefront<LocalStore>,
    /// Uploaded images live for the page session only
    media: MemoryMedia,
    fingerprint: Option<String>,
}

#[wasm_bindgen]
impl WebStorefront {
    #[wasm_bindgen(constructor)]
    pub fn new() -> std::result::Result<WebStorefront, JsValue> {
        let store = LocalStore::open().map_err(js_error)?;
        let shop = Storefront::open(store).map_err(js_error)?;
        Ok(Self {
            shop,
            media: MemoryMedia::new(),
            fingerprint: None,
        })
    }

    // === Accounts ===

    /// JSON `{ email, role }` or `null`
    #[wasm_bindgen(js_name = currentUser)]
    pub fn current_user(&self) -> std::result::Result<String, JsValue> {
        to_json(&self.shop.current_user())
    }

    #[wasm_bindgen(js_name = isAdmin)]
    pub fn is_admin(&self) -> bool {
        self.shop.is_admin()
    }

    pub fn login(&mut self, email: &str, password: &str) -> std::result::Result<String, JsValue> {
        respond(self.shop.login(email, password))
    }

    pub fn register(
        &mut self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> std::result::Result<String, JsValue> {
        respond(self.shop.register(email, password, confirm))
    }

    pub fn logout(&mut self) -> std::result::Result<(), JsValue> {
        self.shop.logout().map_err(js_error)
    }

    #[wasm_bindgen(js_name = changePassword)]
    pub fn change_password(
        &mut self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> std::result::Result<(), JsValue> {
        self.shop.change_password(current, new, confirm).map_err(js_error)
    }

    pub fn users(&self) -> std::result::Result<String, JsValue> {
        respond(self.shop.list_users())
    }

    #[wasm_bindgen(js_name = toggleRole)]
    pub fn toggle_role(&mut self, email: &str) -> std::result::Result<String, JsValue> {
        self.shop
            .toggle_role(email)
            .map(|role| role.as_str().to_string())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = deleteUser)]
    pub fn delete_user(&mut self, email: &str) -> std::result::Result<(), JsValue> {
        self.shop.delete_user(email).map_err(js_error)
    }

    // === Catalog ===

    /// `tab` is `all` or `favorites`
    pub fn products(&self, query: &str, tab: &str) -> std::result::Result<String, JsValue> {
        let tab = CatalogTab::from_str(tab).unwrap_or_default();
        to_json(&self.shop.search_products(query, tab))
    }

    #[wasm_bindgen(js_name = addProduct)]
    pub fn add_product(&mut self, draft: &str) -> std::result::Result<String, JsValue> {
        let draft: ProductDraft = from_json(draft)?;
        respond(self.shop.add_product(draft))
    }

    #[wasm_bindgen(js_name = updateProduct)]
    pub fn update_product(&mut self, id: u32, draft: &str) -> std::result::Result<String, JsValue> {
        let draft: ProductDraft = from_json(draft)?;
        respond(self.shop.update_product(id, draft))
    }

    #[wasm_bindgen(js_name = deleteProduct)]
    pub fn delete_product(&mut self, id: u32) -> std::result::Result<(), JsValue> {
        self.shop.delete_product(id).map(|_| ()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = toggleFavorite)]
    pub fn toggle_favorite(&mut self, id: u32) -> std::result::Result<bool, JsValue> {
        self.shop.toggle_favorite(id).map_err(js_error)
    }

    // === Comparison ===

    /// JSON `{ selected, rows, limit }`
    pub fn comparison(&self) -> std::result::Result<String, JsValue> {
        let comparison = self.shop.comparison();
        to_json(&serde_json::json!({
            "selected": comparison.selected,
            "rows": self.shop.comparison_rows(),
            "limit": comparison.limit(),
        }))
    }

    #[wasm_bindgen(js_name = compareCandidates)]
    pub fn compare_candidates(&self, query: &str) -> std::result::Result<String, JsValue> {
        to_json(&self.shop.comparison_candidates(query))
    }

    #[wasm_bindgen(js_name = compareAdd)]
    pub fn compare_add(&mut self, id: u32) -> std::result::Result<(), JsValue> {
        self.shop.compare_add(id).map_err(js_error)
    }

    #[wasm_bindgen(js_name = compareRemove)]
    pub fn compare_remove(&mut self, id: u32) -> std::result::Result<(), JsValue> {
        self.shop.compare_remove(id).map(|_| ()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = compareClear)]
    pub fn compare_clear(&mut self) -> std::result::Result<(), JsValue> {
        self.shop.compare_clear().map_err(js_error)
    }

    // === Comparison posts ===

    pub fn posts(&self) -> std::result::Result<String, JsValue> {
        to_json(self.shop.posts())
    }

    #[wasm_bindgen(js_name = addPost)]
    pub fn add_post(&mut self, draft: &str) -> std::result::Result<String, JsValue> {
        let draft: PostDraft = from_json(draft)?;
        respond(self.shop.add_post(draft))
    }

    #[wasm_bindgen(js_name = deletePost)]
    pub fn delete_post(&mut self, id: u32) -> std::result::Result<(), JsValue> {
        self.shop.delete_post(id).map(|_| ()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = postShareUrl)]
    pub fn post_share_url(&self, id: u32) -> std::result::Result<String, JsValue> {
        self.shop.post_share_url(id).map_err(js_error)
    }

    // === Articles ===

    /// All articles, or those carrying `tag` when it is non-empty
    pub fn articles(&self, tag: &str) -> std::result::Result<String, JsValue> {
        if tag.trim().is_empty() {
            to_json(self.shop.articles())
        } else {
            to_json(&self.shop.articles_tagged(tag))
        }
    }

    pub fn article(&self, id: u32) -> std::result::Result<String, JsValue> {
        respond(self.shop.article(id))
    }

    #[wasm_bindgen(js_name = addArticle)]
    pub fn add_article(&mut self, draft: &str) -> std::result::Result<String, JsValue> {
        let draft: ArticleDraft = from_json(draft)?;
        respond(self.shop.add_article(draft))
    }

    #[wasm_bindgen(js_name = updateArticle)]
    pub fn update_article(&mut self, id: u32, draft: &str) -> std::result::Result<String, JsValue> {
        let draft: ArticleDraft = from_json(draft)?;
        respond(self.shop.update_article(id, draft))
    }

    #[wasm_bindgen(js_name = deleteArticle)]
    pub fn delete_article(&mut self, id: u32) -> std::result::Result<(), JsValue> {
        self.shop.delete_article(id).map(|_| ()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = articleShareUrl)]
    pub fn article_share_url(&self, id: u32) -> std::result::Result<String, JsValue> {
        self.shop.article_share_url(id).map_err(js_error)
    }

    // === Promo codes ===

    /// `marketplace` is a marketplace id or `all`; `status` is `all`, `active` or `expired`
    pub fn promocodes(&self, marketplace: &str, status: &str) -> std::result::Result<String, JsValue> {
        let marketplace = Marketplace::from_str(marketplace);
        let status = PromoStatus::from_str(status).unwrap_or_default();
        to_json(&self.shop.promocodes(marketplace, status))
    }

    #[wasm_bindgen(js_name = addPromocode)]
    pub fn add_promocode(&mut self, draft: &str) -> std::result::Result<String, JsValue> {
        let draft: PromocodeDraft = from_json(draft)?;
        respond(self.shop.add_promocode(draft))
    }

    #[wasm_bindgen(js_name = deletePromocode)]
    pub fn delete_promocode(&mut self, id: u32) -> std::result::Result<(), JsValue> {
        self.shop.delete_promocode(id).map(|_| ()).map_err(js_error)
    }

    pub fn redeem(&self, code: &str) -> std::result::Result<String, JsValue> {
        respond(self.shop.redeem(code))
    }

    // === Visitors ===

    /// This browser's fingerprint, computed once per page
    pub fn fingerprint(&mut self) -> std::result::Result<String, JsValue> {
        if let Some(fp) = &self.fingerprint {
            return Ok(fp.clone());
        }
        let fp = self
            .shop
            .visitor_fingerprint(&visitor_traits())
            .map_err(js_error)?;
        self.fingerprint = Some(fp.clone());
        Ok(fp)
    }

    pub fn like(&mut self, article_id: u32) -> std::result::Result<bool, JsValue> {
        let fp = self.fingerprint()?;
        self.shop.like(article_id, &fp).map_err(js_error)
    }

    pub fn unlike(&mut self, article_id: u32) -> std::result::Result<(), JsValue> {
        let fp = self.fingerprint()?;
        self.shop.unlike(article_id, &fp).map_err(js_error)
    }

    pub fn likes(&mut self, article_id: u32) -> std::result::Result<String, JsValue> {
        let fp = self.fingerprint()?;
        respond(self.shop.likes(article_id, Some(&fp)))
    }

    pub fn comments(&mut self, article_id: u32) -> std::result::Result<String, JsValue> {
        respond(self.shop.comments(article_id))
    }

    /// `comment` is a JSON `NewComment`; the fingerprint is filled in here
    #[wasm_bindgen(js_name = addComment)]
    pub fn add_comment(&mut self, comment: &str) -> std::result::Result<String, JsValue> {
        let mut comment: NewComment = from_json(comment)?;
        comment.visitor_fingerprint = self.fingerprint()?;
        respond(self.shop.add_comment(comment))
    }

    #[wasm_bindgen(js_name = deleteComment)]
    pub fn delete_comment(&mut self, id: u32) -> std::result::Result<(), JsValue> {
        self.shop.delete_comment(id).map(|_| ()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = trackVisit)]
    pub fn track_visit(&mut self, page_path: &str) -> std::result::Result<bool, JsValue> {
        let fp = self.fingerprint()?;
        self.shop.track_visit(page_path, &fp).map_err(js_error)
    }

    #[wasm_bindgen(js_name = recordView)]
    pub fn record_view(&mut self, section_name: &str) -> std::result::Result<f64, JsValue> {
        let section = section(section_name)?;
        self.shop
            .record_view(section)
            .map(|views| views as f64)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = pageStats)]
    pub fn page_stats(&mut self, page_path: &str) -> std::result::Result<String, JsValue> {
        respond(self.shop.page_stats(page_path))
    }

    pub fn dashboard(&mut self) -> std::result::Result<String, JsValue> {
        respond(self.shop.dashboard())
    }

    // === Media ===

    /// `request` is JSON `{ image, filename }`; returns `{ url, filename }`
    #[wasm_bindgen(js_name = uploadImage)]
    pub fn upload_image(&mut self, request: &str) -> std::result::Result<String, JsValue> {
        let request: UploadRequest = from_json(request)?;
        respond(self.shop.upload_image(&mut self.media, &request))
    }
}

//! Visitor traits read from the browser (wasm32 only).

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::fingerprint::VisitorTraits;

/// Collect the fingerprint inputs the browser exposes.
///
/// Anything unavailable is left empty/zero rather than failing.
pub fn visitor_traits() -> VisitorTraits {
    let Some(window) = web_sys::window() else {
        return VisitorTraits::default();
    };

    let navigator = window.navigator();
    let (color_depth, screen_width, screen_height) = window
        .screen()
        .map(|s| {
            (
                s.color_depth().unwrap_or(0),
                s.width().unwrap_or(0),
                s.height().unwrap_or(0),
            )
        })
        .unwrap_or((0, 0, 0));

    VisitorTraits {
        user_agent: navigator.user_agent().unwrap_or_default(),
        language: navigator.language().unwrap_or_default(),
        color_depth,
        screen_width,
        screen_height,
        timezone_offset_minutes: js_sys::Date::new_0().get_timezone_offset() as i32,
        canvas_token: canvas_token().unwrap_or_default(),
    }
}

/// Render a fixed string and read back the data URL; differs per GPU/font stack
fn canvas_token() -> Option<String> {
    let document = web_sys::window()?.document()?;
    let canvas: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
    if let Some(ctx) = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
    {
        ctx.set_text_baseline("top");
        ctx.set_font("14px Arial");
        let _ = ctx.fill_text("fingerprint", 2.0, 2.0);
    }
    canvas.to_data_url().ok()
}

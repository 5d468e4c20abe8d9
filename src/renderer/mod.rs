//! Canvas 2D rendering
//!
//! Draws the container in logical coordinates; the canvas transform scales
//! them to the actual backing-store size.

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::catalog::FruitCatalog;
use crate::settings::Settings;
use crate::sim::{Game, PhysicsWorld};

/// Fallback fill per tier while sprites load
const TIER_COLORS: [&str; 11] = [
    "#d81b60", "#e53935", "#8e24aa", "#fb8c00", "#ef6c00", "#c62828", "#c0ca33", "#f8bbd0",
    "#fdd835", "#9ccc65", "#2e7d32",
];

const BACKGROUND: &str = "#fff0f5";
const DANGER_LINE: &str = "#e53935";
const POP_RING: &str = "#ffffff";

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    /// One sprite per tier, same order as the catalog
    sprites: Vec<HtmlImageElement>,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement, catalog: &FruitCatalog) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let mut sprites = Vec::with_capacity(catalog.len());
        for tier in catalog.iter() {
            let img = HtmlImageElement::new()?;
            img.set_src(&tier.asset);
            sprites.push(img);
        }

        Ok(Self {
            canvas,
            ctx,
            sprites,
        })
    }

    /// Render the current frame
    pub fn render<W: PhysicsWorld>(&self, game: &Game<W>, settings: &Settings, time: f64) {
        let config = game.config();
        let ctx = &self.ctx;
        let scale = self.canvas.width() as f64 / config.width as f64;

        ctx.set_global_alpha(1.0);
        let _ = ctx.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0);
        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, config.width as f64, config.height as f64);

        if settings.show_danger_line {
            // Pulses faster as the danger timer runs out
            let danger = game.danger_progress() as f64;
            let pulse = if danger > 0.0 && !settings.reduced_motion {
                0.5 + 0.5 * (time / 1000.0 * (4.0 + danger * 12.0)).sin()
            } else {
                0.0
            };
            ctx.set_global_alpha(0.35 + 0.65 * danger.max(pulse * danger));
            ctx.set_stroke_style_str(DANGER_LINE);
            ctx.set_line_width(2.0);
            ctx.begin_path();
            ctx.move_to(0.0, config.danger_line_y as f64);
            ctx.line_to(config.width as f64, config.danger_line_y as f64);
            ctx.stroke();
            ctx.set_global_alpha(1.0);
        }

        let world = game.world();
        for disc in game.discs().iter() {
            if let Some(pos) = world.position(disc.body) {
                self.draw_fruit(disc.tier, pos.x as f64, pos.y as f64, game.catalog());
            }
        }

        if let Some(ghost) = game.ghost() {
            // Drop guide
            ctx.set_global_alpha(0.25);
            ctx.set_stroke_style_str("#8d6e63");
            ctx.set_line_width(1.0);
            ctx.begin_path();
            ctx.move_to(ghost.x as f64, config.spawn_y as f64);
            ctx.line_to(ghost.x as f64, config.height as f64);
            ctx.stroke();

            ctx.set_global_alpha(0.8);
            self.draw_fruit(ghost.tier, ghost.x as f64, config.spawn_y as f64, game.catalog());
            ctx.set_global_alpha(1.0);
        } else if let Some(progress) = game.cooldown_progress() {
            // Next fruit fades in where it will spawn
            let spawn = config.spawn_point();
            ctx.set_global_alpha(0.3 * progress as f64);
            self.draw_fruit(game.pending_tier(), spawn.x as f64, spawn.y as f64, game.catalog());
            ctx.set_global_alpha(1.0);
        }

        if settings.effective_pop_effects() {
            ctx.set_stroke_style_str(POP_RING);
            for pop in game.pops() {
                let grow = 1.0 + (1.0 - pop.life as f64) * 0.6;
                ctx.set_global_alpha(pop.life as f64);
                ctx.set_line_width(4.0 * pop.life as f64);
                ctx.begin_path();
                let _ = ctx.arc(pop.pos.x as f64, pop.pos.y as f64, pop.radius as f64 * grow, 0.0, TAU);
                ctx.stroke();
            }
            ctx.set_global_alpha(1.0);
        }
    }

    fn draw_fruit(&self, tier: usize, x: f64, y: f64, catalog: &FruitCatalog) {
        let radius = catalog.radius(tier) as f64;
        let ctx = &self.ctx;

        if let Some(img) = self.sprites.get(tier).filter(|img| img.complete() && img.natural_width() > 0) {
            let size = radius * 2.0;
            if ctx
                .draw_image_with_html_image_element_and_dw_and_dh(img, x - radius, y - radius, size, size)
                .is_ok()
            {
                return;
            }
        }

        ctx.set_fill_style_str(TIER_COLORS[tier % TIER_COLORS.len()]);
        ctx.begin_path();
        let _ = ctx.arc(x, y, radius, 0.0, TAU);
        ctx.fill();
    }
}

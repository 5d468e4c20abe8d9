//! DOM HUD
//!
//! Score, best score, next-fruit preview, sound toggle and the game over
//! overlay. Missing elements are skipped so the page layout can vary.

use web_sys::Document;

use crate::catalog::Tier;

pub struct Hud {
    document: Document,
}

impl Hud {
    pub fn new() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(&self, id: &str, hidden: bool) {
        if let Some(el) = self.document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    pub fn set_score(&self, score: u64) {
        self.set_text("score", &score.to_string());
    }

    pub fn set_best(&self, best: Option<u64>) {
        self.set_text("best-score", &best.unwrap_or(0).to_string());
    }

    /// Show the fruit that will be aimed after the current one
    pub fn set_next_fruit(&self, tier: &Tier) {
        if let Some(img) = self.document.get_element_by_id("next-fruit-img") {
            let _ = img.set_attribute("src", &tier.asset);
            let _ = img.set_attribute("alt", &tier.name);
        }
    }

    pub fn set_sound(&self, on: bool) {
        self.set_text("sound-toggle", if on { "Sound: on" } else { "Sound: off" });
    }

    pub fn set_paused(&self, paused: bool) {
        self.set_hidden("paused", !paused);
    }

    /// Overlay with the final score; `rank` is the score board placement
    pub fn show_game_over(&self, score: u64, rank: Option<usize>) {
        self.set_text("final-score", &score.to_string());
        match rank {
            Some(1) => self.set_text("final-rank", "New best!"),
            Some(rank) => self.set_text("final-rank", &format!("#{rank} on the board")),
            None => self.set_text("final-rank", ""),
        }
        self.set_hidden("game-over", false);
    }

    pub fn hide_game_over(&self) {
        self.set_hidden("game-over", true);
    }
}

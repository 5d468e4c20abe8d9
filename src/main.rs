//! Fruit Drop entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent};

    use fruit_drop::audio::{AudioManager, SoundEffect};
    use fruit_drop::consts::*;
    use fruit_drop::renderer::CanvasRenderer;
    use fruit_drop::sim::{Game, GameEvent, GamePhase, RapierWorld, TickInput};
    use fruit_drop::ui::Hud;
    use fruit_drop::{FruitCatalog, GameConfig, HighScores, Settings};

    /// Everything the page keeps alive between frames
    struct App {
        game: Game<RapierWorld>,
        renderer: CanvasRenderer,
        hud: Hud,
        audio: AudioManager,
        settings: Settings,
        highscores: HighScores,
        input: TickInput,
        /// A mouse press began on the canvas and has not been released yet
        pressed: bool,
        /// Paused by the tab being hidden, so showing it again resumes
        auto_paused: bool,
        accumulator: f32,
        last_time: f64,
    }

    impl App {
        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.game.tick(&self.input);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // One-shot inputs are consumed by the first tick
                self.input = TickInput::default();
            }

            self.handle_events();
        }

        fn handle_events(&mut self) {
            for event in self.game.drain_events() {
                if let Some(effect) = SoundEffect::for_event(&event) {
                    self.audio.play(effect);
                }

                match event {
                    GameEvent::Spawned { next, .. } => {
                        if let Some(tier) = self.game.catalog().get(next) {
                            self.hud.set_next_fruit(tier);
                        }
                    }
                    GameEvent::Merged { .. } => self.hud.set_score(self.game.score()),
                    GameEvent::GameOver {
                        score,
                        largest_tier,
                    } => {
                        let rank = self
                            .highscores
                            .record(score, largest_tier, js_sys::Date::now());
                        if rank.is_some() {
                            self.highscores.save();
                            self.hud.set_best(self.highscores.best());
                        }
                        if rank == Some(1) {
                            log::info!("New best score: {}", score);
                            self.audio.play(SoundEffect::HighScore);
                        }
                        self.hud.show_game_over(score, rank);
                    }
                    GameEvent::Restarted => {
                        self.hud.hide_game_over();
                        self.hud.set_score(0);
                    }
                    GameEvent::Dropped { .. } => {}
                }
            }

            self.hud.set_paused(self.game.session().paused);
        }

        fn toggle_sound(&mut self) {
            self.settings.toggle_sound();
            self.settings.save();
            self.audio.set_volume(self.settings.effective_volume());
            self.hud.set_sound(self.settings.sound);
        }
    }

    /// Map a viewport x coordinate onto the container's logical width
    fn container_x(canvas: &HtmlCanvasElement, client_x: i32, width: f32) -> Option<f32> {
        let rect = canvas.get_bounding_client_rect();
        if rect.width() <= 0.0 {
            return None;
        }
        Some(((client_x as f64 - rect.left()) * width as f64 / rect.width()) as f32)
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Fruit Drop starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let config = GameConfig::default();
        let catalog = FruitCatalog::classic();
        config
            .validate(&catalog)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        // Backing store at device resolution, drawn in container units
        let dpr = window.device_pixel_ratio();
        canvas.set_width((config.width as f64 * dpr) as u32);
        canvas.set_height((config.height as f64 * dpr) as u32);

        let renderer = CanvasRenderer::new(canvas.clone(), &catalog)?;
        let hud = Hud::new().ok_or("no document for HUD")?;

        let settings = Settings::load();
        let highscores = HighScores::load();
        let mut audio = AudioManager::new();
        audio.set_volume(settings.effective_volume());

        let seed = js_sys::Date::now() as u64;
        let game = Game::with_rapier(config, catalog, seed);
        log::info!("Game initialized with seed: {}", seed);

        hud.set_score(0);
        hud.set_best(highscores.best());
        hud.set_sound(settings.sound);
        hud.hide_game_over();

        let app = Rc::new(RefCell::new(App {
            game,
            renderer,
            hud,
            audio,
            settings,
            highscores,
            input: TickInput::default(),
            pressed: false,
            auto_paused: false,
            accumulator: 0.0,
            last_time: 0.0,
        }));

        // Preview for the first spawn
        app.borrow_mut().handle_events();

        setup_pointer_input(&canvas, app.clone());
        setup_touch_input(&canvas, app.clone());
        setup_buttons(app.clone());
        setup_keyboard(app.clone());
        setup_auto_pause(app.clone());

        request_animation_frame(app);

        log::info!("Fruit Drop running!");
        Ok(())
    }

    fn setup_pointer_input(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Mouse move - aim
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                let width = a.game.config().width;
                if let Some(x) = container_x(&canvas_clone, event.client_x(), width) {
                    a.input.aim_x = Some(x);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse down - aim at the press point
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                a.pressed = true;
                let width = a.game.config().width;
                if let Some(x) = container_x(&canvas_clone, event.client_x(), width) {
                    a.input.aim_x = Some(x);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse up anywhere ends a press that started on the canvas - drop.
        // Button clicks never start on the canvas, so they don't drop.
        {
            let Some(window) = web_sys::window() else {
                return;
            };
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                if a.pressed {
                    a.pressed = false;
                    a.input.release = true;
                }
            });
            let _ = window
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_touch_input(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        for name in ["touchstart", "touchmove"] {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let mut a = app.borrow_mut();
                    let width = a.game.config().width;
                    if let Some(x) = container_x(&canvas_clone, touch.client_x(), width) {
                        a.input.aim_x = Some(x);
                    }
                }
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end - drop
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                app.borrow_mut().input.release = true;
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().input.restart = true;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        } else {
            log::warn!("#restart-btn missing");
        }

        if let Some(btn) = document.get_element_by_id("resume-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                if a.game.session().paused {
                    a.auto_paused = false;
                    a.input.pause = true;
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        } else {
            log::warn!("#resume-btn missing");
        }

        if let Some(btn) = document.get_element_by_id("sound-toggle") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().toggle_sound();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        } else {
            log::warn!("#sound-toggle missing");
        }
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut a = app.borrow_mut();
            match event.key().as_str() {
                "Escape" | "p" | "P" => {
                    if a.game.phase() != GamePhase::GameOver {
                        a.auto_paused = false;
                        a.input.pause = true;
                    }
                }
                "r" | "R" => a.input.restart = true,
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        // Visibility change (tab switch, minimize)
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut a = app.borrow_mut();
            let playing = !a.game.session().paused && a.game.phase() != GamePhase::GameOver;
            match document_clone.visibility_state() {
                web_sys::VisibilityState::Hidden if playing => {
                    a.input.pause = true;
                    a.auto_paused = true;
                    log::info!("Auto-paused (tab hidden)");
                }
                web_sys::VisibilityState::Visible if a.auto_paused => {
                    a.auto_paused = false;
                    // rAF may not have run while hidden; then the pause is
                    // still queued and withdrawing it is enough
                    a.input.pause = a.game.session().paused;
                    a.last_time = 0.0;
                    log::info!("Resumed (tab visible)");
                }
                _ => {}
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            a.last_time = time;

            a.update(dt);
            a.renderer.render(&a.game, &a.settings, time);
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

/// Headless run: drop a fruit whenever one is ready, sweeping the aim back
/// and forth, until the game ends or the tick limit is hit
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use fruit_drop::sim::{Game, GameEvent, GamePhase, TickInput};
    use fruit_drop::{FruitCatalog, GameConfig};

    env_logger::init();
    log::info!("Fruit Drop (native) starting...");
    log::info!("Browser build: run with `trunk serve`; running a headless game instead");

    const MAX_TICKS: u64 = 60 * 60 * 5;

    let config = GameConfig::default();
    let catalog = FruitCatalog::classic();
    if let Err(e) = config.validate(&catalog) {
        log::error!("Invalid config: {}", e);
        return;
    }

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let (min_x, max_x) = (config.width * 0.2, config.width * 0.8);
    let mut game = Game::with_rapier(config, catalog, seed);
    let mut sweep = 0.0_f32;

    for tick in 0..MAX_TICKS {
        let mut input = TickInput::default();
        if game.ghost().is_some() {
            sweep += 0.37;
            let t = 0.5 + 0.5 * sweep.sin();
            input.aim_x = Some(min_x + (max_x - min_x) * t);
            input.release = true;
        }
        game.tick(&input);

        for event in game.drain_events() {
            match event {
                GameEvent::Merged { into, points, .. } => {
                    let name = game.catalog().get(into).map(|t| t.name.as_str());
                    log::info!("tick {}: {} (+{})", tick, name.unwrap_or("?"), points);
                }
                GameEvent::GameOver { score, largest_tier } => {
                    log::info!("Game over at tick {}: score {}, largest tier {}", tick, score, largest_tier);
                }
                _ => {}
            }
        }

        if game.phase() == GamePhase::GameOver {
            break;
        }
    }

    println!(
        "Final score: {} ({} fruits on the board)",
        game.score(),
        game.discs().len()
    );
}

//! Fixed timestep game controller
//!
//! [`Game`] owns the physics world and every piece of rule state. One call to
//! [`Game::tick`] runs, in order: input, due scheduled tasks, one physics step,
//! merges for that step's contacts, then the game-over scan.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::merge::resolve_merges;
use super::monitor::any_in_danger;
use super::physics::{BodyHandle, PhysicsWorld};
use super::rapier_world::RapierWorld;
use super::scheduler::{Scheduler, Task, TaskToken};
use super::spawn::AimController;
use super::state::{DiscSet, GameEvent, GamePhase, Ghost, PopEffect, Session};
use crate::catalog::FruitCatalog;
use crate::consts::SIM_DT;
use crate::secs_to_ticks;
use crate::tuning::GameConfig;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer x in container coordinates (mouse/touch move or press)
    pub aim_x: Option<f32>,
    /// Drop the aimed fruit (mouse up / touch end)
    pub release: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start over (restart button)
    pub restart: bool,
}

/// The whole game: rules, session and the physics world they drive
pub struct Game<W: PhysicsWorld> {
    config: GameConfig,
    catalog: FruitCatalog,
    world: W,
    walls: Vec<BodyHandle>,
    session: Session,
    aim: AimController,
    discs: DiscSet,
    scheduler: Scheduler,
    /// Drop cooldown currently running, if any
    cooldown: Option<TaskToken>,
    rng: Pcg32,
    pops: Vec<PopEffect>,
    events: Vec<GameEvent>,
}

impl Game<RapierWorld> {
    /// Game on the default rapier2d world
    pub fn with_rapier(config: GameConfig, catalog: FruitCatalog, seed: u64) -> Self {
        let world = RapierWorld::new(config.gravity);
        Self::new(world, config, catalog, seed)
    }
}

impl<W: PhysicsWorld> Game<W> {
    /// Build the container walls and aim the first fruit
    pub fn new(mut world: W, config: GameConfig, catalog: FruitCatalog, seed: u64) -> Self {
        let walls = config
            .walls()
            .iter()
            .map(|(center, half)| world.add_wall(*center, *half))
            .collect();
        let mut rng = Pcg32::seed_from_u64(seed);
        let aim = AimController::new(&mut rng, &config);

        let mut game = Self {
            config,
            catalog,
            world,
            walls,
            session: Session::new(),
            aim,
            discs: DiscSet::new(),
            scheduler: Scheduler::new(),
            cooldown: None,
            rng,
            pops: Vec::new(),
            events: Vec::new(),
        };
        log::info!("New game (seed {})", seed);
        game.spawn_next();
        game
    }

    /// Advance the game by one fixed timestep
    pub fn tick(&mut self, input: &TickInput) {
        if input.restart {
            self.restart();
        }
        if input.pause {
            self.toggle_pause();
        }

        // Don't tick if paused or game over
        if self.session.paused || self.session.game_over {
            return;
        }

        if let Some(x) = input.aim_x {
            self.aim(x);
        }
        // The restart click's own release must not drop the fresh fruit
        if input.release && !input.restart {
            self.release();
        }

        self.session.time_ticks += 1;
        let now = self.session.time_ticks;

        for task in self.scheduler.advance(now) {
            match task {
                Task::SpawnNext => {
                    self.cooldown = None;
                    self.aim.enable();
                    self.spawn_next();
                }
            }
        }

        let pairs = self.world.step(SIM_DT);
        let merges = resolve_merges(
            &mut self.world,
            &self.catalog,
            self.config.material,
            &mut self.discs,
            &pairs,
        );
        for merge in merges {
            self.session.score += merge.points;
            self.session.largest_tier = self.session.largest_tier.max(merge.into);
            self.pops.push(PopEffect {
                pos: merge.pos,
                radius: self.catalog.radius(merge.into),
                life: 1.0,
            });
            self.events.push(GameEvent::Merged {
                from: merge.from,
                into: merge.into,
                pos: merge.pos,
                points: merge.points,
            });
        }

        let in_danger = any_in_danger(&self.world, &self.discs, &self.config);
        let hold = secs_to_ticks(self.config.danger_hold_secs);
        if self.session.danger.observe(now, in_danger, hold) {
            self.end_game();
        }

        let decay = SIM_DT / self.config.pop_lifetime_secs.max(SIM_DT);
        for pop in &mut self.pops {
            pop.life -= decay;
        }
        self.pops.retain(|p| p.life > 0.0);
    }

    /// Follow the pointer with the aimed fruit
    pub fn aim(&mut self, x: f32) {
        if self.session.paused || self.session.game_over {
            return;
        }
        self.aim
            .aim(&mut self.world, &self.config, &self.catalog, x);
    }

    /// Drop the aimed fruit; false if nothing happened
    pub fn release(&mut self) -> bool {
        if self.session.paused || self.session.game_over {
            return false;
        }
        let Some(release) = self
            .aim
            .release(&mut self.world, &self.config, &self.catalog)
        else {
            return false;
        };

        self.discs.insert(release.tier, release.body);
        self.session.largest_tier = self.session.largest_tier.max(release.tier);
        self.cooldown = Some(self.scheduler.schedule(
            self.session.time_ticks,
            secs_to_ticks(self.config.drop_cooldown_secs),
            Task::SpawnNext,
        ));
        self.events.push(GameEvent::Dropped {
            tier: release.tier,
            x: release.x,
        });
        log::debug!("Dropped tier {} at x={:.1}", release.tier, release.x);
        true
    }

    /// Clear the board and start a fresh run
    pub fn restart(&mut self) {
        self.scheduler.cancel_all();
        self.cooldown = None;
        self.aim.clear(&mut self.world);
        for disc in self.discs.take_all() {
            self.world.remove(disc.body);
        }
        self.pops.clear();
        self.session.reset();
        self.events.push(GameEvent::Restarted);
        log::info!("Game restarted");
        self.spawn_next();
    }

    pub fn toggle_pause(&mut self) {
        if self.session.game_over {
            return;
        }
        self.session.paused = !self.session.paused;
        log::info!("Paused: {}", self.session.paused);
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> GamePhase {
        if self.session.game_over {
            GamePhase::GameOver
        } else if self.aim.ghost().is_some() {
            GamePhase::Aiming
        } else {
            GamePhase::Idle
        }
    }

    pub fn score(&self) -> u64 {
        self.session.score
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn ghost(&self) -> Option<&Ghost> {
        self.aim.ghost()
    }

    /// Tier shown in the "next fruit" preview
    pub fn pending_tier(&self) -> usize {
        self.aim.pending_tier()
    }

    pub fn discs(&self) -> &DiscSet {
        &self.discs
    }

    pub fn walls(&self) -> &[BodyHandle] {
        &self.walls
    }

    pub fn pops(&self) -> &[PopEffect] {
        &self.pops
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &FruitCatalog {
        &self.catalog
    }

    /// How close the danger timer is to ending the run (0..=1)
    pub fn danger_progress(&self) -> f32 {
        self.session.danger.progress(
            self.session.time_ticks,
            secs_to_ticks(self.config.danger_hold_secs),
        )
    }

    /// How far the drop cooldown has run (0..1), or None when none is pending
    pub fn cooldown_progress(&self) -> Option<f32> {
        let token = self.cooldown.filter(|t| self.scheduler.is_live(*t))?;
        let total = secs_to_ticks(self.config.drop_cooldown_secs);
        let left = token.due_tick.saturating_sub(self.session.time_ticks);
        Some(1.0 - left as f32 / total as f32)
    }

    /// Idle -> Aiming, unless the run is over
    fn spawn_next(&mut self) {
        if self.session.game_over {
            return;
        }
        if let Some((tier, next)) =
            self.aim
                .spawn(&mut self.world, &self.config, &self.catalog, &mut self.rng)
        {
            self.events.push(GameEvent::Spawned { tier, next });
        }
    }

    fn end_game(&mut self) {
        self.session.game_over = true;
        self.scheduler.cancel_all();
        self.cooldown = None;
        self.events.push(GameEvent::GameOver {
            score: self.session.score,
            largest_tier: self.session.largest_tier,
        });
        log::info!(
            "Game over: score {}, largest tier {}",
            self.session.score,
            self.session.largest_tier
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::fake::FakeWorld;
    use glam::Vec2;

    const SEED: u64 = 12345;

    fn fake_game() -> Game<FakeWorld> {
        Game::new(
            FakeWorld::new(),
            GameConfig::default(),
            FruitCatalog::classic(),
            SEED,
        )
    }

    fn cooldown_ticks() -> u64 {
        secs_to_ticks(GameConfig::default().drop_cooldown_secs)
    }

    fn hold_ticks() -> u64 {
        secs_to_ticks(GameConfig::default().danger_hold_secs)
    }

    /// Release the aimed fruit and park it at a safe height
    fn drop_at(game: &mut Game<FakeWorld>, x: f32) -> BodyHandle {
        game.aim(x);
        assert!(game.release());
        let disc = *game.discs().iter().last().unwrap();
        game.world_mut().set_position(disc.body, Vec2::new(x, 700.0));
        disc.body
    }

    fn run(game: &mut Game<FakeWorld>, ticks: u64) {
        for _ in 0..ticks {
            game.tick(&TickInput::default());
        }
    }

    #[test]
    fn test_starts_aiming_with_walls() {
        let mut game = fake_game();
        assert_eq!(game.phase(), GamePhase::Aiming);
        assert_eq!(game.walls().len(), 3);
        assert_eq!(game.score(), 0);
        let events = game.drain_events();
        assert!(matches!(events.as_slice(), [GameEvent::Spawned { .. }]));
    }

    #[test]
    fn test_cooldown_before_next_spawn() {
        let mut game = fake_game();
        drop_at(&mut game, 300.0);
        assert_eq!(game.phase(), GamePhase::Idle);

        // A second release during the cooldown is ignored
        assert!(!game.release());

        run(&mut game, cooldown_ticks() - 1);
        assert_eq!(game.phase(), GamePhase::Idle);
        assert!(game.ghost().is_none());

        run(&mut game, 1);
        assert_eq!(game.phase(), GamePhase::Aiming);
        assert_eq!(game.world().discs().count(), 2);
    }

    #[test]
    fn test_two_cherries_make_a_strawberry() {
        let config = GameConfig {
            spawnable_tiers: 1,
            ..Default::default()
        };
        let mut game = Game::new(FakeWorld::new(), config, FruitCatalog::classic(), SEED);

        let a = drop_at(&mut game, 300.0);
        run(&mut game, cooldown_ticks());
        let b = drop_at(&mut game, 300.0);
        game.world_mut().set_position(b, Vec2::new(300.0, 670.0));

        game.world_mut().touch(a, b);
        game.tick(&TickInput::default());

        assert_eq!(game.score(), 3);
        assert_eq!(game.discs().len(), 1);
        assert_eq!(game.discs().count_tier(1), 1);
        let merged = *game.discs().iter().next().unwrap();
        assert_eq!(game.world().position(merged.body), Some(Vec2::new(300.0, 685.0)));
        assert_eq!(game.pops().len(), 1);
        assert!(game
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::Merged { from: 0, into: 1, points: 3, .. })));
    }

    #[test]
    fn test_pop_effect_expires() {
        let config = GameConfig {
            spawnable_tiers: 1,
            ..Default::default()
        };
        let lifetime = secs_to_ticks(config.pop_lifetime_secs);
        let mut game = Game::new(FakeWorld::new(), config, FruitCatalog::classic(), SEED);
        let a = drop_at(&mut game, 300.0);
        run(&mut game, cooldown_ticks());
        let b = drop_at(&mut game, 330.0);
        game.world_mut().touch(a, b);
        game.tick(&TickInput::default());
        assert_eq!(game.pops().len(), 1);

        run(&mut game, lifetime);
        assert!(game.pops().is_empty());
    }

    #[test]
    fn test_game_over_after_full_hold() {
        let mut game = fake_game();
        let body = drop_at(&mut game, 300.0);
        game.world_mut().set_position(body, Vec2::new(300.0, 100.0));

        // First danger tick starts the timer; it must be exceeded, not reached
        run(&mut game, hold_ticks() + 1);
        assert_eq!(game.phase(), GamePhase::Aiming);
        assert!(!game.session().game_over);

        run(&mut game, 1);
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert!(game
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { score: 0, .. })));

        // Frozen: no drops, no spawns
        assert!(!game.release());
        let ticks = game.session().time_ticks;
        run(&mut game, 10);
        assert_eq!(game.session().time_ticks, ticks);
    }

    #[test]
    fn test_momentary_dip_does_not_end_game() {
        let mut game = fake_game();
        let body = drop_at(&mut game, 300.0);

        game.world_mut().set_position(body, Vec2::new(300.0, 100.0));
        run(&mut game, hold_ticks() - 10);
        game.world_mut().set_position(body, Vec2::new(300.0, 700.0));
        run(&mut game, 1);
        game.world_mut().set_position(body, Vec2::new(300.0, 100.0));
        run(&mut game, hold_ticks() - 10);

        assert!(!game.session().game_over);
        assert!(game.session().danger.since().is_some());
    }

    #[test]
    fn test_fast_fruit_above_line_is_not_danger() {
        let mut game = fake_game();
        let body = drop_at(&mut game, 300.0);
        game.world_mut().set_position(body, Vec2::new(300.0, 100.0));
        game.world_mut().set_velocity(body, Vec2::new(0.0, 300.0));
        run(&mut game, hold_ticks() * 2);
        assert!(!game.session().game_over);
    }

    #[test]
    fn test_restart_clears_board() {
        let mut game = fake_game();
        let body = drop_at(&mut game, 300.0);
        game.world_mut().set_position(body, Vec2::new(300.0, 100.0));
        run(&mut game, hold_ticks() + 2);
        assert_eq!(game.phase(), GamePhase::GameOver);

        game.tick(&TickInput {
            restart: true,
            ..Default::default()
        });
        assert_eq!(game.score(), 0);
        assert!(game.discs().is_empty());
        assert!(!game.session().game_over);
        assert_eq!(game.phase(), GamePhase::Aiming);
        assert_eq!(game.session().danger.since(), None);
        // Walls plus the fresh aimed fruit
        assert_eq!(game.world().bodies.len(), 4);
    }

    #[test]
    fn test_restart_cancels_pending_spawn() {
        let mut game = fake_game();
        drop_at(&mut game, 300.0);
        run(&mut game, 10);

        game.restart();
        assert_eq!(game.phase(), GamePhase::Aiming);

        // Drop the fresh fruit later than the stale cooldown would have ended
        run(&mut game, 20);
        drop_at(&mut game, 300.0);
        run(&mut game, cooldown_ticks() - 20);
        assert!(game.ghost().is_none(), "stale spawn task fired after restart");

        run(&mut game, 20);
        assert!(game.ghost().is_some());
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut game = fake_game();
        drop_at(&mut game, 300.0);
        game.tick(&TickInput {
            pause: true,
            ..Default::default()
        });
        assert!(game.session().paused);
        let ticks = game.session().time_ticks;
        run(&mut game, cooldown_ticks() * 2);
        assert_eq!(game.session().time_ticks, ticks);
        assert!(game.ghost().is_none());

        game.toggle_pause();
        run(&mut game, cooldown_ticks());
        assert!(game.ghost().is_some());
    }

    #[test]
    fn test_unpause_resumes_ticking() {
        let mut game = fake_game();
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        game.tick(&pause);
        let ticks = game.session().time_ticks;
        run(&mut game, 30);
        assert_eq!(game.session().time_ticks, ticks);

        // Aim and release are ignored while paused
        game.tick(&TickInput {
            release: true,
            ..Default::default()
        });
        assert!(game.discs().is_empty());

        // A second pause input toggles back and the same tick runs
        game.tick(&pause);
        assert!(!game.session().paused);
        assert_eq!(game.session().time_ticks, ticks + 1);
        run(&mut game, 10);
        assert_eq!(game.session().time_ticks, ticks + 11);

        game.tick(&TickInput {
            release: true,
            ..Default::default()
        });
        assert_eq!(game.discs().len(), 1);
    }

    #[test]
    fn test_restart_click_does_not_drop_fresh_fruit() {
        let mut game = fake_game();
        drop_at(&mut game, 300.0);
        run(&mut game, 5);

        game.tick(&TickInput {
            restart: true,
            release: true,
            ..Default::default()
        });
        assert_eq!(game.phase(), GamePhase::Aiming);
        assert!(game.discs().is_empty());
        assert!(game.cooldown_progress().is_none());
    }

    #[test]
    fn test_cooldown_progress_tracks_pending_spawn() {
        let mut game = fake_game();
        assert!(game.cooldown_progress().is_none());

        drop_at(&mut game, 300.0);
        assert_eq!(game.cooldown_progress(), Some(0.0));
        run(&mut game, cooldown_ticks() / 2);
        let half = game.cooldown_progress().unwrap();
        assert!((half - 0.5).abs() < 0.05, "progress {half}");

        run(&mut game, cooldown_ticks());
        assert!(game.ghost().is_some());
        assert!(game.cooldown_progress().is_none());
    }

    #[test]
    fn test_determinism() {
        let mut game1 = fake_game();
        let mut game2 = fake_game();
        for _ in 0..5 {
            drop_at(&mut game1, 150.0);
            drop_at(&mut game2, 150.0);
            run(&mut game1, cooldown_ticks());
            run(&mut game2, cooldown_ticks());
        }
        let tiers1: Vec<usize> = game1.discs().iter().map(|d| d.tier).collect();
        let tiers2: Vec<usize> = game2.discs().iter().map(|d| d.tier).collect();
        assert_eq!(tiers1, tiers2);
        assert_eq!(game1.pending_tier(), game2.pending_tier());
    }

    #[test]
    fn test_rapier_cherries_merge() {
        let config = GameConfig {
            spawnable_tiers: 1,
            ..Default::default()
        };
        let mut game = Game::with_rapier(config, FruitCatalog::classic(), SEED);

        game.aim(300.0);
        assert!(game.release());
        run_rapier(&mut game, cooldown_ticks());
        game.aim(300.0);
        assert!(game.release());
        run_rapier(&mut game, 240);

        assert_eq!(game.score(), 3);
        assert_eq!(game.discs().len(), 1);
        assert_eq!(game.discs().count_tier(1), 1);
        assert_eq!(game.phase(), GamePhase::Aiming);
    }

    #[test]
    fn test_rapier_game_over_when_stacked_high() {
        let config = GameConfig {
            danger_line_y: 790.0,
            danger_hold_secs: 0.5,
            ..Default::default()
        };
        let mut game = Game::with_rapier(config, FruitCatalog::classic(), SEED);

        assert!(game.release());
        run_rapier(&mut game, 300);
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert!(!game.release());
    }

    fn run_rapier(game: &mut Game<RapierWorld>, ticks: u64) {
        for _ in 0..ticks {
            game.tick(&TickInput::default());
        }
    }
}

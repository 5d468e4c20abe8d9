//! Sound effects on the Web Audio API
//!
//! Every effect is a short oscillator envelope built on demand.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Fruit released
    Drop,
    /// Two fruits merged into the given tier (bigger fruit, lower pitch)
    Merge(usize),
    /// Run ended
    GameOver,
    /// Finished run made the score board
    HighScore,
}

impl SoundEffect {
    /// Sound for a game event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Dropped { .. } => Some(SoundEffect::Drop),
            GameEvent::Merged { into, .. } => Some(SoundEffect::Merge(*into)),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            GameEvent::Spawned { .. } | GameEvent::Restarted => None,
        }
    }
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self { ctx, volume: 0.8 }
    }

    /// Set output volume (0.0 - 1.0, 0 mutes)
    pub fn set_volume(&mut self, vol: f32) {
        self.volume = vol.clamp(0.0, 1.0);
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.volume;
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Browsers start suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Drop => self.play_drop(ctx, vol),
            SoundEffect::Merge(tier) => self.play_merge(ctx, vol, tier),
            SoundEffect::GameOver => self.play_game_over(ctx, vol),
            SoundEffect::HighScore => self.play_high_score(ctx, vol),
        }
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Drop - short falling blip
    fn play_drop(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 500.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.25, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.12)
            .ok();
        osc.frequency().set_value_at_time(500.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(250.0, t + 0.12)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Merge - bubbly pop, pitch drops as fruits grow
    fn play_merge(&self, ctx: &AudioContext, vol: f32, tier: usize) {
        let t = ctx.current_time();
        let base = 900.0 / (1.0 + tier as f32 * 0.25);

        if let Some((osc, gain)) = self.create_osc(ctx, base, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.18)
                .ok();
            osc.frequency().set_value_at_time(base * 0.6, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(base * 1.5, t + 0.06)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.2).ok();
        }

        // Low thump for the big fruits
        if tier >= 6 {
            if let Some((osc, gain)) = self.create_osc(ctx, 70.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.4, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.3).ok();
            }
        }
    }

    /// Game over - slow minor fall with a soft sawtooth edge
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        let notes = [523.25, 415.3, 349.23, 261.63];
        for (i, freq) in notes.into_iter().enumerate() {
            let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Sawtooth) else {
                continue;
            };
            let t = ctx.current_time() + i as f64 * 0.18;
            let hold = if i == notes.len() - 1 { 0.6 } else { 0.2 };
            gain.gain().set_value_at_time(0.0001, t).ok();
            gain.gain().linear_ramp_to_value_at_time(vol * 0.15, t + 0.02).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + hold)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + hold + 0.05).ok();
        }
    }

    /// High score - bright chord after the game over jingle
    fn play_high_score(&self, ctx: &AudioContext, vol: f32) {
        let start = ctx.current_time() + 1.0;
        for (i, freq) in [659.25_f32, 783.99, 1046.5].into_iter().enumerate() {
            let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Square) else {
                continue;
            };
            let t = start + i as f64 * 0.06;
            gain.gain().set_value_at_time(vol * 0.08, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, start + 0.7)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(start + 0.75).ok();
        }
    }
}

//! Delayed tasks on the simulation clock
//!
//! Every task remembers the generation it was scheduled under. Bumping the
//! generation (restart, game over) makes all outstanding tasks stale, so a
//! cooldown that was running when the board was reset can never fire into the
//! new session.

/// Work the game controller defers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Re-enable actions and aim the next fruit
    SpawnNext,
}

/// Identifies one scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskToken {
    pub generation: u64,
    pub due_tick: u64,
}

#[derive(Debug, Clone)]
struct Scheduled {
    token: TaskToken,
    task: Task,
}

/// Tick-based task queue with generation invalidation
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    generation: u64,
    pending: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run `task` once `now + after_ticks` is reached
    pub fn schedule(&mut self, now: u64, after_ticks: u64, task: Task) -> TaskToken {
        let token = TaskToken {
            generation: self.generation,
            due_tick: now + after_ticks,
        };
        self.pending.push(Scheduled { token, task });
        token
    }

    /// Invalidate everything scheduled so far
    pub fn cancel_all(&mut self) {
        self.generation += 1;
        self.pending.clear();
    }

    /// Whether a task from `token` can still fire
    pub fn is_live(&self, token: TaskToken) -> bool {
        token.generation == self.generation
            && self.pending.iter().any(|s| s.token == token)
    }

    /// Remove and return every live task due at or before `now`, in due order
    pub fn advance(&mut self, now: u64) -> Vec<Task> {
        let generation = self.generation;
        let mut due: Vec<Scheduled> = Vec::new();
        self.pending.retain(|s| {
            if s.token.generation != generation {
                return false;
            }
            if s.token.due_tick <= now {
                due.push(s.clone());
                return false;
            }
            true
        });
        due.sort_by_key(|s| s.token.due_tick);
        due.into_iter().map(|s| s.task).collect()
    }
}

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    PlayerStep,
    PursuerStep(usize),
    PursuerRelease(usize),
    VulnerabilityExpiry(usize),
    LevelUp,
    GameOverReset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired {
    pub key: TimerKey,
    pub at_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    due_ms: u64,
    seq: u64,
    key: TimerKey,
    generation: u64,
    period_ms: Option<u64>,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; earliest (due, seq) must surface first.
        (other.due_ms, other.seq).cmp(&(self.due_ms, self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Virtual-clock timer queue with per-key generations.
///
/// Scheduling or cancelling a key bumps its generation, so any entry still
/// queued under an older generation is dropped when it surfaces.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    seq: u64,
    next_generation: u64,
    live: BTreeMap<TimerKey, u64>,
    queue: BinaryHeap<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn is_active(&self, key: TimerKey) -> bool {
        self.live.contains_key(&key)
    }

    pub fn schedule_once(&mut self, key: TimerKey, delay_ms: u64) {
        self.push(key, delay_ms, None);
    }

    pub fn schedule_every(&mut self, key: TimerKey, period_ms: u64) {
        let period_ms = period_ms.max(1);
        self.push(key, period_ms, Some(period_ms));
    }

    pub fn cancel(&mut self, key: TimerKey) {
        self.live.remove(&key);
    }

    pub fn cancel_where(&mut self, mut predicate: impl FnMut(TimerKey) -> bool) {
        self.live.retain(|key, _| !predicate(*key));
    }

    pub fn cancel_all(&mut self) {
        self.live.clear();
        self.queue.clear();
    }

    pub fn next_due_ms(&mut self) -> Option<u64> {
        self.discard_stale();
        self.queue.peek().map(|entry| entry.due_ms)
    }

    /// Pops the earliest live timer due at or before `until_ms` and moves the
    /// clock to its due time. Periodic timers are re-armed before returning so
    /// the caller may cancel or replace them while handling the tick.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fired> {
        self.discard_stale();
        let due_ms = self.queue.peek()?.due_ms;
        if due_ms > until_ms {
            return None;
        }
        let entry = self.queue.pop()?;
        self.now_ms = self.now_ms.max(entry.due_ms);
        match entry.period_ms {
            Some(period_ms) => {
                self.seq += 1;
                self.queue.push(Entry {
                    due_ms: entry.due_ms.saturating_add(period_ms),
                    seq: self.seq,
                    ..entry.clone()
                });
            }
            None => {
                self.live.remove(&entry.key);
            }
        }
        Some(Fired {
            key: entry.key,
            at_ms: entry.due_ms,
        })
    }

    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn push(&mut self, key: TimerKey, delay_ms: u64, period_ms: Option<u64>) {
        self.next_generation += 1;
        self.seq += 1;
        let generation = self.next_generation;
        self.live.insert(key, generation);
        self.queue.push(Entry {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.seq,
            key,
            generation,
            period_ms,
        });
    }

    fn discard_stale(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.live.get(&entry.key) == Some(&entry.generation) {
                return;
            }
            self.queue.pop();
        }
    }
}

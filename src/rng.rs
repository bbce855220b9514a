pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        ((self.next_f64() * len as f64).floor() as usize).min(len - 1)
    }
}

#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }
}

impl RandomSource for SeededRng {
    fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6d2b79f5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        out as f64 / 4_294_967_296.0
    }
}

#[cfg(test)]
pub(crate) struct ScriptedRng {
    rolls: std::collections::VecDeque<f64>,
}

#[cfg(test)]
impl ScriptedRng {
    pub(crate) fn new(rolls: &[f64]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(0.99)
    }
}

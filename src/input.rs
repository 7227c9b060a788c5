use macroquad::math::{Vec2, vec2};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Attack,
    Ability,
    Restart,
}

/// Snapshot of the actions held during one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionSet {
    active: HashSet<Action>,
}

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: Action) {
        self.active.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.active.remove(&action);
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn contains(&self, action: Action) -> bool {
        self.active.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// True when anything other than `Restart` is held.
    pub fn has_gameplay_input(&self) -> bool {
        self.active.iter().any(|a| *a != Action::Restart)
    }

    /// Union of two sources, e.g. keyboard and a touch pad.
    pub fn merge(&self, other: &ActionSet) -> ActionSet {
        ActionSet {
            active: self.active.union(&other.active).copied().collect(),
        }
    }

    /// Raw movement intent, each axis in -1..=1 (not normalized).
    pub fn movement(&self) -> Vec2 {
        let mut dir = vec2(0.0, 0.0);
        if self.contains(Action::MoveLeft) {
            dir.x -= 1.0;
        }
        if self.contains(Action::MoveRight) {
            dir.x += 1.0;
        }
        if self.contains(Action::MoveUp) {
            dir.y -= 1.0;
        }
        if self.contains(Action::MoveDown) {
            dir.y += 1.0;
        }
        dir
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            active: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[Action; N]> for ActionSet {
    fn from(actions: [Action; N]) -> Self {
        actions.into_iter().collect()
    }
}

use alloc::vec::Vec;

use slotmap::SecondaryMap;

use crate::tree::NodeId;

/// Easing curves mapping linear progress `t` in `0.0..=1.0` to eased progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    Linear,
    SmoothStep,
    #[default]
    EaseInOutCubic,
    EaseOutCubic,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - (u * u * u) / 2.0
                }
            }
            Self::EaseOutCubic => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ExpandAnimation {
    opening: bool,
    from: f32,
    start_ms: u64,
    duration_ms: u64,
    easing: Easing,
}

impl ExpandAnimation {
    fn target(&self) -> f32 {
        if self.opening { 1.0 } else { 0.0 }
    }

    fn ratio(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        let t = (elapsed as f32 / self.duration_ms as f32).clamp(0.0, 1.0);
        let eased = self.easing.sample(t);
        let target = self.target();
        (self.from + (target - self.from) * eased).clamp(0.0, 1.0)
    }

    fn is_done(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= self.duration_ms
    }
}

/// Groups touched by one [`ExpandAnimator::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationFrame {
    /// Live groups with their ratio at the tick time.
    pub updated: Vec<(NodeId, f32)>,
    /// Groups whose animation reached its target on this tick.
    pub finished: Vec<NodeId>,
}

impl AnimationFrame {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty()
    }
}

/// Time-based expand/collapse animations, one record per group.
///
/// The ratio is the visible share of a group body: `1.0` fully expanded, `0.0` collapsed.
#[derive(Clone, Debug, Default)]
pub struct ExpandAnimator {
    records: SecondaryMap<NodeId, ExpandAnimation>,
}

impl ExpandAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts animating `group` towards open or closed.
    ///
    /// A running animation is replaced and its current ratio becomes the new start, so reversing
    /// mid-way does not jump. `current` is used when the group is not animating.
    pub fn start(
        &mut self,
        group: NodeId,
        opening: bool,
        current: f32,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) {
        let from = self.ratio(group, now_ms).unwrap_or(current);
        self.records.insert(
            group,
            ExpandAnimation {
                opening,
                from,
                start_ms: now_ms,
                duration_ms: duration_ms.max(1),
                easing,
            },
        );
        gtrace!(opening, from, duration_ms, "expand animation started");
    }

    pub fn ratio(&self, group: NodeId, now_ms: u64) -> Option<f32> {
        self.records.get(group).map(|a| a.ratio(now_ms))
    }

    pub fn is_animating(&self, group: NodeId) -> bool {
        self.records.contains_key(group)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn cancel(&mut self, group: NodeId) -> bool {
        self.records.remove(group).is_some()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Samples every animation at `now_ms`. Records of groups for which `is_alive` is false are
    /// dropped without being reported; finished records are reported once and dropped.
    pub fn tick(&mut self, now_ms: u64, is_alive: impl Fn(NodeId) -> bool) -> AnimationFrame {
        let mut frame = AnimationFrame::default();
        let groups: Vec<NodeId> = self.records.keys().collect();
        for group in groups {
            if !is_alive(group) {
                self.records.remove(group);
                gdebug!("dropping expand animation of a removed group");
                continue;
            }
            let Some(anim) = self.records.get(group).copied() else {
                continue;
            };
            if anim.is_done(now_ms) {
                self.records.remove(group);
                frame.updated.push((group, anim.target()));
                frame.finished.push(group);
            } else {
                frame.updated.push((group, anim.ratio(now_ms)));
            }
        }
        frame
    }
}

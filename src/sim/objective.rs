/// Objective tracker: exit line and flag capture.
///
/// Every level has an exit line; the green carries a flag as well.
///
/// ## Flag rules (multiplayer)
///
/// A player is *near* when `|x - flag.x| < near_radius`.
///   - Unowned flag: the first near player (by slot order) claims it.
///   - Owner near, nobody else near: progress += dt; reaching
///     `progress_max` captures the flag.
///   - Owner near with company: contested, progress frozen.
///   - Owner away, or no owner: progress -= dt. At zero the owner is
///     released.
///
/// With a single player the flag is a finish marker: coming within
/// `solo_radius` captures it at once.

use glam::Vec2;

use crate::config::FlagTuning;
use super::event::GameEvent;

#[derive(Clone, Debug, PartialEq)]
pub struct Flag {
    pub position: Vec2,
    pub owner: Option<usize>,
    pub progress: f32,
    pub progress_max: f32,
    pub contested: bool,
}

impl Flag {
    pub fn new(t: &FlagTuning) -> Self {
        Flag {
            position: Vec2::new(t.x, t.y),
            owner: None,
            progress: 0.0,
            progress_max: t.progress_max.max(0.0),
            contested: false,
        }
    }

    fn decay(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.progress -= dt;
        if self.progress <= 0.0 {
            self.progress = 0.0;
            if self.owner.take().is_some() {
                events.push(GameEvent::FlagReleased);
            }
        }
    }
}

/// A contender as the tracker sees it: slot and horizontal position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contender {
    pub slot: usize,
    pub x: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Objective {
    /// Crossing this x (to the right) wins the level.
    pub win_x: f32,
    pub flag: Option<Flag>,
}

impl Objective {
    pub fn exit(win_x: f32) -> Self {
        Objective { win_x, flag: None }
    }

    pub fn with_flag(win_x: f32, flag: Flag) -> Self {
        Objective { win_x, flag: Some(flag) }
    }

    pub fn crossed_exit(&self, x: f32) -> bool {
        x > self.win_x
    }

    /// Advance the flag. Returns the capturing slot once the flag is won.
    pub fn evaluate_flag(
        &mut self,
        contenders: &[Contender],
        multiplayer: bool,
        t: &FlagTuning,
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) -> Option<usize> {
        let flag = self.flag.as_mut()?;

        if !multiplayer {
            let c = contenders.first()?;
            if (c.x - flag.position.x).abs() < t.solo_radius {
                flag.owner = Some(c.slot);
                flag.progress = flag.progress_max;
                events.push(GameEvent::FlagCaptured { slot: c.slot });
                return Some(c.slot);
            }
            return None;
        }

        let was_contested = flag.contested;
        flag.contested = false;

        let mut near = 0;
        let mut owner_near = false;
        for c in contenders {
            if (c.x - flag.position.x).abs() >= t.near_radius {
                continue;
            }
            near += 1;
            match flag.owner {
                None => {
                    flag.owner = Some(c.slot);
                    owner_near = true;
                    events.push(GameEvent::FlagClaimed { slot: c.slot });
                }
                Some(owner) if owner == c.slot => owner_near = true,
                Some(_) => {}
            }
        }

        match flag.owner {
            Some(owner) if owner_near => {
                if near > 1 {
                    flag.contested = true;
                    if !was_contested {
                        events.push(GameEvent::FlagContested { owner });
                    }
                } else {
                    flag.progress = (flag.progress + dt).min(flag.progress_max);
                    if flag.progress >= flag.progress_max {
                        events.push(GameEvent::FlagCaptured { slot: owner });
                        return Some(owner);
                    }
                }
            }
            _ => flag.decay(dt, events),
        }
        None
    }
}

use serde::{Deserialize, Serialize};

use crate::tile::Tile;

/// Width of the action mask.
pub const ACTION_SPACE: usize = 23;

/// Discard slots address the id-sorted hand, 14 tiles at most.
pub const DISCARD_SLOTS: u8 = 14;
pub const PON: u8 = 14;
pub const CHI: u8 = 15;
pub const ANKAN: u8 = 16;
pub const DAIMINKAN: u8 = 17;
pub const KAKAN: u8 = 18;
pub const RIICHI: u8 = 19;
pub const RON: u8 = 20;
pub const TSUMO: u8 = 21;
pub const PASS: u8 = 22;

/// Whose decision is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// The acting player holds a drawn tile.
    SelfTurn,
    /// Another player just discarded `tile`.
    Response { discarder: u8, tile: Tile },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Index into the id-sorted hand.
    Discard(u8),
    Pon,
    Chi,
    Ankan,
    Daiminkan,
    Kakan,
    Riichi,
    Ron,
    Tsumo,
    Pass,
}

impl ActionKind {
    pub const fn index(self) -> u8 {
        match self {
            ActionKind::Discard(i) => i,
            ActionKind::Pon => PON,
            ActionKind::Chi => CHI,
            ActionKind::Ankan => ANKAN,
            ActionKind::Daiminkan => DAIMINKAN,
            ActionKind::Kakan => KAKAN,
            ActionKind::Riichi => RIICHI,
            ActionKind::Ron => RON,
            ActionKind::Tsumo => TSUMO,
            ActionKind::Pass => PASS,
        }
    }

    pub const fn from_index(index: u8) -> Option<Self> {
        let kind = match index {
            0..DISCARD_SLOTS => ActionKind::Discard(index),
            PON => ActionKind::Pon,
            CHI => ActionKind::Chi,
            ANKAN => ActionKind::Ankan,
            DAIMINKAN => ActionKind::Daiminkan,
            KAKAN => ActionKind::Kakan,
            RIICHI => ActionKind::Riichi,
            RON => ActionKind::Ron,
            TSUMO => ActionKind::Tsumo,
            PASS => ActionKind::Pass,
            _ => return None,
        };
        Some(kind)
    }

    #[inline]
    pub const fn is_discard(self) -> bool {
        matches!(self, ActionKind::Discard(_))
    }

    /// Calls and wins; the slots that make `Pass` meaningful.
    #[inline]
    pub const fn is_call_or_win(self) -> bool {
        matches!(
            self,
            ActionKind::Pon
                | ActionKind::Chi
                | ActionKind::Ankan
                | ActionKind::Daiminkan
                | ActionKind::Kakan
                | ActionKind::Riichi
                | ActionKind::Ron
                | ActionKind::Tsumo
        )
    }
}

/// Boolean legality mask over the action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMask([bool; ACTION_SPACE]);

impl ActionMask {
    pub const fn empty() -> Self {
        Self([false; ACTION_SPACE])
    }

    #[inline]
    pub fn set(&mut self, action: ActionKind, legal: bool) {
        self.0[action.index() as usize] = legal;
    }

    #[inline]
    pub fn is_legal(&self, action: ActionKind) -> bool {
        self.0[action.index() as usize]
    }

    pub fn as_slice(&self) -> &[bool; ACTION_SPACE] {
        &self.0
    }

    /// Legal actions in index order.
    pub fn legal_actions(&self) -> Vec<ActionKind> {
        (0..ACTION_SPACE as u8)
            .filter(|&i| self.0[i as usize])
            .filter_map(ActionKind::from_index)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn any_call_or_win(&self) -> bool {
        self.legal_actions().into_iter().any(ActionKind::is_call_or_win)
    }

    /// Discard slots only.
    pub fn discards_only(&self) -> Self {
        let mut mask = Self::empty();
        mask.0[..DISCARD_SLOTS as usize].copy_from_slice(&self.0[..DISCARD_SLOTS as usize]);
        mask
    }
}

impl Default for ActionMask {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_round_trip_over_the_whole_space() {
        for i in 0..ACTION_SPACE as u8 {
            let kind = ActionKind::from_index(i).unwrap();
            assert_eq!(kind.index(), i);
        }
        assert_eq!(ActionKind::from_index(ACTION_SPACE as u8), None);
    }

    #[test]
    fn slot_layout() {
        assert_eq!(ActionKind::from_index(13), Some(ActionKind::Discard(13)));
        assert_eq!(ActionKind::Pon.index(), 14);
        assert_eq!(ActionKind::Pass.index(), 22);
        assert!(ActionKind::Ron.is_call_or_win());
        assert!(!ActionKind::Pass.is_call_or_win());
        assert!(!ActionKind::Discard(0).is_call_or_win());
    }

    #[test]
    fn mask_lists_legal_actions() {
        let mut mask = ActionMask::empty();
        assert!(mask.is_empty());
        mask.set(ActionKind::Discard(3), true);
        mask.set(ActionKind::Tsumo, true);
        mask.set(ActionKind::Pass, true);
        assert_eq!(
            mask.legal_actions(),
            vec![ActionKind::Discard(3), ActionKind::Tsumo, ActionKind::Pass]
        );
        assert!(mask.any_call_or_win());
        let discards = mask.discards_only();
        assert_eq!(discards.legal_actions(), vec![ActionKind::Discard(3)]);
        assert!(!discards.any_call_or_win());
    }
}

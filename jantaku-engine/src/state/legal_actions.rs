use crate::action::{ActionKind, ActionMask, Phase, DISCARD_SLOTS};
use crate::hand_evaluator::HandEvaluator;
use crate::state::player::Player;
use crate::state::Table;
use crate::types::HandVector;

/// Legality masks over the action space. Every offered action is one the
/// table accepts when executed with the matching arguments.
pub trait TableLegalActions {
    fn legal_actions(&self, player: u8, phase: &Phase, evaluator: &HandEvaluator) -> ActionMask;

    /// Discards that leave a hand some tile completes, for the discard
    /// following a riichi declaration.
    fn riichi_discards(&self, player: u8, evaluator: &HandEvaluator) -> ActionMask;
}

impl TableLegalActions for Table {
    fn legal_actions(&self, player: u8, phase: &Phase, evaluator: &HandEvaluator) -> ActionMask {
        let Ok(p) = self.player(player) else {
            return ActionMask::empty();
        };
        let mut mask = match *phase {
            Phase::SelfTurn => self_turn_mask(self, p, evaluator),
            Phase::Response { discarder, tile } => {
                if discarder == player {
                    return ActionMask::empty();
                }
                let mut mask = ActionMask::empty();
                let won = p
                    .hand_vector()
                    .with_added(tile.code())
                    .is_some_and(|hand| evaluator.is_agari(&hand));
                mask.set(ActionKind::Ron, won);
                if !p.is_riichi() {
                    mask.set(ActionKind::Pon, p.can_pon(&tile));
                    mask.set(
                        ActionKind::Chi,
                        self.next_seat(discarder).is_ok_and(|s| s == player) && p.can_chi(&tile),
                    );
                    mask.set(
                        ActionKind::Daiminkan,
                        self.wall().can_kong() && p.can_daiminkan(&tile),
                    );
                }
                mask
            }
        };
        if mask.any_call_or_win() {
            mask.set(ActionKind::Pass, true);
        }
        mask
    }

    fn riichi_discards(&self, player: u8, evaluator: &HandEvaluator) -> ActionMask {
        let mut mask = ActionMask::empty();
        let Ok(p) = self.player(player) else {
            return mask;
        };
        let sorted = p.sorted_hand();
        for (index, tile) in sorted.iter().enumerate().take(DISCARD_SLOTS as usize) {
            let rest = HandVector::from_tiles(sorted.iter().filter(|t| t.id() != tile.id()));
            if !evaluator.winning_codes(&rest).is_empty() {
                mask.set(ActionKind::Discard(index as u8), true);
            }
        }
        mask
    }
}

fn self_turn_mask(table: &Table, p: &Player, evaluator: &HandEvaluator) -> ActionMask {
    let mut mask = ActionMask::empty();
    let hand = p.hand_vector();
    let holding_draw = p.hand().len() % 3 == 2;
    if !holding_draw {
        return mask;
    }
    mask.set(ActionKind::Tsumo, evaluator.is_agari(&hand));

    let sorted = p.sorted_hand();
    if p.is_riichi() {
        // Riichi locks the hand: only the drawn tile may go.
        if let Some(index) = p
            .drawn_tile()
            .and_then(|drawn| sorted.iter().position(|t| t.id() == drawn.id()))
        {
            mask.set(ActionKind::Discard(index as u8), true);
        }
        return mask;
    }

    for index in 0..sorted.len().min(DISCARD_SLOTS as usize) {
        mask.set(ActionKind::Discard(index as u8), true);
    }
    let can_kong = table.wall().can_kong();
    mask.set(ActionKind::Ankan, can_kong && p.can_ankan());
    mask.set(ActionKind::Kakan, can_kong && p.can_kakan());
    // A wait must exist: seven pairs counted with a triplet rates tenpai
    // without any tile that completes it.
    mask.set(
        ActionKind::Riichi,
        p.can_riichi()
            && !table.is_wall_exhausted()
            && evaluator.shanten_minimum(&hand) <= 0
            && !table.riichi_discards(p.id(), evaluator).is_empty(),
    );
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_tiles;
    use crate::state::game_mode::TableConfig;
    use crate::state::wall::TileWall;
    use crate::testing::shared_evaluator;
    use crate::tile::{Tile, TileCatalog};

    /// Dealt table where the host (player 0) holds `hand` and its first
    /// draw is `draw`. Everything else follows in id order.
    fn table_with(hand: &str, draw: &str) -> Table {
        let catalog = TileCatalog::new(true);
        let chosen = parse_tiles(&format!("{}{}", hand, draw), &catalog).unwrap();
        let (front, drawn) = chosen.split_at(13);
        let rest: Vec<Tile> = catalog
            .all()
            .iter()
            .copied()
            .filter(|t| !chosen.contains(t))
            .collect();
        let mut tiles = front.to_vec();
        tiles.extend_from_slice(&rest[..39]);
        tiles.extend_from_slice(drawn);
        tiles.extend_from_slice(&rest[39..]);
        let wall = TileWall::from_tiles(tiles).unwrap();
        let mut table = Table::with_wall(TableConfig::default(), wall).unwrap();
        table.deal_starting_hand();
        table
    }

    #[test]
    fn self_turn_offers_discards_and_tsumo() {
        let evaluator = shared_evaluator();
        let mut table = table_with("123456789m11p23s", "4s");
        assert!(table.legal_actions(0, &Phase::SelfTurn, &evaluator).is_empty());

        table.draw(0).unwrap();
        let mask = table.legal_actions(0, &Phase::SelfTurn, &evaluator);
        for i in 0..14 {
            assert!(mask.is_legal(ActionKind::Discard(i)));
        }
        assert!(mask.is_legal(ActionKind::Tsumo));
        assert!(mask.is_legal(ActionKind::Riichi));
        assert!(mask.is_legal(ActionKind::Pass));
        assert!(!mask.is_legal(ActionKind::Ankan));
    }

    #[test]
    fn riichi_restricts_discards_to_the_drawn_tile() {
        let evaluator = shared_evaluator();
        let mut table = table_with("123456789m11p23s", "9s");
        let nine_s = table.draw(0).unwrap();
        let mask = table.legal_actions(0, &Phase::SelfTurn, &evaluator);
        assert!(mask.is_legal(ActionKind::Riichi));
        assert!(!mask.is_legal(ActionKind::Tsumo));
        table.declare_riichi(0, &nine_s).unwrap();

        let drawn = table.draw(0).unwrap();
        let mask = table.legal_actions(0, &Phase::SelfTurn, &evaluator);
        let discards: Vec<ActionKind> = mask
            .legal_actions()
            .into_iter()
            .filter(|a| a.is_discard())
            .collect();
        assert_eq!(discards.len(), 1);
        let ActionKind::Discard(index) = discards[0] else {
            unreachable!()
        };
        assert_eq!(table.players()[0].sorted_hand()[index as usize], drawn);
        assert!(!mask.is_legal(ActionKind::Ankan));
        assert!(!mask.is_legal(ActionKind::Riichi));
    }

    #[test]
    fn response_offers_ron_and_calls() {
        let evaluator = shared_evaluator();
        // Host waits on 1s and 4s.
        let table = table_with("123456789m11p23s", "1z");
        let four_s = table
            .catalog()
            .copies_of(21)
            .unwrap()
            .iter()
            .copied()
            .find(|t| table.holder(t.id()).is_none())
            .unwrap();
        let phase = Phase::Response {
            discarder: 3,
            tile: four_s,
        };
        let mask = table.legal_actions(0, &phase, &evaluator);
        assert!(mask.is_legal(ActionKind::Ron));
        assert!(mask.is_legal(ActionKind::Chi));
        assert!(mask.is_legal(ActionKind::Pass));
        assert!(!mask.is_legal(ActionKind::Pon));

        // Player 1 does not sit after player 3.
        let mask = table.legal_actions(1, &phase, &evaluator);
        assert!(!mask.is_legal(ActionKind::Chi));
        assert!(table.legal_actions(3, &phase, &evaluator).is_empty());
    }

    #[test]
    fn nothing_to_offer_means_no_pass() {
        let evaluator = shared_evaluator();
        let table = table_with("147m147p147s1234z", "5z");
        let green = table.catalog().copies_of(32).unwrap()[0];
        let phase = Phase::Response {
            discarder: 1,
            tile: green,
        };
        assert!(table.legal_actions(0, &phase, &evaluator).is_empty());
    }

    #[test]
    fn riichi_discards_keep_tenpai() {
        let evaluator = shared_evaluator();
        let mut table = table_with("123456789m11p23s", "9s");
        table.draw(0).unwrap();
        let mask = table.riichi_discards(0, &evaluator);
        let sorted = table.players()[0].sorted_hand();
        let nine = sorted.iter().position(|t| t.code() == 26).unwrap();
        assert!(mask.is_legal(ActionKind::Discard(nine as u8)));
        // Breaking the 11p pair loses tenpai.
        let pin = sorted.iter().position(|t| t.code() == 9).unwrap();
        assert!(!mask.is_legal(ActionKind::Discard(pin as u8)));
    }

    #[test]
    fn riichi_needs_a_real_wait() {
        let evaluator = shared_evaluator();
        // Dropping East leaves six "pairs" including the 1m triplet:
        // rated tenpai, but no tile completes it.
        let mut table = table_with("111m55m99p22s66s77z", "1z");
        table.draw(0).unwrap();
        let mask = table.riichi_discards(0, &evaluator);
        let sorted = table.players()[0].sorted_hand();
        let east = sorted.iter().position(|t| t.code() == 27).unwrap();
        assert!(!mask.is_legal(ActionKind::Discard(east as u8)));
        // Dropping a 1m leaves a real seven-pairs wait on East.
        assert!(mask.is_legal(ActionKind::Discard(0)));
        assert!(table
            .legal_actions(0, &Phase::SelfTurn, &evaluator)
            .is_legal(ActionKind::Riichi));
    }

    #[test]
    fn no_riichi_without_any_wait() {
        let evaluator = shared_evaluator();
        // Seven-pairs tenpai by count, yet every discard keeps a triplet
        // among the pairs or breaks one.
        let mut table = table_with("111m555m99p22s66s7z", "7z");
        table.draw(0).unwrap();
        let hand = table.players()[0].hand_vector();
        assert_eq!(evaluator.shanten_minimum(&hand), 0);
        assert!(table.riichi_discards(0, &evaluator).is_empty());
        assert!(!table
            .legal_actions(0, &Phase::SelfTurn, &evaluator)
            .is_legal(ActionKind::Riichi));
    }
}

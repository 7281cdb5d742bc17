//! Compact hand notation: `123m456p0s77z`.
//!
//! Ranks precede their suit letter, `0` is the red five and `z` ranks 1-7
//! are the honors E S W N P F C. Whitespace is ignored. Each parsed tile
//! takes a distinct physical copy, so the same code can appear at most four
//! times.

use crate::errors::{EngineError, EngineResult};
use crate::tile::{Suit, Tile, TileCatalog, COPIES_PER_CODE, NUM_CODES, RED_FIVE_IDS};

/// Hands out unused copies of each code.
struct CopyPool {
    used: [[bool; COPIES_PER_CODE as usize]; NUM_CODES],
}

impl CopyPool {
    fn new() -> Self {
        Self {
            used: [[false; COPIES_PER_CODE as usize]; NUM_CODES],
        }
    }

    fn take(&mut self, code: u8, red: bool) -> Result<u8, String> {
        let red_copy = RED_FIVE_IDS
            .iter()
            .find(|&&id| id / COPIES_PER_CODE == code)
            .map(|&id| (id % COPIES_PER_CODE) as usize);
        let order: Vec<usize> = match (red_copy, red) {
            (Some(copy), true) => vec![copy],
            (None, true) => return Err(format!("code {} has no red copy", code)),
            // Plain fives use the red copy only once the others are gone.
            (Some(copy), false) => (0..COPIES_PER_CODE as usize)
                .filter(|&i| i != copy)
                .chain(std::iter::once(copy))
                .collect(),
            (None, false) => (0..COPIES_PER_CODE as usize).collect(),
        };
        let copy = order
            .into_iter()
            .find(|&i| !self.used[code as usize][i])
            .ok_or_else(|| format!("no more copies of {}", crate::tile::code_name(code)))?;
        self.used[code as usize][copy] = true;
        Ok(code * COPIES_PER_CODE + copy as u8)
    }
}

fn suit_of_letter(c: char) -> Option<Suit> {
    match c {
        'm' => Some(Suit::Manzu),
        'p' => Some(Suit::Pinzu),
        's' => Some(Suit::Souzu),
        'z' => Some(Suit::Honor),
        _ => None,
    }
}

/// Parses a hand, resolving tiles through `catalog`.
pub fn parse_tiles(text: &str, catalog: &TileCatalog) -> EngineResult<Vec<Tile>> {
    let parse_err = |message: String| EngineError::Parse {
        input: text.to_string(),
        message,
    };
    let mut pool = CopyPool::new();
    let mut tiles = Vec::new();
    let mut pending: Vec<u8> = Vec::new();

    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        if let Some(rank) = c.to_digit(10) {
            pending.push(rank as u8);
            continue;
        }
        let suit = suit_of_letter(c).ok_or_else(|| parse_err(format!("unexpected '{}'", c)))?;
        if pending.is_empty() {
            return Err(parse_err(format!("suit '{}' without ranks", c)));
        }
        for &rank in &pending {
            let (rank, red) = match (rank, suit) {
                (0, Suit::Honor) => return Err(parse_err("honors have no red copy".to_string())),
                (0, _) => (5, true),
                (r, s) if r > s.ranks() => {
                    return Err(parse_err(format!("rank {} out of range for '{}'", r, c)))
                }
                (r, _) => (r, false),
            };
            let code = suit.start() + rank - 1;
            let id = pool.take(code, red).map_err(&parse_err)?;
            tiles.push(catalog.get(id)?);
        }
        pending.clear();
    }

    if !pending.is_empty() {
        return Err(parse_err("ranks without a suit letter".to_string()));
    }
    Ok(tiles)
}

/// Parses exactly one tile.
pub fn parse_tile(text: &str, catalog: &TileCatalog) -> EngineResult<Tile> {
    let tiles = parse_tiles(text, catalog)?;
    match tiles.as_slice() {
        [tile] => Ok(*tile),
        _ => Err(EngineError::Parse {
            input: text.to_string(),
            message: format!("expected exactly one tile, found {}", tiles.len()),
        }),
    }
}

/// Formats tiles back into notation, grouped by suit in code order.
pub fn format_tiles(tiles: &[Tile]) -> String {
    let mut sorted: Vec<&Tile> = tiles.iter().collect();
    sorted.sort_by_key(|t| (t.code(), t.id()));
    let mut out = String::new();
    for suit in Suit::ALL {
        let ranks: String = sorted
            .iter()
            .filter(|t| t.suit() == suit)
            .map(|t| if t.is_red() { '0' } else { char::from(b'0' + t.rank()) })
            .collect();
        if !ranks.is_empty() {
            out.push_str(&ranks);
            out.push(suit.letter());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_suit() {
        let catalog = TileCatalog::new(false);
        let tiles = parse_tiles("19m 19p 19s 1234567z", &catalog).unwrap();
        let codes: Vec<u8> = tiles.iter().map(|t| t.code()).collect();
        assert_eq!(codes, vec![0, 8, 9, 17, 18, 26, 27, 28, 29, 30, 31, 32, 33]);
    }

    #[test]
    fn repeated_codes_get_distinct_copies() {
        let catalog = TileCatalog::new(false);
        let tiles = parse_tiles("1111m", &catalog).unwrap();
        let ids: Vec<u8> = tiles.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!(parse_tiles("11111m", &catalog).is_err());
    }

    #[test]
    fn zero_is_the_red_five() {
        let catalog = TileCatalog::new(true);
        let tiles = parse_tiles("05m", &catalog).unwrap();
        assert!(tiles[0].is_red());
        assert_eq!(tiles[0].id(), 19);
        assert!(!tiles[1].is_red());
        assert_eq!(tiles[1].code(), 4);
    }

    #[test]
    fn plain_fives_avoid_the_red_copy() {
        let catalog = TileCatalog::new(true);
        let tiles = parse_tiles("555p", &catalog).unwrap();
        assert!(tiles.iter().all(|t| !t.is_red()));
    }

    #[test]
    fn rejects_malformed_notation() {
        let catalog = TileCatalog::new(true);
        for bad in ["123", "8z", "0z", "m", "12x", "99q"] {
            assert!(
                matches!(parse_tiles(bad, &catalog), Err(EngineError::Parse { .. })),
                "{bad} should fail to parse"
            );
        }
    }

    #[test]
    fn parse_tile_requires_one_tile() {
        let catalog = TileCatalog::new(true);
        assert_eq!(parse_tile("7s", &catalog).unwrap().code(), 24);
        assert!(parse_tile("78s", &catalog).is_err());
    }

    #[test]
    fn format_round_trips_notation() {
        let catalog = TileCatalog::new(true);
        let tiles = parse_tiles("0m123p77z", &catalog).unwrap();
        assert_eq!(format_tiles(&tiles), "0m123p77z");
    }
}

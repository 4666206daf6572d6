//! Offset hex coordinates.
//!
//! Tiles are addressed by column `x` and row `y`. Columns alternate their
//! vertical offset by parity: odd columns reach one row up to their side
//! neighbours, even columns one row down. Range queries convert to axial
//! coordinates, where hex distance is a closed formula, and back.

use crate::types::TilePos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Axial {
    q: i64,
    r: i64,
}

impl Axial {
    const DIRECTIONS: [Axial; 6] = [
        Axial { q: 1, r: 0 },
        Axial { q: 1, r: -1 },
        Axial { q: 0, r: -1 },
        Axial { q: -1, r: 0 },
        Axial { q: -1, r: 1 },
        Axial { q: 0, r: 1 },
    ];

    fn from_offset(pos: TilePos) -> Self {
        // (x + parity) is always even, so the division is exact for negatives too
        let x = i64::from(pos.x);
        Axial {
            q: x,
            r: i64::from(pos.y) - (x + (x & 1)) / 2,
        }
    }

    /// Coordinates past the `i32` range are pinned to its edge.
    fn to_offset(self) -> TilePos {
        let y = self.r + (self.q + (self.q & 1)) / 2;
        TilePos::new(clamp_i32(self.q), clamp_i32(y))
    }

    fn step(self, dir: Axial, times: i64) -> Axial {
        Axial {
            q: self.q + dir.q * times,
            r: self.r + dir.r * times,
        }
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// The six radius-1 neighbours of a tile, clockwise from north.
pub fn offset_neighbors(pos: TilePos) -> [TilePos; 6] {
    let TilePos { x, y } = pos;
    let parity = x.rem_euclid(2);
    [
        TilePos::new(x, y - 1),
        TilePos::new(x + 1, y - parity),
        TilePos::new(x + 1, y + 1 - parity),
        TilePos::new(x, y + 1),
        TilePos::new(x - 1, y - parity),
        TilePos::new(x - 1, y + 1 - parity),
    ]
}

/// Number of steps between two tiles.
pub fn distance(a: TilePos, b: TilePos) -> u32 {
    let a = Axial::from_offset(a);
    let b = Axial::from_offset(b);
    let dq = a.q - b.q;
    let dr = a.r - b.r;
    let steps = (dq.abs() + dr.abs() + (dq + dr).abs()) / 2;
    u32::try_from(steps).unwrap_or(u32::MAX)
}

pub fn are_adjacent(a: TilePos, b: TilePos) -> bool {
    distance(a, b) == 1
}

/// Positions exactly `radius` steps away. Radius 0 is the center itself.
pub fn ring(center: TilePos, radius: u32) -> Vec<TilePos> {
    if radius == 0 {
        return vec![center];
    }
    let k = i64::from(radius);
    let mut out = Vec::with_capacity(6 * radius as usize);
    let mut hex = Axial::from_offset(center).step(Axial::DIRECTIONS[4], k);
    for dir in Axial::DIRECTIONS {
        for _ in 0..k {
            out.push(hex.to_offset());
            hex = hex.step(dir, 1);
        }
    }
    out
}

/// Every position within `radius` steps, ring by ring starting at the center.
pub fn within(center: TilePos, radius: u32) -> Vec<TilePos> {
    (0..=radius).flat_map(|k| ring(center, k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_column_neighbors() {
        let got = offset_neighbors(TilePos::new(4, 4));
        let expected = [
            TilePos::new(4, 3),
            TilePos::new(5, 4),
            TilePos::new(5, 5),
            TilePos::new(4, 5),
            TilePos::new(3, 4),
            TilePos::new(3, 5),
        ];
        assert_eq!(got, expected);
    }

    #[test]
    fn test_odd_column_neighbors() {
        let got = offset_neighbors(TilePos::new(5, 5));
        let expected = [
            TilePos::new(5, 4),
            TilePos::new(6, 4),
            TilePos::new(6, 5),
            TilePos::new(5, 6),
            TilePos::new(4, 4),
            TilePos::new(4, 5),
        ];
        assert_eq!(got, expected);
    }

    #[test]
    fn test_neighbors_are_at_distance_one() {
        for x in -3..4 {
            for y in -3..4 {
                let pos = TilePos::new(x, y);
                for n in offset_neighbors(pos) {
                    assert_eq!(distance(pos, n), 1, "{pos} -> {n}");
                }
            }
        }
    }

    #[test]
    fn test_axial_round_trip() {
        for x in -5..6 {
            for y in -5..6 {
                let pos = TilePos::new(x, y);
                assert_eq!(Axial::from_offset(pos).to_offset(), pos);
            }
        }
    }

    #[test]
    fn test_ring_sizes() {
        let center = TilePos::new(10, 10);
        assert_eq!(ring(center, 0), vec![center]);
        assert_eq!(ring(center, 1).len(), 6);
        assert_eq!(ring(center, 3).len(), 18);
        for pos in ring(center, 3) {
            assert_eq!(distance(center, pos), 3);
        }
    }

    #[test]
    fn test_ring_one_matches_offset_neighbors() {
        let center = TilePos::new(7, 2);
        let mut from_ring = ring(center, 1);
        let mut from_offsets = offset_neighbors(center).to_vec();
        from_ring.sort();
        from_offsets.sort();
        assert_eq!(from_ring, from_offsets);
    }

    #[test]
    fn test_within_counts() {
        // 1 + 6 + 12 = 19
        assert_eq!(within(TilePos::new(0, 0), 2).len(), 19);
        assert_eq!(within(TilePos::new(3, 3), 0), vec![TilePos::new(3, 3)]);
    }

    #[test]
    fn test_distance_at_coordinate_extremes() {
        let far = distance(TilePos::new(i32::MIN, i32::MIN), TilePos::new(i32::MAX, i32::MAX));
        assert_eq!(far, u32::MAX);
        assert_eq!(distance(TilePos::new(i32::MAX, 0), TilePos::new(i32::MAX, 0)), 0);
        assert_eq!(ring(TilePos::new(i32::MAX, i32::MAX), 1).len(), 6);
    }
}

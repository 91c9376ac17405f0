//! Turns a tagged way into an ordered cross-section of lanes, dividers, and
//! edges, with widths and lateral offsets at both ends of the way.

mod changes;
mod lanes;
mod placement;
mod turns;
mod width;

pub use changes::Change;
pub use lanes::LaneCounts;
pub use placement::{Placement, PlacementAnchor};
pub use turns::Turn;

use anyhow::Result;
use geom::Distance;
use laneutil::Tags;
use serde::{Deserialize, Serialize};

use crate::{tags, DrivingSide, MapConfig, PieceDirection};

/// Index of a piece in its cross-section's arena.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PieceID(pub usize);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum LaneKind {
    Driving,
    Bus,
    Bicycle,
}

/// How a divider is drawn, derived from the change rules of the two lanes
/// flanking it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DividerKind {
    /// Both sides may cross.
    Dashed,
    /// Only the left side may cross.
    DashedSolid,
    /// Only the right side may cross.
    SolidDashed,
    /// Neither side may cross.
    DoubleSolid,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PieceKind {
    Lane(LaneKind),
    Divider(DividerKind),
    Edge,
}

/// One lateral slice of a road: a lane, a divider between lanes, or the
/// painted line at the road's edge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceID,
    pub kind: PieceKind,
    pub dir: PieceDirection,
    /// Position within its direction, 0-based, increasing outward from the
    /// center of the road.
    pub pos: usize,
    /// The laterally adjacent pieces. Edges have nothing beyond them.
    pub left: Option<PieceID>,
    pub right: Option<PieceID>,
    width_start: Distance,
    width_end: Distance,
    /// Lateral offset of the piece's center from the way's centerline,
    /// positive towards the right of the forward direction.
    pub offset_start: Distance,
    pub offset_end: Distance,
    /// Permitted turns, for lanes tagged with them.
    pub turns: Vec<Turn>,
    /// The lane's tagged change rule.
    pub change: Change,
    /// A pending user edit to the change rule, not yet serialized back to
    /// tags.
    pub change_override: Option<Change>,
}

impl Piece {
    pub fn width(&self, at_start: bool) -> Distance {
        if at_start {
            self.width_start
        } else {
            self.width_end
        }
    }

    /// The width linearly interpolated at a fraction along the way.
    pub fn width_at(&self, fraction: f64) -> Distance {
        self.width_start + (self.width_end - self.width_start) * fraction
    }

    pub fn offset_at(&self, fraction: f64) -> Distance {
        self.offset_start + (self.offset_end - self.offset_start) * fraction
    }

    pub fn is_lane(&self) -> bool {
        matches!(self.kind, PieceKind::Lane(_))
    }

    pub fn is_divider(&self) -> bool {
        matches!(self.kind, PieceKind::Divider(_))
    }

    pub fn is_edge(&self) -> bool {
        self.kind == PieceKind::Edge
    }

    /// The change rule in effect, preferring a pending edit.
    pub fn effective_change(&self) -> Change {
        self.change_override.unwrap_or(self.change)
    }

    /// May traffic in this lane cross towards the given side of the
    /// cross-section? The tagged rule is in the lane's own travel frame, so
    /// backward lanes flip.
    fn may_cross(&self, towards_order_right: bool) -> bool {
        let change = self.effective_change();
        let towards_travel_right = if self.dir == PieceDirection::Back {
            !towards_order_right
        } else {
            towards_order_right
        };
        if towards_travel_right {
            change.may_change_right()
        } else {
            change.may_change_left()
        }
    }
}

/// The full lateral layout of one way: all pieces in order, plus where the
/// way's node line sits within them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrossSection {
    pieces: Vec<Piece>,
    /// Piece ids in lateral order, the left road edge first. Left and right
    /// are relative to the way's forward direction.
    order: Vec<PieceID>,
    pub counts: LaneCounts,
    pub driving_side: DrivingSide,
    pub placement_start: Option<Placement>,
    pub placement_end: Option<Placement>,
    /// Offset from the way's centerline to the left edge of the whole
    /// cross-section, per end.
    pub left_edge_start: Distance,
    pub left_edge_end: Distance,
}

impl CrossSection {
    /// Builds the whole cross-section from tags. Any structural contradiction
    /// fails the build; the caller records the way as invalid and renders it
    /// as a bare corridor.
    pub fn build(way_tags: &Tags, cfg: &MapConfig) -> Result<CrossSection> {
        let oneway = tags::is_oneway(way_tags);
        let counts = LaneCounts::resolve(way_tags, oneway)?;
        let side = tags::driving_side(way_tags, cfg);

        let mut cs = instantiate(way_tags, counts, side, oneway);
        width::distribute_widths(&mut cs, way_tags, oneway);

        let (placement_start, placement_end) = placement::parse(way_tags);
        cs.placement_start = placement_start;
        cs.placement_end = placement_end;
        cs.left_edge_start = placement::left_edge_offset(&cs, placement_start, true);
        cs.left_edge_end = placement::left_edge_offset(&cs, placement_end, false);
        cs.assign_offsets();
        Ok(cs)
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.order.iter().map(move |id| &self.pieces[id.0])
    }

    pub fn piece(&self, id: PieceID) -> &Piece {
        &self.pieces[id.0]
    }

    pub fn piece_mut(&mut self, id: PieceID) -> &mut Piece {
        &mut self.pieces[id.0]
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// All lane pieces of one direction, innermost first.
    pub fn lanes(&self, dir: PieceDirection) -> Vec<&Piece> {
        let mut result: Vec<&Piece> = self
            .pieces
            .iter()
            .filter(|p| p.is_lane() && p.dir == dir)
            .collect();
        result.sort_by_key(|p| p.pos);
        result
    }

    /// The lane at a signed directed index: +n is the nth forward lane
    /// counting outward from the center, -n the nth backward lane, 0 the
    /// shared center lane.
    pub fn lane_by_index(&self, idx: i64) -> Option<&Piece> {
        if idx == 0 {
            return self
                .pieces
                .iter()
                .find(|p| p.is_lane() && p.dir == PieceDirection::Both);
        }
        let dir = if idx > 0 {
            PieceDirection::Fwd
        } else {
            PieceDirection::Back
        };
        let pos = (idx.abs() - 1) as usize;
        self.pieces
            .iter()
            .find(|p| p.is_lane() && p.dir == dir && p.pos == pos)
    }

    pub fn total_width(&self, at_start: bool) -> Distance {
        self.pieces.iter().map(|p| p.width(at_start)).sum()
    }

    /// Re-derives the divider styles, after an edit changed a lane's rules.
    pub fn reclassify_dividers(&mut self) {
        classify_dividers(self);
    }

    /// Walks outward from the left edge, accumulating widths, to give every
    /// piece its offset from the way's centerline at both ends.
    fn assign_offsets(&mut self) {
        for at_start in [true, false] {
            let mut x = if at_start {
                self.left_edge_start
            } else {
                self.left_edge_end
            };
            for id in self.order.clone() {
                let piece = &mut self.pieces[id.0];
                let w = piece.width(at_start);
                if at_start {
                    piece.offset_start = x + w / 2.0;
                } else {
                    piece.offset_end = x + w / 2.0;
                }
                x += w;
            }
        }
    }
}

/// Creates all the pieces in lateral order and links them up. Widths and
/// offsets are filled in afterwards.
fn instantiate(
    way_tags: &Tags,
    counts: LaneCounts,
    side: DrivingSide,
    oneway: bool,
) -> CrossSection {
    let mut cs = CrossSection {
        pieces: Vec::new(),
        order: Vec::new(),
        counts,
        driving_side: side,
        placement_start: None,
        placement_end: None,
        left_edge_start: Distance::ZERO,
        left_edge_end: Distance::ZERO,
    };

    // Each direction's chain, innermost piece first: N lanes with N-1
    // dividers between them.
    let mut fwd_chain = direction_chain(way_tags, PieceDirection::Fwd, counts.fwd, oneway);
    let mut back_chain = direction_chain(way_tags, PieceDirection::Back, counts.back, oneway);

    // The center: a shared lane when tagged both_ways, otherwise a painted
    // line separating the directions.
    let center = if counts.both_ways > 0 {
        direction_chain(way_tags, PieceDirection::Both, 1, oneway).pop()
    } else if counts.fwd > 0 && counts.back > 0 {
        Some(ProtoPiece {
            kind: PieceKind::Divider(DividerKind::Dashed),
            dir: PieceDirection::Both,
            pos: 0,
            turns: Vec::new(),
            change: Change::DEFAULT,
        })
    } else {
        None
    };

    // Assemble left to right. Right-hand traffic puts the backward side on
    // the left, outermost lane first; left-hand traffic mirrors.
    let mut ltr: Vec<ProtoPiece> = Vec::new();
    ltr.push(ProtoPiece {
        kind: PieceKind::Edge,
        dir: PieceDirection::Both,
        pos: 0,
        turns: Vec::new(),
        change: Change::DEFAULT,
    });
    match side {
        DrivingSide::Right => {
            back_chain.reverse();
            ltr.extend(back_chain);
            ltr.extend(center);
            ltr.extend(fwd_chain);
        }
        DrivingSide::Left => {
            fwd_chain.reverse();
            ltr.extend(fwd_chain);
            ltr.extend(center);
            ltr.extend(back_chain);
        }
    }
    ltr.push(ProtoPiece {
        kind: PieceKind::Edge,
        dir: PieceDirection::Both,
        pos: 0,
        turns: Vec::new(),
        change: Change::DEFAULT,
    });

    for proto in ltr {
        let id = PieceID(cs.pieces.len());
        cs.pieces.push(Piece {
            id,
            kind: proto.kind,
            dir: proto.dir,
            pos: proto.pos,
            left: None,
            right: None,
            width_start: Distance::ZERO,
            width_end: Distance::ZERO,
            offset_start: Distance::ZERO,
            offset_end: Distance::ZERO,
            turns: proto.turns,
            change: proto.change,
            change_override: None,
        });
        cs.order.push(id);
    }

    // Doubly link laterally
    for idx in 0..cs.order.len() {
        if idx > 0 {
            cs.pieces[cs.order[idx].0].left = Some(cs.order[idx - 1]);
        }
        if idx + 1 < cs.order.len() {
            cs.pieces[cs.order[idx].0].right = Some(cs.order[idx + 1]);
        }
    }

    classify_dividers(&mut cs);
    cs
}

struct ProtoPiece {
    kind: PieceKind,
    dir: PieceDirection,
    pos: usize,
    turns: Vec<Turn>,
    change: Change,
}

/// One direction's lanes and internal dividers, innermost first.
fn direction_chain(
    way_tags: &Tags,
    dir: PieceDirection,
    num_lanes: usize,
    oneway: bool,
) -> Vec<ProtoPiece> {
    let mut turns = turns::parse_turn_lanes(way_tags, dir, num_lanes, oneway).into_iter();
    let mut changes = changes::parse_changes(way_tags, dir, num_lanes, oneway).into_iter();

    let mut result = Vec::new();
    for pos in 0..num_lanes {
        if pos > 0 {
            result.push(ProtoPiece {
                kind: PieceKind::Divider(DividerKind::Dashed),
                dir,
                pos: pos - 1,
                turns: Vec::new(),
                change: Change::DEFAULT,
            });
        }
        let kind = lanes::lane_kind(way_tags, dir, pos, oneway);
        result.push(ProtoPiece {
            kind: PieceKind::Lane(kind),
            dir,
            pos,
            turns: turns.next().unwrap_or_default(),
            change: changes.next().unwrap_or(Change::DEFAULT),
        });
    }
    result
}

/// Redraws every divider according to the change rules of the lanes flanking
/// it.
fn classify_dividers(cs: &mut CrossSection) {
    for idx in 0..cs.order.len() {
        let id = cs.order[idx];
        if !cs.pieces[id.0].is_divider() {
            continue;
        }
        // The nearest lanes on each side; edges and other dividers never
        // intervene between two lanes, so these are the immediate neighbors.
        let left_lane = idx
            .checked_sub(1)
            .map(|i| &cs.pieces[cs.order[i].0])
            .filter(|p| p.is_lane());
        let right_lane = cs
            .order
            .get(idx + 1)
            .map(|i| &cs.pieces[i.0])
            .filter(|p| p.is_lane());

        let left_may = left_lane.map(|p| p.may_cross(true)).unwrap_or(false);
        let right_may = right_lane.map(|p| p.may_cross(false)).unwrap_or(false);
        let kind = match (left_may, right_may) {
            (true, true) => DividerKind::Dashed,
            (true, false) => DividerKind::DashedSolid,
            (false, true) => DividerKind::SolidDashed,
            (false, false) => DividerKind::DoubleSolid,
        };
        cs.pieces[id.0].kind = PieceKind::Divider(kind);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn build(pairs: Vec<(&str, &str)>) -> CrossSection {
        let mut map = BTreeMap::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        CrossSection::build(
            &Tags::new(map),
            &MapConfig::default_for_side(DrivingSide::Right),
        )
        .unwrap()
    }

    #[test]
    fn typical_two_way_road() {
        let cs = build(vec![
            ("highway", "primary"),
            ("lanes", "4"),
            ("lanes:forward", "2"),
            ("lanes:backward", "2"),
            ("width", "14"),
        ]);

        assert_eq!(cs.lanes(PieceDirection::Fwd).len(), 2);
        assert_eq!(cs.lanes(PieceDirection::Back).len(), 2);
        let kinds: Vec<PieceKind> = cs.pieces().map(|p| p.kind).collect();
        // edge, 2 backward lanes with a divider, center line, 2 forward lanes
        // with a divider, edge
        assert_eq!(kinds.len(), 9);
        assert_eq!(kinds[0], PieceKind::Edge);
        assert_eq!(kinds[8], PieceKind::Edge);
        assert!(cs.pieces().filter(|p| p.is_divider()).count() == 3);

        // 14m minus the 0.5m center line, split across 4 lanes
        for lane in cs.pieces().filter(|p| p.is_lane()) {
            assert_eq!(lane.width(true), Distance::meters(3.375));
            assert_eq!(lane.width(false), Distance::meters(3.375));
        }

        // The default placement is the midpoint, so offsets are symmetric
        assert_eq!(cs.left_edge_start, Distance::meters(-7.0));
        let center = cs.pieces().find(|p| p.dir == PieceDirection::Both && p.is_divider()).unwrap();
        assert_eq!(center.offset_start, Distance::ZERO);
        let innermost_fwd = cs.lane_by_index(1).unwrap();
        assert_eq!(
            innermost_fwd.offset_start,
            Distance::meters(0.25 + 3.375 / 2.0)
        );
        let innermost_back = cs.lane_by_index(-1).unwrap();
        assert_eq!(innermost_back.offset_start, -innermost_fwd.offset_start);
    }

    #[test]
    fn lateral_order_flips_with_handedness() {
        let mut map = BTreeMap::new();
        map.insert("lanes".to_string(), "2".to_string());
        let tags = Tags::new(map);

        let rht =
            CrossSection::build(&tags, &MapConfig::default_for_side(DrivingSide::Right)).unwrap();
        let lht =
            CrossSection::build(&tags, &MapConfig::default_for_side(DrivingSide::Left)).unwrap();

        let rht_dirs: Vec<PieceDirection> =
            rht.pieces().filter(|p| p.is_lane()).map(|p| p.dir).collect();
        let lht_dirs: Vec<PieceDirection> =
            lht.pieces().filter(|p| p.is_lane()).map(|p| p.dir).collect();
        assert_eq!(rht_dirs, vec![PieceDirection::Back, PieceDirection::Fwd]);
        assert_eq!(lht_dirs, vec![PieceDirection::Fwd, PieceDirection::Back]);
    }

    #[test]
    fn links_form_a_chain() {
        let cs = build(vec![("lanes", "3"), ("lanes:forward", "2")]);
        let pieces: Vec<&Piece> = cs.pieces().collect();
        assert!(pieces[0].left.is_none());
        assert!(pieces.last().unwrap().right.is_none());
        for pair in pieces.windows(2) {
            assert_eq!(pair[0].right, Some(pair[1].id));
            assert_eq!(pair[1].left, Some(pair[0].id));
        }
    }

    #[test]
    fn center_lane_when_tagged_both_ways() {
        let cs = build(vec![
            ("lanes", "3"),
            ("lanes:forward", "1"),
            ("lanes:backward", "1"),
            ("lanes:both_ways", "1"),
        ]);
        let center = cs.lane_by_index(0).unwrap();
        assert!(center.is_lane());
        assert_eq!(center.dir, PieceDirection::Both);
    }

    #[test]
    fn dividers_follow_change_rules() {
        let cs = build(vec![
            ("oneway", "yes"),
            ("lanes", "3"),
            ("change:lanes", "not_left|not_left|not_left"),
        ]);
        let dividers: Vec<&Piece> = cs.pieces().filter(|p| p.is_divider()).collect();
        assert_eq!(dividers.len(), 2);
        for d in dividers {
            // The left lane may move right, the right lane may not move left
            assert_eq!(d.kind, PieceKind::Divider(DividerKind::DashedSolid));
        }
    }

    #[test]
    fn placement_shifts_the_anchor() {
        // The node line runs along the right edge of the first forward lane
        let cs = build(vec![
            ("lanes", "2"),
            ("width", "7"),
            ("placement", "right_of:1"),
        ]);
        // Lanes are 3.25m each after the center line's 0.5m. The anchor sits
        // at the outer edge of the forward lane, so everything is to its left.
        assert_eq!(
            cs.left_edge_start,
            Distance::meters(-(3.25 + 0.5 + 3.25))
        );
        let fwd = cs.lane_by_index(1).unwrap();
        assert_eq!(fwd.offset_start, Distance::meters(-3.25 / 2.0));
    }

    #[test]
    fn placement_extrapolates_past_missing_lanes() {
        // This segment only has 1 forward lane; the tag references lane 2 of
        // a wider adjoining segment. One full lane width beyond the boundary.
        let narrow = build(vec![("oneway", "yes"), ("lanes", "1"), ("placement", "right_of:2")]);
        let wide = build(vec![("oneway", "yes"), ("lanes", "2"), ("placement", "right_of:2")]);
        assert_eq!(narrow.left_edge_start, wide.left_edge_start);
    }
}

//! Serializing edited lane state back into the compact tag forms, the inverse
//! of parsing. This only computes the tag values; writing them to the
//! underlying data store is the caller's concern. Keys of a family that don't
//! appear in the result should be removed by the applier.

use std::collections::BTreeMap;

use crate::{osm, Change, CrossSection, PieceDirection, PieceID, Turn};

impl CrossSection {
    /// Records a pending edit to one lane's change rule and redraws the
    /// dividers around it. Nothing is written back until the tags are
    /// synthesized and applied upstream.
    pub fn override_change(&mut self, id: PieceID, change: Change) {
        self.piece_mut(id).change_override = Some(change);
        self.reclassify_dividers();
    }

    /// The compact change tags describing the current (edited) state of all
    /// lanes.
    pub fn change_tags(&self, oneway: bool) -> BTreeMap<String, String> {
        let fwd: Vec<Change> = self
            .lanes(PieceDirection::Fwd)
            .into_iter()
            .map(|p| p.effective_change())
            .collect();
        let back: Vec<Change> = self
            .lanes(PieceDirection::Back)
            .into_iter()
            .map(|p| p.effective_change())
            .collect();
        changes_to_tags(&fwd, &back, oneway)
    }

    /// The compact turn tags describing all lanes.
    pub fn turn_tags(&self, oneway: bool) -> BTreeMap<String, String> {
        let fwd: Vec<Vec<Turn>> = self
            .lanes(PieceDirection::Fwd)
            .into_iter()
            .map(|p| p.turns.clone())
            .collect();
        let back: Vec<Vec<Turn>> = self
            .lanes(PieceDirection::Back)
            .into_iter()
            .map(|p| p.turns.clone())
            .collect();
        turns_to_tags(&fwd, &back, oneway)
    }
}

/// The most compact change tagging for the given per-lane rules: a value
/// shared by all lanes of a direction collapses to the direction tag, shared
/// further by both directions to the bare tag, and the default disappears
/// entirely. Mixed values use the positional form.
pub fn changes_to_tags(
    fwd: &[Change],
    back: &[Change],
    oneway: bool,
) -> BTreeMap<String, String> {
    let fwd_values: Vec<String> = fwd.iter().map(|x| x.to_value().to_string()).collect();
    let back_values: Vec<String> = back.iter().map(|x| x.to_value().to_string()).collect();
    collapse_values(
        osm::CHANGE,
        &fwd_values,
        &back_values,
        oneway,
        Some(Change::DEFAULT.to_value()),
    )
}

/// The most compact turn tagging for the given per-lane turn sets. Lanes
/// without an indication serialize as empty positions.
pub fn turns_to_tags(
    fwd: &[Vec<Turn>],
    back: &[Vec<Turn>],
    oneway: bool,
) -> BTreeMap<String, String> {
    let join = |turns: &Vec<Turn>| -> String {
        turns
            .iter()
            .map(|t| t.to_value())
            .collect::<Vec<_>>()
            .join(";")
    };
    let fwd_values: Vec<String> = fwd.iter().map(join).collect();
    let back_values: Vec<String> = back.iter().map(join).collect();
    collapse_values(osm::TURN, &fwd_values, &back_values, oneway, Some(""))
}

/// The shared collapse logic for positional tag families. `default` values
/// vanish instead of being written.
fn collapse_values(
    base: &str,
    fwd: &[String],
    back: &[String],
    oneway: bool,
    default: Option<&str>,
) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    let is_default = |v: &str| default == Some(v);

    if oneway || back.is_empty() {
        match uniform(fwd) {
            Some(v) => {
                if !is_default(v) {
                    result.insert(base.to_string(), v.to_string());
                }
            }
            None => {
                result.insert(format!("{}:lanes", base), fwd.join("|"));
            }
        }
        return result;
    }
    if fwd.is_empty() {
        match uniform(back) {
            Some(v) => {
                if !is_default(v) {
                    result.insert(format!("{}:backward", base), v.to_string());
                }
            }
            None => {
                result.insert(format!("{}:lanes:backward", base), back.join("|"));
            }
        }
        return result;
    }

    match (uniform(fwd), uniform(back)) {
        (Some(f), Some(b)) if f == b => {
            if !is_default(f) {
                result.insert(base.to_string(), f.to_string());
            }
        }
        (f, b) => {
            match f {
                Some(f) => {
                    if !is_default(f) {
                        result.insert(format!("{}:forward", base), f.to_string());
                    }
                }
                None => {
                    result.insert(format!("{}:lanes:forward", base), fwd.join("|"));
                }
            }
            match b {
                Some(b) => {
                    if !is_default(b) {
                        result.insert(format!("{}:backward", base), b.to_string());
                    }
                }
                None => {
                    result.insert(format!("{}:lanes:backward", base), back.join("|"));
                }
            }
        }
    }
    result
}

/// The single value shared by every entry, if there is one.
fn uniform(values: &[String]) -> Option<&str> {
    let first = values.first()?;
    if values.iter().all(|v| v == first) {
        Some(first)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: Vec<(&str, &str)>) -> BTreeMap<String, String> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn uniform_collapses() {
        // Shared by both directions: the bare tag
        assert_eq!(
            changes_to_tags(&[Change::No, Change::No], &[Change::No], false),
            map(vec![("change", "no")])
        );
        // Uniform per direction: direction tags
        assert_eq!(
            changes_to_tags(&[Change::No], &[Change::NotLeft], false),
            map(vec![("change:forward", "no"), ("change:backward", "not_left")])
        );
        // The default vanishes
        assert_eq!(
            changes_to_tags(&[Change::Yes, Change::Yes], &[Change::Yes], false),
            map(vec![])
        );
    }

    #[test]
    fn mixed_values_use_the_positional_form() {
        assert_eq!(
            changes_to_tags(&[Change::No, Change::NotLeft], &[Change::Yes], false),
            map(vec![("change:lanes:forward", "no|not_left")])
        );
        assert_eq!(
            changes_to_tags(&[Change::Yes, Change::OnlyRight], &[], true),
            map(vec![("change:lanes", "yes|only_right")])
        );
    }

    #[test]
    fn turn_synthesis() {
        assert_eq!(
            turns_to_tags(
                &[
                    vec![Turn::Left, Turn::Through],
                    vec![Turn::Through],
                    vec![Turn::Right]
                ],
                &[],
                true
            ),
            map(vec![("turn:lanes", "left;through|through|right")])
        );
        // Lanes without any indication stay empty
        assert_eq!(
            turns_to_tags(&[vec![Turn::Left], vec![]], &[], true),
            map(vec![("turn:lanes", "left|")])
        );
        // Nothing tagged at all: nothing written
        assert_eq!(turns_to_tags(&[vec![], vec![]], &[], true), map(vec![]));
    }
}

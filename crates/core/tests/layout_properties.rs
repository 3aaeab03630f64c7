//! Integration tests for the organization-chart layout engine.
//!
//! Covers determinism, row membership, connector counting with dangling
//! references, and the reference three-entry scenario.

use std::collections::HashMap;

use cakung_core::layout::{compute_layout, LayoutConfig, LevelPolicy};
use cakung_core::organization::DirectoryEntry;
use cakung_core::types::DbId;

fn entry(id: DbId, parent_id: Option<DbId>, level: u32) -> DirectoryEntry {
    DirectoryEntry::new(id, parent_id, level)
}

/// A small but irregular chart: two roots, a skipped level, an orphan.
fn sample() -> Vec<DirectoryEntry> {
    vec![
        entry(1, None, 0),
        entry(2, Some(1), 1),
        entry(3, Some(1), 1),
        entry(4, Some(2), 2),
        entry(5, Some(2), 2),
        entry(6, Some(3), 3),
        entry(7, None, 0),
        entry(8, Some(7), 1),
        entry(9, Some(404), 2),
    ]
}

// ---------------------------------------------------------------------------
// Test: reference scenario
// ---------------------------------------------------------------------------

/// One root over two children: root centred on row 0, children side by side
/// on row 1 ordered by id, exactly two connectors.
#[test]
fn root_with_two_children() {
    let entries = vec![entry(1, None, 0), entry(2, Some(1), 1), entry(3, Some(1), 1)];
    let config = LayoutConfig::default();
    let layout = compute_layout(&entries, &config);

    let root = layout.get(1).unwrap();
    assert_eq!(root.x, (config.canvas_width - config.card_width) / 2.0);
    assert_eq!(root.y, 50.0);

    let rows = layout.rows();
    assert_eq!(rows[&0], vec![1]);
    assert_eq!(rows[&1], vec![2, 3]);

    let a = layout.get(2).unwrap();
    let b = layout.get(3).unwrap();
    assert_eq!(a.y, b.y);
    assert_eq!(b.x - a.x, config.card_width + config.horizontal_gap);

    let pairs: Vec<(DbId, DbId)> = layout
        .connectors
        .iter()
        .map(|c| (c.parent_id, c.child_id))
        .collect();
    assert_eq!(pairs, vec![(1, 2), (1, 3)]);
}

// ---------------------------------------------------------------------------
// Test: empty input
// ---------------------------------------------------------------------------

#[test]
fn empty_input_yields_empty_layout() {
    let layout = compute_layout(&[], &LayoutConfig::default());
    assert!(layout.is_empty());
    assert!(layout.connectors.is_empty());
}

// ---------------------------------------------------------------------------
// Test: determinism
// ---------------------------------------------------------------------------

/// Identical input gives identical output, and input order does not matter.
#[test]
fn layout_is_deterministic() {
    let config = LayoutConfig::default();
    let first = compute_layout(&sample(), &config);
    let second = compute_layout(&sample(), &config);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    let mut shuffled = sample();
    shuffled.reverse();
    shuffled.swap(0, 4);
    let third = compute_layout(&shuffled, &config);
    assert_eq!(first.entries, third.entries);
    assert_eq!(first.connectors, third.connectors);
}

// ---------------------------------------------------------------------------
// Test: coordinates and rows
// ---------------------------------------------------------------------------

/// Every x is non-negative and all entries on a level share one y.
#[test]
fn rows_match_levels_and_x_is_non_negative() {
    let mut entries = sample();
    // Overfill row 1 so it is wider than the canvas.
    entries.extend((100..110).map(|id| entry(id, Some(7), 1)));

    let layout = compute_layout(&entries, &LayoutConfig::default());
    assert_eq!(layout.entries.len(), entries.len());

    let mut y_by_level: HashMap<u32, f64> = HashMap::new();
    for placed in &layout.entries {
        assert!(placed.x >= 0.0, "entry {} has negative x", placed.entry.id);
        let y = *y_by_level.entry(placed.entry.level).or_insert(placed.y);
        assert_eq!(y, placed.y, "entry {} off its row", placed.entry.id);
    }
}

/// Multiple roots share row 0 and are centred together as one group.
#[test]
fn multiple_roots_centred_together() {
    let entries = vec![entry(1, None, 0), entry(2, None, 0)];
    let config = LayoutConfig::default();
    let layout = compute_layout(&entries, &config);

    let left = layout.get(1).unwrap().x;
    let right = layout.get(2).unwrap().x + config.card_width;
    assert_eq!(left, config.canvas_width - right);
}

/// A level skipped by a branch still uses the global row for that level.
#[test]
fn skipped_levels_use_global_rows() {
    let entries = vec![entry(1, None, 0), entry(2, Some(1), 3)];
    let config = LayoutConfig::default();
    let layout = compute_layout(&entries, &config);
    assert_eq!(layout.get(2).unwrap().y, config.row_y(3));
    assert_eq!(layout.connectors.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: connectors
// ---------------------------------------------------------------------------

/// Connector count equals the number of resolvable parent/child pairs;
/// the orphan (parent 404) is placed but not connected.
#[test]
fn dangling_parent_gets_card_but_no_connector() {
    let entries = sample();
    let layout = compute_layout(&entries, &LayoutConfig::default());

    let ids: Vec<DbId> = entries.iter().map(|e| e.id).collect();
    let expected = entries
        .iter()
        .filter(|e| e.parent_id.is_some_and(|p| ids.contains(&p)))
        .count();
    assert_eq!(layout.connectors.len(), expected);
    assert_eq!(expected, 6);

    assert!(layout.get(9).is_some());
    assert!(layout.connectors.iter().all(|c| c.child_id != 9));
}

/// Each connector starts at its parent's bottom centre and ends at its
/// child's top centre, with the horizontal run halfway between.
#[test]
fn connectors_join_card_edges() {
    let config = LayoutConfig::default();
    let layout = compute_layout(&sample(), &config);

    for c in &layout.connectors {
        let parent = layout.get(c.parent_id).unwrap();
        let child = layout.get(c.child_id).unwrap();
        assert_eq!(c.start.x, parent.x + config.card_width / 2.0);
        assert_eq!(c.start.y, parent.y + config.card_height);
        assert_eq!(c.end.x, child.x + config.card_width / 2.0);
        assert_eq!(c.end.y, child.y);
        assert_eq!(c.mid_y, (c.start.y + c.end.y) / 2.0);
    }
}

// ---------------------------------------------------------------------------
// Test: cyclic input terminates
// ---------------------------------------------------------------------------

/// A parent cycle is laid out by stored level under both policies.
#[test]
fn cycles_do_not_hang() {
    let entries = vec![entry(1, Some(3), 0), entry(2, Some(1), 1), entry(3, Some(2), 2)];
    for policy in [LevelPolicy::Trusted, LevelPolicy::Derived] {
        let config = LayoutConfig {
            level_policy: policy,
            ..LayoutConfig::default()
        };
        let layout = compute_layout(&entries, &config);
        assert_eq!(layout.entries.len(), 3);
        assert_eq!(layout.connectors.len(), 3);
    }
}

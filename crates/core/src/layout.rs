//! Organization-chart layout engine.
//!
//! Turns the flat entry list into absolute card coordinates plus the
//! parent-to-child connector geometry, without a layout library:
//!
//! 1. Entries are grouped into rows by level; rows are global, so a branch
//!    that skips a level still lands on the row its level names.
//! 2. Each row is ordered by `(parent_id or 0, id)`, which keeps siblings
//!    adjacent and gives a stable left-to-right order.
//! 3. Rows are stacked top to bottom at fixed spacing and centred as a group
//!    within the canvas width.
//! 4. Every resolvable parent/child pair gets one elbow connector running
//!    down from the parent's bottom centre, across at the vertical midpoint,
//!    and down into the child's top centre.
//!
//! [`compute_layout`] is a pure function of its input and [`LayoutConfig`].

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::hierarchy::derive_levels;
use crate::organization::DirectoryEntry;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Card width in pixels.
pub const CARD_WIDTH: f64 = 200.0;

/// Card height in pixels.
pub const CARD_HEIGHT: f64 = 100.0;

/// Gap between neighbouring cards in a row.
pub const HORIZONTAL_GAP: f64 = 40.0;

/// Gap between rows.
pub const VERTICAL_GAP: f64 = 80.0;

/// Width rows are centred within.
pub const CANVAS_WIDTH: f64 = 1400.0;

/// Offset of the first row from the top edge.
pub const BASE_MARGIN: f64 = 50.0;

/// Extra space below the lowest row.
pub const BOTTOM_PADDING: f64 = 100.0;

/// Canvas height reported for an empty chart.
pub const EMPTY_CANVAS_HEIGHT: f64 = 600.0;

/// Which level decides an entry's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelPolicy {
    /// Use the stored `level` field as given.
    #[default]
    Trusted,
    /// Recompute levels from `parent_id` depth (see [`derive_levels`]).
    Derived,
}

/// Fixed layout constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutConfig {
    pub card_width: f64,
    pub card_height: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
    pub canvas_width: f64,
    pub base_margin: f64,
    pub level_policy: LevelPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            card_width: CARD_WIDTH,
            card_height: CARD_HEIGHT,
            horizontal_gap: HORIZONTAL_GAP,
            vertical_gap: VERTICAL_GAP,
            canvas_width: CANVAS_WIDTH,
            base_margin: BASE_MARGIN,
            level_policy: LevelPolicy::Trusted,
        }
    }
}

impl LayoutConfig {
    /// Top edge of the row for `level`.
    pub fn row_y(&self, level: u32) -> f64 {
        self.base_margin + f64::from(level) * (self.card_height + self.vertical_gap)
    }

    /// Left edge of the first card in a row of `count` cards. Never negative:
    /// a row wider than the canvas starts at the left edge instead of being
    /// centred past it.
    pub fn row_start_x(&self, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let n = count as f64;
        let total = n * self.card_width + (n - 1.0) * self.horizontal_gap;
        ((self.canvas_width - total) / 2.0).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An entry with the top-left corner of its card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedEntry {
    #[serde(flatten)]
    pub entry: DirectoryEntry,
    pub x: f64,
    pub y: f64,
}

impl PositionedEntry {
    fn top_center(&self, config: &LayoutConfig) -> Point {
        Point {
            x: self.x + config.card_width / 2.0,
            y: self.y,
        }
    }

    fn bottom_center(&self, config: &LayoutConfig) -> Point {
        Point {
            x: self.x + config.card_width / 2.0,
            y: self.y + config.card_height,
        }
    }
}

/// Elbow connector between a parent card and one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConnectorSegment {
    pub parent_id: DbId,
    pub child_id: DbId,
    /// Parent's bottom centre.
    pub start: Point,
    /// Y of the horizontal run, halfway between the two cards.
    pub mid_y: f64,
    /// Child's top centre.
    pub end: Point,
}

impl ConnectorSegment {
    fn between(parent: &PositionedEntry, child: &PositionedEntry, config: &LayoutConfig) -> Self {
        let start = parent.bottom_center(config);
        let end = child.top_center(config);
        Self {
            parent_id: parent.entry.id,
            child_id: child.entry.id,
            start,
            mid_y: start.y + (end.y - start.y) / 2.0,
            end,
        }
    }

    /// The four corners of the vertical-horizontal-vertical path.
    pub fn points(&self) -> [Point; 4] {
        [
            self.start,
            Point {
                x: self.start.x,
                y: self.mid_y,
            },
            Point {
                x: self.end.x,
                y: self.mid_y,
            },
            self.end,
        ]
    }

    /// SVG path data: `M bx by V midY H cx V cy`.
    pub fn svg_path(&self) -> String {
        format!(
            "M {} {} V {} H {} V {}",
            self.start.x, self.start.y, self.mid_y, self.end.x, self.end.y
        )
    }
}

/// Result of [`compute_layout`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgChartLayout {
    /// Entries row by row, left to right.
    pub entries: Vec<PositionedEntry>,
    pub connectors: Vec<ConnectorSegment>,
    pub config: LayoutConfig,
}

impl OrgChartLayout {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Positioned entry for `id`.
    pub fn get(&self, id: DbId) -> Option<&PositionedEntry> {
        self.entries.iter().find(|p| p.entry.id == id)
    }

    /// Entry ids per level, in placement order.
    pub fn rows(&self) -> BTreeMap<u32, Vec<DbId>> {
        let mut rows: BTreeMap<u32, Vec<DbId>> = BTreeMap::new();
        for placed in &self.entries {
            rows.entry(placed.entry.level).or_default().push(placed.entry.id);
        }
        rows
    }

    /// Height needed to show every card plus bottom padding.
    pub fn canvas_height(&self) -> f64 {
        self.entries
            .iter()
            .map(|p| p.y)
            .reduce(f64::max)
            .map(|max_y| max_y + self.config.card_height + BOTTOM_PADDING)
            .unwrap_or(EMPTY_CANVAS_HEIGHT)
    }

    /// Configured canvas width, widened when a row overflows it.
    pub fn canvas_width(&self) -> f64 {
        self.entries
            .iter()
            .map(|p| p.x + self.config.card_width)
            .fold(self.config.canvas_width, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Compute card positions and connectors for `entries`.
///
/// Dangling `parent_id` references still get a card on their level's row but
/// no connector. Self-references produce no connector either.
pub fn compute_layout(entries: &[DirectoryEntry], config: &LayoutConfig) -> OrgChartLayout {
    let derived = match config.level_policy {
        LevelPolicy::Trusted => None,
        LevelPolicy::Derived => Some(derive_levels(entries)),
    };
    let level_of = |entry: &DirectoryEntry| {
        derived
            .as_ref()
            .and_then(|levels| levels.get(&entry.id).copied())
            .unwrap_or(entry.level)
    };

    let mut rows: BTreeMap<u32, Vec<&DirectoryEntry>> = BTreeMap::new();
    for entry in entries {
        rows.entry(level_of(entry)).or_default().push(entry);
    }

    let mut positioned = Vec::with_capacity(entries.len());
    for (level, mut row) in rows {
        row.sort_by_key(|e| (e.parent_id.unwrap_or(0), e.id));

        let y = config.row_y(level);
        let start_x = config.row_start_x(row.len());
        let step = config.card_width + config.horizontal_gap;

        for (index, entry) in row.into_iter().enumerate() {
            let mut entry = entry.clone();
            entry.level = level;
            positioned.push(PositionedEntry {
                entry,
                x: start_x + index as f64 * step,
                y,
            });
        }
    }

    let connectors = connect(&positioned, config);

    OrgChartLayout {
        entries: positioned,
        connectors,
        config: *config,
    }
}

/// One connector per child whose parent is present, parents and children
/// both in placement order.
fn connect(positioned: &[PositionedEntry], config: &LayoutConfig) -> Vec<ConnectorSegment> {
    let mut children: HashMap<DbId, Vec<&PositionedEntry>> = HashMap::new();
    for child in positioned {
        if let Some(pid) = child.entry.parent_id.filter(|pid| *pid != child.entry.id) {
            children.entry(pid).or_default().push(child);
        }
    }

    let mut seen = HashSet::new();
    let mut connectors = Vec::new();
    for parent in positioned {
        if !seen.insert(parent.entry.id) {
            continue;
        }
        if let Some(kids) = children.get(&parent.entry.id) {
            connectors.extend(
                kids.iter()
                    .map(|child| ConnectorSegment::between(parent, child, config)),
            );
        }
    }
    connectors
}

//! Frame composition for the horizon view.
//!
//! Every metric takes two rows:
//!
//! ```text
//! ╔ GPU util %.......................................................  4%| ╗
//! ╚ ▁▁▁  ▁    ▁▆▅▄ ▁▁▁      ▂ ▇▃▃▂█▃▇▁▃▂▁▁▂▁▁▃▃▂▁▂▄▄▁▂▆▁▃▁▂▃▁▁▁▂▂▂▂▂▂▁▁▃▂▂▁ ╝
//! ```
//!
//! The chart row is right-aligned so the newest sample sits in column
//! `cols - 3`. Ruler labels are written as `value|` with the bar on the tick
//! column. This module only produces text and numbers; painting glyphs and
//! colors is the terminal front end's job.

use crate::mode::{ColorTheme, ViewMode};
use crate::store::Group;

/// Columns between ruler ticks in [`ViewMode::All`].
pub const RULER_INTERVAL: usize = 20;

const SPACING: &str = " ";
const FILL: char = '.';

/// One metric on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub group: Group,
    pub key: String,
    pub indent: &'static str,
    /// Title, ruler labels and borders, exactly `cols` characters.
    pub header: String,
    /// Samples to draw, oldest first.
    pub window: Vec<f64>,
    pub ceiling: f64,
}

impl ChartRow {
    /// Column of the oldest sample in `window`.
    pub fn first_col(&self, cols: usize) -> usize {
        cols.saturating_sub(self.window.len() + 2)
    }

    /// Frame of the chart row: left border after the indent, right border at
    /// the edge, blanks in between.
    pub fn footer(&self, cols: usize) -> String {
        let mut line = vec![' '; cols];
        overwrite(&mut line, 0, &format!("{}╚", self.indent));
        overwrite(&mut line, cols.saturating_sub(2), &format!("{SPACING}╝"));
        line.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    pub cols: usize,
    pub theme: ColorTheme,
    pub rows: Vec<ChartRow>,
    /// Elapsed-time row under the last chart, absent in [`ViewMode::Off`].
    pub time_ruler: Option<String>,
}

/// Number of samples that fit next to the borders of an indented row.
pub fn chart_width(cols: usize, indent: &str) -> usize {
    cols.saturating_sub(2 * SPACING.len() + 2 + indent.chars().count())
}

/// Screen column of the sample `ago` steps back from the newest.
pub fn tick_col(cols: usize, ago: usize) -> Option<usize> {
    cols.checked_sub(3 + ago)
}

/// Ruler positions (samples back from the newest) for a view mode.
pub fn ruler_ticks(cols: usize, view: ViewMode) -> Vec<usize> {
    match view {
        ViewMode::Off => Vec::new(),
        ViewMode::One => vec![0],
        ViewMode::All => (0..cols).step_by(RULER_INTERVAL).collect(),
    }
}

/// Build a header row: `{indent}╔ {title}`, dot fill carrying `labels` at
/// their tick columns, and ` ╗` at the right edge.
pub fn header(cols: usize, indent: &str, title: &str, labels: &[(usize, String)]) -> String {
    let mut line = vec![FILL; cols];
    for (ago, label) in labels {
        place_label(&mut line, cols, *ago, label);
    }
    overwrite(&mut line, 0, &format!("{indent}╔{SPACING}{title}"));
    overwrite(&mut line, cols.saturating_sub(2), &format!("{SPACING}╗"));
    line.into_iter().collect()
}

/// Build the time ruler: `-{seconds}s|` at every `RULER_INTERVAL` tick.
pub fn time_ruler(cols: usize, refresh_secs: f64, h_shift: usize) -> String {
    let mut line = vec![FILL; cols];
    for ago in ruler_ticks(cols, ViewMode::All) {
        let label = format!("-{:.2}s", refresh_secs * (ago + h_shift) as f64);
        place_label(&mut line, cols, ago, &label);
    }
    overwrite(&mut line, 0, &format!("╚{SPACING}"));
    overwrite(&mut line, cols.saturating_sub(2), &format!("{SPACING}╝"));
    line.into_iter().collect()
}

/// Write `label|` so the bar lands on the tick column, only if the label fits
/// entirely on screen.
fn place_label(line: &mut [char], cols: usize, ago: usize, label: &str) {
    let Some(col) = tick_col(cols, ago) else {
        return;
    };
    let len = label.chars().count();
    if col <= len {
        return;
    }
    overwrite(line, col - len, label);
    overwrite(line, col, "|");
}

fn overwrite(line: &mut [char], at: usize, text: &str) {
    for (slot, ch) in line.iter_mut().skip(at).zip(text.chars()) {
        *slot = ch;
    }
}

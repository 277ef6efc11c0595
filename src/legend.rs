use crate::party::{self, PARTY_COLORS, UNKNOWN};
use crate::style::escape_html;
use crate::types::ResultStore;
use std::collections::HashMap;
use std::fmt::Write;

pub const USAGE_HINT: &str = "Click on any district to view election results";

#[derive(Debug, Clone, PartialEq)]
pub struct LegendRow {
    pub party: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub seats: usize,
}

impl LegendRow {
    /// "Liberal (1 seat)", "Progressive Conservative (2 seats)"
    pub fn caption(&self) -> String {
        let plural = if self.seats == 1 { "" } else { "s" };
        format!("{} ({} seat{})", self.label, self.seats, plural)
    }
}

pub fn seat_counts(results: &ResultStore) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for result in results.values() {
        if let Some(p) = result.party() {
            *counts.entry(p).or_insert(0) += 1;
        }
    }
    counts
}

/// Rows in color-table order, without Unknown or seatless parties.
pub fn legend_rows(results: &ResultStore) -> Vec<LegendRow> {
    let counts = seat_counts(results);
    PARTY_COLORS
        .iter()
        .filter(|(code, _)| *code != UNKNOWN)
        .filter_map(|&(code, color)| {
            let seats = counts.get(code).copied().unwrap_or(0);
            (seats > 0).then(|| LegendRow {
                party: code,
                label: party::label_for(code),
                color,
                seats,
            })
        })
        .collect()
}

pub fn render_legend(rows: &[LegendRow]) -> String {
    let mut html = String::from("<h4>Party Legend</h4>");
    for row in rows {
        let _ = write!(
            html,
            "<div class=\"legend-row\"><span class=\"swatch\" style=\"background-color: {};\"></span><span>{}</span></div>",
            row.color,
            escape_html(&row.caption())
        );
    }
    let _ = write!(html, "<hr><p><em>{}</em></p>", USAGE_HINT);
    html
}

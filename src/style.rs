use crate::party::{self, UNKNOWN_COLOR};
use crate::types::{District, ElectionResult, ResultStore};
use serde::Serialize;
use std::fmt::Write;

const BORDER_COLOR: &str = "#333";
pub const KEY_WIDTH: usize = 2;

/// Leaflet path options. Field names serialize to what `L.Path#setStyle` expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub fill_color: String,
    pub weight: f64,
    pub opacity: f64,
    pub color: String,
    pub fill_opacity: f64,
}

/// Pointer interactions the renderer forwards per drawn district.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    PointerEnter,
    PointerLeave,
}

/// Zero-pad a district number to the two-character join key.
/// Wider ids pass through unchanged.
pub fn join_key(id: &str) -> String {
    format!("{:0>width$}", id, width = KEY_WIDTH)
}

pub fn lookup<'s>(district: &District<'_>, results: &'s ResultStore) -> Option<&'s ElectionResult> {
    district.id().and_then(|id| results.get(&join_key(&id)))
}

pub fn style_district(district: &District<'_>, results: &ResultStore) -> PathStyle {
    let (fill_color, fill_opacity) = match lookup(district, results).and_then(ElectionResult::party) {
        Some(party) => (party::color_for(party), 0.7),
        None => (UNKNOWN_COLOR, 0.3),
    };
    PathStyle {
        fill_color: fill_color.to_string(),
        weight: 2.0,
        opacity: 1.0,
        color: BORDER_COLOR.to_string(),
        fill_opacity,
    }
}

/// Style to apply after an interaction. Leaving recomputes from the store.
pub fn style_for(district: &District<'_>, results: &ResultStore, event: Interaction) -> PathStyle {
    let base = style_district(district, results);
    match event {
        Interaction::PointerEnter => PathStyle {
            weight: 3.0,
            fill_opacity: 0.9,
            ..base
        },
        Interaction::PointerLeave => base,
    }
}

pub fn popup_content(district: &District<'_>, results: &ResultStore) -> String {
    let id = district.id().unwrap_or_else(|| "N/A".to_string());
    let mut html = String::from("<div class=\"district-popup\">");
    let _ = write!(html, "<div class=\"district-id\">District {}</div>", escape_html(&id));
    let _ = write!(
        html,
        "<h4>{}</h4>",
        escape_html(district.name().unwrap_or("District Name Not Available"))
    );

    match lookup(district, results) {
        Some(result) => {
            let _ = write!(html, "<p><strong>MLA:</strong> {}</p>", escape_html(&result.mla));
            let _ = write!(html, "<p><strong>Party:</strong> {}</p>", escape_html(&result.party_full));
            let _ = write!(html, "<p><strong>Votes:</strong> {}</p>", group_thousands(result.votes));
            let _ = write!(html, "<p><strong>Percentage:</strong> {}%</p>", result.percentage);
            let _ = write!(
                html,
                "<p><strong>Total District Votes:</strong> {}</p>",
                group_thousands(result.total_votes)
            );

            if !result.all_candidates.is_empty() {
                html.push_str("<p><strong>All Candidates:</strong></p><ul>");
                for candidate in &result.all_candidates {
                    let _ = write!(
                        html,
                        "<li>{} ({}) - {} votes</li>",
                        escape_html(&candidate.name),
                        escape_html(&candidate.party),
                        group_thousands(candidate.votes)
                    );
                }
                html.push_str("</ul>");
            }
        }
        None => {
            let label = district.label().unwrap_or_else(|| "N/A".to_string());
            let _ = write!(html, "<p><strong>District ID:</strong> {}</p>", escape_html(&id));
            let _ = write!(html, "<p><strong>Label:</strong> {}</p>", escape_html(&label));
            let _ = write!(
                html,
                "<p><strong>Area:</strong> {} km²</p>",
                scaled(district.area(), 1_000_000.0)
            );
            let _ = write!(
                html,
                "<p><strong>Perimeter:</strong> {} km</p>",
                scaled(district.perimeter(), 1_000.0)
            );
            html.push_str("<p><em>Election results not available</em></p>");
        }
    }

    html.push_str("</div>");
    html
}

/// Two decimals, ties rounded up (1.125 -> "1.13").
fn scaled(raw: Option<f64>, divisor: f64) -> String {
    match raw {
        Some(v) => format!("{:.2}", ((v / divisor) * 100.0).round() / 100.0),
        None => "N/A".to_string(),
    }
}

/// 12345 -> "12,345"
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

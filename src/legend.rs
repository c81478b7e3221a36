use crate::transform::{series_keys, ChartPoint};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Key of the synthetic legend entry that stands in for every folded series.
pub const OTHERS_KEY: &str = "others";

/// How many series stay individually toggleable when a legend is collapsed.
pub const DEFAULT_TOP_N: usize = 10;

const FALLBACK_COLOR: &str = "#7F7F7F";

pub const SERIES_PALETTE: [&str; 16] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFA07A", "#9370DB", "#20B2AA", "#FFD700",
    "#FF6347", "#40E0D0", "#EE82EE", "#32CD32", "#FF1493", "#00CED1", "#FF8C00", "#8A2BE2",
];

/// Wider palette for high-cardinality legends (instructors, studio x discipline).
pub const INSTRUCTOR_PALETTE: [&str; 30] = [
    "#1F77B4", "#FF7F0E", "#2CA02C", "#D62728", "#9467BD", "#8C564B", "#E377C2", "#7F7F7F",
    "#BCBD22", "#17BECF", "#393B79", "#637939", "#8C6D31", "#843C39", "#7B4173", "#AEC7E8",
    "#FFBB78", "#98DF8A", "#FF9896", "#C5B0D5", "#C49C94", "#F7B6D2", "#C7C7C7", "#DBDB8D",
    "#9EDAE5", "#2B8CBE", "#F03B20", "#5AC8FA", "#34A853", "#FBBC05",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendItem {
    pub key: String,
    pub color: String,
    pub visible: bool,
}

/// Legend state for one chart: stable colors per series plus visibility toggles.
#[derive(Debug, Clone)]
pub struct ChartLegend {
    keys: Vec<String>,
    colors: HashMap<String, String>,
    hidden: BTreeMap<String, bool>,
    shown: Vec<String>,
    folded: Vec<String>,
    others_color: Option<String>,
}

impl ChartLegend {
    pub fn new(points: &[ChartPoint], palette: &[&str], collapse_to_top_n: bool) -> Self {
        Self::with_top_n(points, palette, collapse_to_top_n.then_some(DEFAULT_TOP_N))
    }

    pub fn with_top_n(points: &[ChartPoint], palette: &[&str], top_n: Option<usize>) -> Self {
        let keys = series_keys(points);
        let color_at = |index: usize| -> String {
            if palette.is_empty() {
                FALLBACK_COLOR.to_string()
            } else {
                palette[index % palette.len()].to_string()
            }
        };

        let colors: HashMap<String, String> = keys
            .iter()
            .enumerate()
            .map(|(index, key)| (key.clone(), color_at(index)))
            .collect();
        let hidden = keys.iter().map(|key| (key.clone(), false)).collect();

        let (shown, folded, others_color) = match top_n {
            Some(n) if keys.len() > n => {
                let ranked = rank_by_total(points, &keys);
                let shown: Vec<String> = ranked[..n].to_vec();
                let folded: Vec<String> = ranked[n..].to_vec();
                let others_color = others_color(palette, &colors, &shown);
                (shown, folded, Some(others_color))
            }
            _ => (keys.clone(), Vec::new(), None),
        };

        Self {
            keys,
            colors,
            hidden,
            shown,
            folded,
            others_color,
        }
    }

    pub fn series_keys(&self) -> &[String] {
        &self.keys
    }

    pub fn color_of(&self, key: &str) -> Option<&str> {
        self.colors.get(key).map(String::as_str)
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.get(key).copied().unwrap_or(false)
    }

    /// Per-series visibility for the chart layer; folded series are included.
    pub fn hidden(&self) -> &BTreeMap<String, bool> {
        &self.hidden
    }

    pub fn folded_keys(&self) -> &[String] {
        &self.folded
    }

    pub fn legend_items(&self) -> Vec<LegendItem> {
        let mut items: Vec<LegendItem> = self
            .shown
            .iter()
            .map(|key| LegendItem {
                key: key.clone(),
                color: self.color_of(key).unwrap_or(FALLBACK_COLOR).to_string(),
                visible: !self.is_hidden(key),
            })
            .collect();

        if let Some(color) = &self.others_color {
            items.push(LegendItem {
                key: OTHERS_KEY.to_string(),
                color: color.clone(),
                visible: self.folded.iter().any(|key| !self.is_hidden(key)),
            });
        }
        items
    }

    pub fn visible_items(&self) -> Vec<LegendItem> {
        self.legend_items()
            .into_iter()
            .filter(|item| item.visible)
            .collect()
    }

    /// Flips one series. The `others` entry flips every folded series at once:
    /// hides them all if any is showing, otherwise shows them all.
    pub fn toggle(&mut self, key: &str) {
        if key == OTHERS_KEY && !self.folded.is_empty() && !self.hidden.contains_key(OTHERS_KEY) {
            let hide = self.folded.iter().any(|folded| !self.is_hidden(folded));
            for folded in &self.folded {
                self.hidden.insert(folded.clone(), hide);
            }
            return;
        }
        if let Some(flag) = self.hidden.get_mut(key) {
            *flag = !*flag;
        }
    }
}

/// First palette color no series uses; failing that, the first one no kept
/// series uses, so the `others` entry never shares a color with a legend row.
fn others_color(palette: &[&str], colors: &HashMap<String, String>, shown: &[String]) -> String {
    let used_by_any: HashSet<&str> = colors.values().map(String::as_str).collect();
    let used_by_shown: HashSet<&str> = shown
        .iter()
        .filter_map(|key| colors.get(key))
        .map(String::as_str)
        .collect();
    palette
        .iter()
        .find(|color| !used_by_any.contains(**color))
        .or_else(|| palette.iter().find(|color| !used_by_shown.contains(**color)))
        .map(|color| color.to_string())
        .unwrap_or_else(|| FALLBACK_COLOR.to_string())
}

/// Series ordered by their summed values, largest first. Equal totals keep
/// first-seen order because the sort is stable.
fn rank_by_total(points: &[ChartPoint], keys: &[String]) -> Vec<String> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for point in points {
        for (key, value) in &point.values {
            *totals.entry(key.as_str()).or_insert(0.0) += value;
        }
    }
    let mut ranked: Vec<&String> = keys.iter().collect();
    ranked.sort_by(|a, b| {
        let total_a = totals.get(a.as_str()).copied().unwrap_or(0.0);
        let total_b = totals.get(b.as_str()).copied().unwrap_or(0.0);
        total_b.total_cmp(&total_a)
    });
    ranked.into_iter().cloned().collect()
}

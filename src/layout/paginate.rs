use serde::Serialize;

use super::estimate::estimate_lines;
use crate::models::config::LayoutOptions;
use crate::models::schedule::DayGroup;

/// One planned poster page. Indexes are 1-based; `total` is stamped on
/// every page once the full set is known.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub index: u32,
    pub total: u32,
    pub day_groups: Vec<DayGroup>,
}

/// Lines a day group occupies: the day heading plus one estimate per
/// entry label.
pub fn group_cost(group: &DayGroup, layout: &LayoutOptions) -> u32 {
    let label_lines: u32 = group
        .entries
        .iter()
        .map(|entry| estimate_lines(&entry.label, layout.chars_per_line))
        .sum();

    layout.day_header_cost + label_lines
}

/// Greedy one-pass pagination over the line budget.
///
/// Day groups are atomic. A group that does not fit on the current
/// non-empty page closes it and opens the next; a group whose cost
/// alone exceeds the budget is placed alone and overflows vertically,
/// which is the only way a page may exceed the budget. Group order is
/// preserved exactly. Empty input yields no pages.
pub fn paginate(groups: Vec<DayGroup>, layout: &LayoutOptions) -> Vec<Page> {
    let mut pages: Vec<Vec<DayGroup>> = Vec::new();
    let mut current: Vec<DayGroup> = Vec::new();
    let mut used: u32 = 0;

    for group in groups {
        let cost = group_cost(&group, layout);

        if !current.is_empty() && used + cost > layout.max_lines_per_page {
            pages.push(std::mem::take(&mut current));
            used = 0;
        }

        used += cost;
        current.push(group);
    }

    if !current.is_empty() {
        pages.push(current);
    }

    let total = pages.len() as u32;
    pages
        .into_iter()
        .enumerate()
        .map(|(i, day_groups)| Page {
            index: i as u32 + 1,
            total,
            day_groups,
        })
        .collect()
}

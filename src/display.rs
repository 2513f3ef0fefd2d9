use std::fmt::{Display, Write};

use crate::aggregate::{CategoryCounts, ClassSeries};
use crate::extent::Extent;
use crate::filter::FilterConfig;
use crate::pipeline::Snapshot;

const BAR_WIDTH: usize = 40;

/// Horizontal bar table of one category projection.
pub fn render_counts<K: Display>(title: &str, counts: &CategoryCounts<K>) -> String {
    let mut out = format!("{} (total {})\n", title, counts.total);
    let widest = counts.groups.iter().map(|g| g.count).max().unwrap_or(0);
    for group in &counts.groups {
        let bar = if widest == 0 {
            0
        } else {
            (group.count * BAR_WIDTH).div_ceil(widest)
        };
        let _ = writeln!(
            out,
            "  {:<8}{:<width$} {}",
            group.key.to_string(),
            "#".repeat(bar),
            group.count,
            width = BAR_WIDTH
        );
    }
    if counts.groups.is_empty() {
        out.push_str("  (no survivors)\n");
    }
    out
}

/// One line per class: `age:count` pairs in ascending age.
pub fn render_series(series: &[ClassSeries]) -> String {
    let mut out = String::from("survivors by class and age\n");
    for class in series {
        let points: Vec<String> = class
            .values
            .iter()
            .map(|point| format!("{}:{}", point.age, point.count))
            .collect();
        let _ = writeln!(
            out,
            "  class {} ({}): {}",
            class.pclass,
            class.total(),
            points.join(" ")
        );
    }
    if series.is_empty() {
        out.push_str("  (no survivors)\n");
    }
    out
}

pub fn render_filters(filters: &FilterConfig) -> String {
    let enabled: Vec<&str> = filters.enabled_keys().iter().map(|k| k.as_str()).collect();
    format!(
        "filters: [{}] age [{}, {}]",
        enabled.join(" "),
        filters.min_age,
        filters.max_age
    )
}

fn range<T: Display>(extent: &Option<Extent<T>>) -> String {
    match extent {
        Some(extent) => format!("[{}, {}]", extent.min, extent.max),
        None => "undefined".to_string(),
    }
}

pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "records: {}  survivors: {}",
        snapshot.record_count, snapshot.survivor_count
    );
    let _ = writeln!(out, "{}", render_filters(&snapshot.filters));
    out.push('\n');
    out.push_str(&render_counts("survivors by sex", &snapshot.by_sex));
    out.push('\n');
    out.push_str(&render_counts("survivors by port", &snapshot.by_port));
    out.push('\n');
    out.push_str(&render_series(&snapshot.by_class));
    out.push('\n');
    let _ = writeln!(out, "age axis:    {}", range(&snapshot.age_extent));
    let _ = writeln!(
        out,
        "count axis:  {}",
        snapshot
            .max_count
            .map_or_else(|| "undefined".to_string(), |max| format!("[0, {}]", max))
    );
    let _ = writeln!(out, "data ages:   {}", range(&snapshot.global_age_extent));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{by_sex, by_class_and_age};
    use crate::pipeline::SurvivalPipeline;
    use crate::record::{Pclass, Port, Record, Sex};

    fn rows() -> Vec<Record> {
        vec![
            Record::passenger(true, Sex::Female, Pclass::First, Some(29.0), Some(Port::Southampton)),
            Record::passenger(true, Sex::Female, Pclass::First, Some(29.5), Some(Port::Cherbourg)),
            Record::passenger(true, Sex::Male, Pclass::Third, Some(4.0), Some(Port::Southampton)),
        ]
    }

    #[test]
    fn bars_scale_to_largest_group() {
        let text = render_counts("by sex", &by_sex(&rows()));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "by sex (total 3)");
        assert!(lines[1].starts_with("  female  "));
        assert_eq!(lines[1].matches('#').count(), BAR_WIDTH);
        assert_eq!(lines[2].matches('#').count(), BAR_WIDTH / 2);
        assert!(lines[2].ends_with(" 1"));
    }

    #[test]
    fn series_lines_list_age_counts() {
        let text = render_series(&by_class_and_age(&rows()));
        assert!(text.contains("class 1 (2): 29:2"));
        assert!(text.contains("class 3 (1): 4:1"));
    }

    #[test]
    fn empty_pipeline_reports_undefined_axes() {
        let text = render_snapshot(&SurvivalPipeline::new().snapshot());
        assert!(text.contains("records: 0  survivors: 0"));
        assert!(text.contains("age axis:    undefined"));
        assert!(text.contains("count axis:  undefined"));
        assert!(text.contains("(no survivors)"));
    }

    #[test]
    fn filter_line_lists_enabled_keys() {
        let filters = FilterConfig {
            male: false,
            ..FilterConfig::default()
        };
        assert_eq!(
            render_filters(&filters),
            "filters: [female class1 class2 class3 pC pQ pS] age [0, 100]"
        );
    }
}

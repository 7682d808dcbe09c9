//! Inspect report types and terminal formatting.

use serde::Serialize;
use std::fmt;

/// Inner width of the report boxes, in characters.
const BOX_WIDTH: usize = 59;

/// The result of inspecting a project.
#[derive(Clone, Debug, Serialize)]
pub struct InspectReport {
    pub summary: SummarySection,
    /// Label count per class.
    pub classes: ClassesSection,
    /// Images per display folder.
    pub groups: Vec<GroupCount>,
    #[serde(skip)]
    pub(crate) bar_width: usize,
}

/// Summary counts for the project.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SummarySection {
    pub images: usize,
    /// Images with an affine transform and CRS.
    pub georeferenced_images: usize,
    /// Images with at least one label.
    pub labelled_images: usize,
    pub classes: usize,
    pub labels: usize,
    /// Object groups with two or more labels.
    pub linked_objects: usize,
    /// Labels belonging to such a group.
    pub linked_labels: usize,
    /// Project-wide custom readers.
    pub custom_readers: usize,
}

/// Class distribution section.
#[derive(Clone, Debug, Serialize)]
pub struct ClassesSection {
    pub top_n: usize,
    /// Distinct class names used by labels or declared.
    pub total_distinct: usize,
    pub total_labels: usize,
    /// Top entries, by count descending then name.
    pub entries: Vec<ClassCount>,
    /// Sum of counts for classes not in the top N.
    pub other_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClassCount {
    pub class_name: String,
    pub count: usize,
    /// False when labels use a class missing from the class list.
    pub declared: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct GroupCount {
    /// Display folder; empty for ungrouped images.
    pub group: String,
    pub images: usize,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "╭─────────────────────────────────────────────────────────────╮")?;
        writeln!(f, "│                 Geolabel Project Report                     │")?;
        writeln!(f, "╰─────────────────────────────────────────────────────────────╯")?;
        writeln!(f)?;

        self.fmt_summary(f)?;
        writeln!(f)?;
        self.fmt_classes(f)?;
        if !self.groups.is_empty() {
            writeln!(f)?;
            self.fmt_groups(f)?;
        }

        Ok(())
    }
}

impl InspectReport {
    fn fmt_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;

        open_box(f, "Summary")?;
        row(f, format!("  Images:          {:>8}", format_number(s.images)))?;
        row(
            f,
            format!(
                "  Georeferenced:   {:>8}  ({})",
                format_number(s.georeferenced_images),
                fmt_percent(s.georeferenced_images, s.images)
            ),
        )?;
        row(
            f,
            format!(
                "  Labelled:        {:>8}  ({})",
                format_number(s.labelled_images),
                fmt_percent(s.labelled_images, s.images)
            ),
        )?;
        row(f, String::new())?;
        row(f, format!("  Classes:         {:>8}", format_number(s.classes)))?;
        row(f, format!("  Labels:          {:>8}", format_number(s.labels)))?;
        row(
            f,
            format!(
                "  Linked objects:  {:>8}  ({} labels)",
                format_number(s.linked_objects),
                format_number(s.linked_labels)
            ),
        )?;
        if s.custom_readers > 0 {
            row(
                f,
                format!("  Custom readers:  {:>8}", format_number(s.custom_readers)),
            )?;
        }
        close_box(f)
    }

    fn fmt_classes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.classes;

        let header = if c.total_distinct > c.top_n {
            format!("Classes (top {} of {})", c.top_n, c.total_distinct)
        } else {
            format!("Classes ({})", c.total_distinct)
        };
        open_box(f, &header)?;

        if c.entries.is_empty() {
            row(f, "  No classes or labels.".to_string())?;
        } else {
            let max_count = c.entries.iter().map(|e| e.count).max().unwrap_or(1);
            for entry in &c.entries {
                let name = if entry.declared {
                    truncate_label(&entry.class_name, 16)
                } else {
                    truncate_label(&format!("{}*", entry.class_name), 16)
                };
                row(
                    f,
                    format!(
                        "  {:<16} {:>7} {:>6}  {}",
                        name,
                        format_number(entry.count),
                        fmt_percent(entry.count, c.total_labels),
                        render_bar(entry.count, max_count, self.bar_width)
                    ),
                )?;
            }
            if c.other_count > 0 {
                row(
                    f,
                    format!(
                        "  {:<16} {:>7} {:>6}  {}",
                        "(other)",
                        format_number(c.other_count),
                        fmt_percent(c.other_count, c.total_labels),
                        render_bar(c.other_count, max_count, self.bar_width)
                    ),
                )?;
            }
            if c.entries.iter().any(|e| !e.declared) {
                row(f, String::new())?;
                row(f, "  * used by labels but not declared".to_string())?;
            }
        }
        close_box(f)
    }

    fn fmt_groups(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        open_box(f, "Groups")?;
        for entry in &self.groups {
            let group = if entry.group.is_empty() {
                "(ungrouped)"
            } else {
                entry.group.as_str()
            };
            row(
                f,
                format!(
                    "  {:<36} {:>8} image(s)",
                    truncate_label(group, 36),
                    format_number(entry.images)
                ),
            )?;
        }
        close_box(f)
    }
}

fn open_box(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let rule = BOX_WIDTH.saturating_sub(title.chars().count() + 3);
    writeln!(f, "┌─ {} {}┐", title, "─".repeat(rule))?;
    row(f, String::new())
}

fn close_box(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    row(f, String::new())?;
    writeln!(f, "└{}┘", "─".repeat(BOX_WIDTH))
}

/// One boxed line, padded to the box width.
fn row(f: &mut fmt::Formatter<'_>, content: String) -> fmt::Result {
    let padding = BOX_WIDTH.saturating_sub(content.chars().count());
    writeln!(f, "│{}{}│", content, " ".repeat(padding))
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a percentage, handling zero denominators.
fn fmt_percent(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        "n/a".to_string()
    } else {
        format!("{:.1}%", (numerator as f64 / denominator as f64) * 100.0)
    }
}

fn render_bar(count: usize, max_count: usize, width: usize) -> String {
    if max_count == 0 || width == 0 {
        return String::new();
    }
    let filled = ((count * width) / max_count).min(width);
    "█".repeat(filled) + &"░".repeat(width - filled)
}

fn truncate_label(label: &str, max_len: usize) -> String {
    if label.chars().count() <= max_len {
        label.to_string()
    } else {
        let kept: String = label.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

//! Project inspection and statistics.
//!
//! Produces a summary of a loaded project: counts, georeferencing coverage,
//! object links, and a per-class label histogram.

mod report;

pub use report::{ClassCount, ClassesSection, GroupCount, InspectReport, SummarySection};

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::LabelProject;

/// Options for project inspection.
#[derive(Clone, Debug)]
pub struct InspectOptions {
    /// Number of top classes to show in the histogram.
    pub top_classes: usize,
    /// Width of histogram bars (in characters).
    pub bar_width: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            top_classes: 10,
            bar_width: 20,
        }
    }
}

/// Inspect a project and produce a summary report.
pub fn inspect_project(project: &LabelProject, opts: &InspectOptions) -> InspectReport {
    InspectReport {
        summary: compute_summary(project),
        classes: compute_classes(project, opts.top_classes),
        groups: compute_groups(project),
        bar_width: opts.bar_width,
    }
}

fn compute_summary(project: &LabelProject) -> SummarySection {
    let linked_labels = project
        .all_labels()
        .filter(|(_, label)| !project.linked_labels(label.id()).is_empty())
        .count();

    SummarySection {
        images: project.image_count(),
        georeferenced_images: project.images().filter(|i| i.is_georeferenced()).count(),
        labelled_images: project.images().filter(|i| !i.labels().is_empty()).count(),
        classes: project.classes().len(),
        labels: project.label_count(),
        linked_objects: project.linked_object_count(),
        linked_labels,
        custom_readers: project.custom_readers().len(),
    }
}

fn compute_classes(project: &LabelProject, top_n: usize) -> ClassesSection {
    let declared: HashSet<&str> = project.classes().iter().map(String::as_str).collect();

    // Declared classes show up even with no labels.
    let mut counts: HashMap<&str, usize> = project
        .classes()
        .iter()
        .map(|name| (name.as_str(), 0))
        .collect();
    for (_, label) in project.all_labels() {
        *counts.entry(label.class_name()).or_insert(0) += 1;
    }

    let mut sorted: Vec<(&str, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total_distinct = sorted.len();
    let rest = sorted.split_off(top_n.min(sorted.len()));

    ClassesSection {
        top_n,
        total_distinct,
        total_labels: project.label_count(),
        entries: sorted
            .into_iter()
            .map(|(name, count)| ClassCount {
                class_name: name.to_string(),
                count,
                declared: declared.contains(name),
            })
            .collect(),
        other_count: rest.into_iter().map(|(_, count)| count).sum(),
    }
}

fn compute_groups(project: &LabelProject) -> Vec<GroupCount> {
    let mut groups: BTreeMap<&str, usize> = BTreeMap::new();
    for image in project.images() {
        *groups.entry(image.group()).or_insert(0) += 1;
    }
    groups
        .into_iter()
        .map(|(group, images)| GroupCount {
            group: group.to_string(),
            images,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Affine, Epsg, LatLon};
    use crate::model::{Coord, ImageSpec};

    fn project() -> LabelProject {
        let mut project = LabelProject::new();
        for class in ["car", "tree", "house"] {
            project.add_class(class);
        }
        project.add_image(
            ImageSpec::new("a.tif", "a")
                .with_group("north")
                .with_transform(Affine::from_origin(0.0, 0.0, 1.0, 1.0), Epsg::WEB_MERCATOR),
        );
        project.add_image(ImageSpec::new("b.tif", "b").with_group("north"));
        project.add_image(ImageSpec::new("c.tif", "c"));

        let geo = LatLon::new(0.0, 0.0);
        let a = project.add_label("a.tif", "car", Coord::new(1.0, 1.0), geo).id();
        let b = project.add_label("b.tif", "car", Coord::new(1.0, 1.0), geo).id();
        project.add_label("b.tif", "tree", Coord::new(2.0, 2.0), geo);
        project.add_label("b.tif", "boat", Coord::new(3.0, 3.0), geo);
        project.link_labels(a, b);
        project
    }

    #[test]
    fn test_summary_counts() {
        let report = inspect_project(&project(), &InspectOptions::default());
        let s = &report.summary;
        assert_eq!(s.images, 3);
        assert_eq!(s.georeferenced_images, 1);
        assert_eq!(s.labelled_images, 2);
        assert_eq!(s.classes, 3);
        assert_eq!(s.labels, 4);
        assert_eq!(s.linked_objects, 1);
        assert_eq!(s.linked_labels, 2);
    }

    #[test]
    fn test_class_histogram() {
        let opts = InspectOptions {
            top_classes: 2,
            ..Default::default()
        };
        let report = inspect_project(&project(), &opts);
        let c = &report.classes;
        assert_eq!(c.total_distinct, 4);
        assert_eq!(c.entries[0].class_name, "car");
        assert_eq!(c.entries[0].count, 2);
        // Ties sort by name: boat before house and tree.
        assert_eq!(c.entries[1].class_name, "boat");
        assert!(!c.entries[1].declared);
        assert_eq!(c.other_count, 1);
    }

    #[test]
    fn test_groups_and_display() {
        let report = inspect_project(&project(), &InspectOptions::default());
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].group, "");
        assert_eq!(report.groups[1].images, 2);

        let text = report.to_string();
        assert!(text.contains("Georeferenced"));
        assert!(text.contains("(ungrouped)"));
        assert!(text.contains("boat*"));
    }
}

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use geolabel::geo::LatLon;
use geolabel::model::{Coord, ImageSpec, LabelId, LabelProject, ObjectId};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const IMAGE_PATHS: [&str; 3] = ["/p/a.tif", "/p/b.tif", "/p/c.tif"];
pub const CLASSES: [&str; 3] = ["vehicle", "tree", "house"];

/// Fractional pixel storage multiplies and divides by the image size.
pub const EPS_PIXEL: f64 = 1e-6;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A mutation applied to a project. Label positions index into the current
/// label list modulo its length, so every operation is meaningful.
#[derive(Clone, Debug)]
pub enum Op {
    Add {
        image: usize,
        class: usize,
        x: f64,
        y: f64,
    },
    Remove(usize),
    Link(usize, usize),
    Unlink(usize),
    RemoveClass(usize),
}

pub fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..IMAGE_PATHS.len(), 0..CLASSES.len(), 0.0f64..640.0, 0.0f64..480.0)
            .prop_map(|(image, class, x, y)| Op::Add { image, class, x, y }),
        1 => any::<usize>().prop_map(Op::Remove),
        3 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Link(a, b)),
        1 => any::<usize>().prop_map(Op::Unlink),
        1 => (0..CLASSES.len()).prop_map(Op::RemoveClass),
    ]
}

pub fn arb_ops(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(arb_op(), 0..max_len)
}

pub fn base_project() -> LabelProject {
    let mut project = LabelProject::new();
    for class in CLASSES {
        project.add_class(class);
    }
    for path in IMAGE_PATHS {
        project.add_image(ImageSpec::new(path, path).with_dimensions(640, 480));
    }
    project
}

fn pick(project: &LabelProject, index: usize) -> Option<LabelId> {
    let ids: Vec<LabelId> = project.all_labels().map(|(_, l)| l.id()).collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids[index % ids.len()])
    }
}

pub fn apply(project: &mut LabelProject, op: &Op) {
    match *op {
        Op::Add { image, class, x, y } => {
            project.add_label(
                IMAGE_PATHS[image],
                CLASSES[class],
                Coord::new(x, y),
                LatLon::new(0.0, 0.0),
            );
        }
        Op::Remove(i) => {
            if let Some(id) = pick(project, i) {
                project.remove_label(id);
            }
        }
        Op::Link(i, j) => {
            if let (Some(a), Some(b)) = (pick(project, i), pick(project, j)) {
                project.link_labels(a, b);
            }
        }
        Op::Unlink(i) => {
            if let Some(id) = pick(project, i) {
                project.unlink_label(id);
            }
        }
        Op::RemoveClass(c) => {
            project.remove_class(CLASSES[c]);
            project.add_class(CLASSES[c]);
        }
    }
}

/// Labels grouped by object id, as sets of label ids.
pub fn object_partition(project: &LabelProject) -> BTreeSet<BTreeSet<LabelId>> {
    let mut groups: BTreeMap<String, BTreeSet<LabelId>> = BTreeMap::new();
    for (_, label) in project.all_labels() {
        let key: ObjectId = label.object_id();
        groups.entry(key.to_string()).or_default().insert(label.id());
    }
    groups.into_values().collect()
}

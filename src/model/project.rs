//! The label project: the aggregate root for classes, images, and labels.
//!
//! Two derived indexes make point lookup and object linking cheap:
//!
//! - label id → slot of the image holding the label
//! - object id → ids of every label sharing that object
//!
//! Every label mutation goes through a method on [`LabelProject`] that
//! updates both indexes in the same step; no raw label collection is exposed
//! mutably. Debug builds re-verify the indexes after each mutation.

use std::collections::{BTreeSet, HashMap};

use super::coord::Coord;
use super::ids::{LabelId, ObjectId};
use super::image::{GeoTransform, ImageData, ImageSpec};
use super::label::PointLabel;
use super::space::Pixel;
use crate::geo::{Affine, Epsg, LatLon};
use crate::readers::{display_name_of, DEFAULT_READER};

/// Classes, images, labels, and the indexes over them.
#[derive(Clone, Debug)]
pub struct LabelProject {
    classes: Vec<String>,
    images: Vec<ImageData>,
    image_slots: HashMap<String, usize>,
    custom_readers: Vec<(String, String)>,
    next_id: u64,
    object_index: HashMap<ObjectId, BTreeSet<LabelId>>,
    label_index: HashMap<LabelId, usize>,
}

impl Default for LabelProject {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelProject {
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            images: Vec::new(),
            image_slots: HashMap::new(),
            custom_readers: Vec::new(),
            next_id: 1,
            object_index: HashMap::new(),
            label_index: HashMap::new(),
        }
    }

    /// Assembles a project from loaded parts and builds both indexes.
    ///
    /// Images sharing a path collapse to the last one, keeping the first
    /// one's position. The id counter is raised past the highest label id if
    /// the stored value lags behind.
    pub(crate) fn from_parts(
        classes: Vec<String>,
        images: Vec<ImageData>,
        custom_readers: Vec<(String, String)>,
        next_id: u64,
    ) -> Self {
        let mut project = Self::new();

        for class_name in classes {
            if !project.add_class(class_name.clone()) {
                log::warn!("ignoring empty or duplicate class '{class_name}'");
            }
        }

        for image in images {
            match project.image_slots.get(&image.path) {
                Some(&slot) => {
                    log::warn!("duplicate image entry for {}; keeping the last", image.path);
                    project.images[slot] = image;
                }
                None => {
                    project
                        .image_slots
                        .insert(image.path.clone(), project.images.len());
                    project.images.push(image);
                }
            }
        }

        for (ext, reader) in custom_readers {
            project.register_custom_reader(ext, reader);
        }

        let highest = project.max_label_id().map_or(0, |id| id.as_u64());
        project.next_id = if next_id > highest {
            next_id
        } else {
            log::warn!("stored _next_id {next_id} is not above label id {highest}; raising it");
            highest + 1
        };

        project.rebuild_indexes();
        project
    }

    // ------------------------------------------------------------------
    // Index maintenance
    // ------------------------------------------------------------------

    fn index_object(&mut self, object_id: ObjectId, label_id: LabelId) {
        self.object_index
            .entry(object_id)
            .or_default()
            .insert(label_id);
    }

    fn unindex_object(&mut self, object_id: ObjectId, label_id: LabelId) {
        if let Some(members) = self.object_index.get_mut(&object_id) {
            members.remove(&label_id);
            if members.is_empty() {
                self.object_index.remove(&object_id);
            }
        }
    }

    fn index_label(&mut self, object_id: ObjectId, label_id: LabelId, slot: usize) {
        self.index_object(object_id, label_id);
        self.label_index.insert(label_id, slot);
    }

    fn unindex_label(&mut self, object_id: ObjectId, label_id: LabelId) {
        self.unindex_object(object_id, label_id);
        self.label_index.remove(&label_id);
    }

    /// Full reconstruction; only used after bulk load.
    fn rebuild_indexes(&mut self) {
        self.object_index.clear();
        self.label_index.clear();
        let entries: Vec<(ObjectId, LabelId, usize)> = self
            .images
            .iter()
            .enumerate()
            .flat_map(|(slot, image)| {
                image
                    .labels
                    .iter()
                    .map(move |label| (label.object_id, label.id, slot))
            })
            .collect();
        for (object_id, label_id, slot) in entries {
            self.index_label(object_id, label_id, slot);
        }
    }

    /// Differences between the live indexes and a recomputation from the
    /// image contents. Empty when the indexes are consistent.
    pub fn index_drift(&self) -> Vec<String> {
        let mut drift = Vec::new();
        let mut expected_objects: HashMap<ObjectId, BTreeSet<LabelId>> = HashMap::new();
        let mut label_count = 0usize;

        for (slot, image) in self.images.iter().enumerate() {
            for label in &image.labels {
                label_count += 1;
                expected_objects
                    .entry(label.object_id)
                    .or_default()
                    .insert(label.id);
                match self.label_index.get(&label.id) {
                    Some(&indexed) if indexed == slot => {}
                    Some(&indexed) => drift.push(format!(
                        "label {} is in {} but indexed under {}",
                        label.id,
                        image.path,
                        self.images
                            .get(indexed)
                            .map_or("<missing image>", |img| img.path.as_str())
                    )),
                    None => drift.push(format!("label {} missing from label index", label.id)),
                }
            }
        }

        if self.label_index.len() != label_count {
            drift.push(format!(
                "label index holds {} entries for {} labels",
                self.label_index.len(),
                label_count
            ));
        }

        for (object_id, members) in &expected_objects {
            match self.object_index.get(object_id) {
                Some(indexed) if indexed == members => {}
                Some(indexed) => drift.push(format!(
                    "object {object_id} indexed with {indexed:?}, expected {members:?}"
                )),
                None => drift.push(format!("object {object_id} missing from object index")),
            }
        }
        for object_id in self.object_index.keys() {
            if !expected_objects.contains_key(object_id) {
                drift.push(format!("object {object_id} indexed but no label carries it"));
            }
        }

        drift
    }

    #[inline]
    fn debug_check_indexes(&self) {
        #[cfg(debug_assertions)]
        {
            let drift = self.index_drift();
            debug_assert!(drift.is_empty(), "index drift: {drift:?}");
        }
    }

    fn label_mut(&mut self, label_id: LabelId) -> Option<&mut PointLabel> {
        let slot = *self.label_index.get(&label_id)?;
        self.images
            .get_mut(slot)?
            .labels
            .iter_mut()
            .find(|label| label.id == label_id)
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    /// Declared class names in insertion order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Adds a class. Returns false for empty or already declared names.
    pub fn add_class(&mut self, class_name: impl Into<String>) -> bool {
        let class_name = class_name.into();
        if class_name.is_empty() || self.classes.contains(&class_name) {
            return false;
        }
        self.classes.push(class_name);
        true
    }

    /// Removes a class and every label carrying it.
    ///
    /// Returns the number of labels removed, or `None` if the class was not
    /// declared.
    pub fn remove_class(&mut self, class_name: &str) -> Option<usize> {
        let position = self.classes.iter().position(|c| c == class_name)?;
        self.classes.remove(position);
        Some(self.remove_labels_where(|label| label.class_name == class_name))
    }

    /// Replaces the class list, as a class editor does.
    ///
    /// Names are trimmed, empty names dropped, duplicates removed keeping
    /// the first. Labels of every class no longer present are removed; the
    /// count of removed labels is returned.
    pub fn set_classes<I, S>(&mut self, classes: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next: Vec<String> = Vec::new();
        for name in classes {
            let name = name.as_ref().trim();
            if !name.is_empty() && !next.iter().any(|c| c == name) {
                next.push(name.to_string());
            }
        }

        let dropped: Vec<String> = self
            .classes
            .iter()
            .filter(|c| !next.contains(c))
            .cloned()
            .collect();
        self.classes = next;

        if dropped.is_empty() {
            return 0;
        }
        self.remove_labels_where(|label| dropped.contains(&label.class_name))
    }

    // ------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------

    /// Images in registration order.
    pub fn images(&self) -> impl Iterator<Item = &ImageData> {
        self.images.iter()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn image(&self, path: &str) -> Option<&ImageData> {
        self.image_slots.get(path).map(|&slot| &self.images[slot])
    }

    /// Registers an image, or returns the existing one with that path.
    ///
    /// For an existing image only the transform can change, and only if it
    /// was not already set.
    pub fn add_image(&mut self, spec: ImageSpec) -> &ImageData {
        let slot = match self.image_slots.get(&spec.path) {
            Some(&slot) => {
                let image = &mut self.images[slot];
                if image.transform.is_none() {
                    image.transform = spec.transform;
                }
                slot
            }
            None => {
                let slot = self.images.len();
                self.image_slots.insert(spec.path.clone(), slot);
                self.images.push(ImageData::from_spec(spec));
                slot
            }
        };
        &self.images[slot]
    }

    /// Moves an image to another display folder. Returns false if unknown.
    pub fn update_image_group(&mut self, path: &str, group: impl Into<String>) -> bool {
        match self.image_slots.get(path) {
            Some(&slot) => {
                self.images[slot].group = group.into();
                true
            }
            None => false,
        }
    }

    /// Sets an image's transform if it has none yet. Returns false if the
    /// image is unknown or already georeferenced.
    pub fn set_image_transform(&mut self, path: &str, affine: Affine, crs: Epsg) -> bool {
        let Some(&slot) = self.image_slots.get(path) else {
            return false;
        };
        let image = &mut self.images[slot];
        if image.transform.is_some() {
            return false;
        }
        image.transform = Some(GeoTransform::new(affine, crs));
        true
    }

    // ------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------

    /// Project-wide custom readers as `(extension, reader)` pairs.
    pub fn custom_readers(&self) -> &[(String, String)] {
        &self.custom_readers
    }

    /// Custom reader registered for an extension.
    pub fn custom_reader(&self, extension: &str) -> Option<&str> {
        self.custom_readers
            .iter()
            .find(|(ext, _)| ext == extension)
            .map(|(_, reader)| reader.as_str())
    }

    /// Registers a custom reader unless the extension already has one or
    /// the reader is the default. Returns true if registered.
    pub fn register_custom_reader(
        &mut self,
        extension: impl Into<String>,
        reader: impl Into<String>,
    ) -> bool {
        let extension = extension.into();
        let reader = reader.into();
        if reader == DEFAULT_READER || self.custom_reader(&extension).is_some() {
            return false;
        }
        self.custom_readers.push((extension, reader));
        true
    }

    // ------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------

    /// The id the next label will receive.
    pub fn next_id(&self) -> LabelId {
        LabelId::new(self.next_id)
    }

    /// Adds a label to an image, registering the image if needed.
    ///
    /// Images registered this way are named after the path's file stem and
    /// have no group, dimensions, or transform.
    pub fn add_label(
        &mut self,
        image_path: &str,
        class_name: impl Into<String>,
        pixel: Coord<Pixel>,
        position: LatLon,
    ) -> &PointLabel {
        if !self.image_slots.contains_key(image_path) {
            log::debug!("registering image {image_path} for a new label");
            self.add_image(ImageSpec::new(image_path, display_name_of(image_path)));
        }
        let slot = self.image_slots[image_path];

        let label = PointLabel::new(self.next_id, class_name, pixel, position);
        self.next_id += 1;

        let (label_id, object_id) = (label.id, label.object_id);
        self.images[slot].labels.push(label);
        self.index_label(object_id, label_id, slot);
        self.debug_check_indexes();

        let image = &self.images[slot];
        &image.labels[image.labels.len() - 1]
    }

    /// Adds a label whose WGS84 position comes from the image transform.
    ///
    /// Returns `None` if the image is unknown or not georeferenced.
    pub fn add_label_at_pixel(
        &mut self,
        image_path: &str,
        class_name: impl Into<String>,
        pixel: Coord<Pixel>,
    ) -> Option<&PointLabel> {
        let position = self.image(image_path)?.pixel_to_latlon(pixel.x, pixel.y)?;
        Some(self.add_label(image_path, class_name, pixel, position))
    }

    /// Removes a label. Returns it, or `None` if the id is unknown.
    pub fn remove_label(&mut self, label_id: LabelId) -> Option<PointLabel> {
        let slot = *self.label_index.get(&label_id)?;
        let labels = &mut self.images[slot].labels;
        let position = labels.iter().position(|label| label.id == label_id)?;
        let label = labels.remove(position);
        self.unindex_label(label.object_id, label.id);
        self.debug_check_indexes();
        Some(label)
    }

    fn remove_labels_where(&mut self, predicate: impl Fn(&PointLabel) -> bool) -> usize {
        let mut removed = Vec::new();
        for image in &mut self.images {
            let (gone, kept): (Vec<PointLabel>, Vec<PointLabel>) = std::mem::take(&mut image.labels)
                .into_iter()
                .partition(|label| predicate(label));
            image.labels = kept;
            removed.extend(gone);
        }
        for label in &removed {
            self.unindex_label(label.object_id, label.id);
        }
        self.debug_check_indexes();
        removed.len()
    }

    /// Removes every label, keeping images and classes.
    ///
    /// The id counter is not reset, so ids stay unique across the project's
    /// whole history.
    pub fn clear_labels(&mut self) {
        for image in &mut self.images {
            image.labels.clear();
        }
        self.object_index.clear();
        self.label_index.clear();
    }

    /// Removes all classes, images, labels, and custom readers.
    ///
    /// The id counter is kept.
    pub fn clear_all(&mut self) {
        self.classes.clear();
        self.images.clear();
        self.image_slots.clear();
        self.custom_readers.clear();
        self.object_index.clear();
        self.label_index.clear();
    }

    /// Total number of labels across all images.
    pub fn label_count(&self) -> usize {
        self.label_index.len()
    }

    fn max_label_id(&self) -> Option<LabelId> {
        self.images
            .iter()
            .flat_map(|image| image.labels.iter().map(|label| label.id))
            .max()
    }

    /// Every label with its image, in image then creation order.
    pub fn all_labels(&self) -> impl Iterator<Item = (&ImageData, &PointLabel)> {
        self.images
            .iter()
            .flat_map(|image| image.labels.iter().map(move |label| (image, label)))
    }

    /// Labels of one image; empty if the image is unknown.
    pub fn labels_for_image(&self, image_path: &str) -> &[PointLabel] {
        self.image(image_path).map(ImageData::labels).unwrap_or(&[])
    }

    pub fn labels_by_class<'a>(
        &'a self,
        class_name: &'a str,
    ) -> impl Iterator<Item = (&'a ImageData, &'a PointLabel)> + 'a {
        self.all_labels()
            .filter(move |(_, label)| label.class_name == class_name)
    }

    /// A label and its image, or `None` if the id is unknown.
    pub fn label_by_id(&self, label_id: LabelId) -> Option<(&ImageData, &PointLabel)> {
        let slot = *self.label_index.get(&label_id)?;
        let image = self.images.get(slot)?;
        let label = image.labels.iter().find(|label| label.id == label_id)?;
        Some((image, label))
    }

    // ------------------------------------------------------------------
    // Linking
    // ------------------------------------------------------------------

    /// Marks two labels as the same real-world object.
    ///
    /// Every label currently sharing the second label's object id moves to
    /// the first label's object id, so linking merges whole groups. Linking
    /// labels already in the same group changes nothing. Returns the shared
    /// object id, or `None` if either label is unknown.
    pub fn link_labels(&mut self, first: LabelId, second: LabelId) -> Option<ObjectId> {
        let target = self.label_by_id(first)?.1.object_id;
        let source = self.label_by_id(second)?.1.object_id;

        if target == source {
            return Some(target);
        }

        let members: Vec<LabelId> = self
            .object_index
            .get(&source)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        log::debug!(
            "merging object {source} ({} labels) into {target}",
            members.len()
        );

        for label_id in members {
            if let Some(label) = self.label_mut(label_id) {
                label.object_id = target;
            }
            self.unindex_object(source, label_id);
            self.index_object(target, label_id);
        }

        self.debug_check_indexes();
        Some(target)
    }

    /// Detaches a label from its group by giving it a fresh object id.
    ///
    /// Other members of the old group are untouched. Returns the new object
    /// id, or `None` if the label is unknown.
    pub fn unlink_label(&mut self, label_id: LabelId) -> Option<ObjectId> {
        let fresh = ObjectId::random();
        let label = self.label_mut(label_id)?;
        let previous = std::mem::replace(&mut label.object_id, fresh);

        self.unindex_object(previous, label_id);
        self.index_object(fresh, label_id);
        log::debug!("label {label_id} detached from object {previous}");

        self.debug_check_indexes();
        Some(fresh)
    }

    /// Labels sharing the given label's object id, the label included, in
    /// ascending id order.
    ///
    /// Empty unless at least two labels share the object id: a singleton
    /// group counts as "not linked".
    pub fn linked_labels(&self, label_id: LabelId) -> Vec<(&ImageData, &PointLabel)> {
        let Some((_, label)) = self.label_by_id(label_id) else {
            return Vec::new();
        };
        match self.object_index.get(&label.object_id) {
            Some(members) if members.len() > 1 => members
                .iter()
                .filter_map(|&id| self.label_by_id(id))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Number of object groups with two or more labels.
    pub fn linked_object_count(&self) -> usize {
        self.object_index
            .values()
            .filter(|members| members.len() > 1)
            .count()
    }
}

/// Splits class-editor text into class names: one per line, trimmed, empty
/// lines and repeats dropped.
pub fn parse_class_list(text: &str) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    for line in text.lines() {
        let name = line.trim();
        if !name.is_empty() && !classes.iter().any(|c| c == name) {
            classes.push(name.to_string());
        }
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo(lat: f64, lon: f64) -> LatLon {
        LatLon::new(lat, lon)
    }

    fn two_image_project() -> LabelProject {
        let mut project = LabelProject::new();
        project.add_class("vehicle");
        project.add_class("tree");
        project.add_image(ImageSpec::new("img1", "img1").with_dimensions(100, 100));
        project.add_image(ImageSpec::new("img2", "img2").with_dimensions(100, 100));
        project
    }

    #[test]
    fn test_ids_increase() {
        let mut project = two_image_project();
        let a = project
            .add_label("img1", "vehicle", Coord::new(1.0, 1.0), geo(0.0, 0.0))
            .id();
        let b = project
            .add_label("img2", "vehicle", Coord::new(2.0, 2.0), geo(0.0, 0.0))
            .id();
        assert!(b > a);
        project.remove_label(b);
        let c = project
            .add_label("img2", "tree", Coord::new(3.0, 3.0), geo(0.0, 0.0))
            .id();
        assert!(c > b);
    }

    #[test]
    fn test_add_class_rejects_empty_and_duplicates() {
        let mut project = LabelProject::new();
        assert!(project.add_class("car"));
        assert!(!project.add_class("car"));
        assert!(!project.add_class(""));
        assert_eq!(project.classes(), ["car".to_string()]);
    }

    #[test]
    fn test_add_label_registers_missing_image() {
        let mut project = LabelProject::new();
        project.add_label("/data/run/scene.tif", "car", Coord::new(1.0, 2.0), geo(1.0, 1.0));
        let image = project.image("/data/run/scene.tif").unwrap();
        assert_eq!(image.name(), "scene");
        assert_eq!(image.labels().len(), 1);
    }

    #[test]
    fn test_add_image_keeps_existing_transform() {
        let mut project = LabelProject::new();
        let first = Affine::from_origin(0.0, 0.0, 1.0, 1.0);
        let second = Affine::from_origin(5.0, 5.0, 2.0, 2.0);
        project.add_image(ImageSpec::new("a", "a"));
        project.add_image(ImageSpec::new("a", "a").with_transform(first, Epsg::WEB_MERCATOR));
        let image = project.add_image(
            ImageSpec::new("a", "renamed").with_transform(second, Epsg::WEB_MERCATOR),
        );
        assert_eq!(image.name(), "a");
        assert_eq!(image.transform().unwrap().affine, first);
        assert_eq!(project.image_count(), 1);
    }

    #[test]
    fn test_link_scenario() {
        let mut project = two_image_project();
        let a = project
            .add_label("img1", "vehicle", Coord::new(10.0, 10.0), geo(1.0, 1.0))
            .id();
        let b = project
            .add_label("img2", "vehicle", Coord::new(20.0, 20.0), geo(1.0, 1.0))
            .id();

        let object = project.link_labels(a, b).unwrap();
        assert_eq!(project.label_by_id(a).unwrap().1.object_id(), object);
        assert_eq!(project.label_by_id(b).unwrap().1.object_id(), object);

        let linked: Vec<(&str, LabelId)> = project
            .linked_labels(a)
            .into_iter()
            .map(|(image, label)| (image.path(), label.id()))
            .collect();
        assert_eq!(linked, vec![("img1", a), ("img2", b)]);
        assert!(project.index_drift().is_empty());
    }

    #[test]
    fn test_link_unknown_label() {
        let mut project = two_image_project();
        let a = project
            .add_label("img1", "vehicle", Coord::new(1.0, 1.0), geo(0.0, 0.0))
            .id();
        assert!(project.link_labels(a, LabelId(999)).is_none());
        assert!(project.link_labels(LabelId(999), a).is_none());
    }

    #[test]
    fn test_link_merges_groups() {
        let mut project = two_image_project();
        let ids: Vec<LabelId> = (0..4)
            .map(|i| {
                project
                    .add_label("img1", "tree", Coord::new(i as f64, 0.0), geo(0.0, 0.0))
                    .id()
            })
            .collect();

        let left = project.link_labels(ids[0], ids[1]).unwrap();
        project.link_labels(ids[2], ids[3]).unwrap();
        let merged = project.link_labels(ids[0], ids[2]).unwrap();

        assert_eq!(merged, left);
        assert_eq!(project.linked_labels(ids[3]).len(), 4);
        assert_eq!(project.linked_object_count(), 1);
        assert!(project.index_drift().is_empty());
    }

    #[test]
    fn test_link_is_idempotent() {
        let mut project = two_image_project();
        let a = project
            .add_label("img1", "tree", Coord::new(1.0, 1.0), geo(0.0, 0.0))
            .id();
        let b = project
            .add_label("img2", "tree", Coord::new(1.0, 1.0), geo(0.0, 0.0))
            .id();
        let first = project.link_labels(a, b).unwrap();
        let second = project.link_labels(b, a).unwrap();
        assert_eq!(first, second);
        assert_eq!(project.linked_labels(a).len(), 2);
    }

    #[test]
    fn test_unlink_leaves_rest_of_group() {
        let mut project = two_image_project();
        let ids: Vec<LabelId> = (0..3)
            .map(|i| {
                project
                    .add_label("img1", "tree", Coord::new(i as f64, 0.0), geo(0.0, 0.0))
                    .id()
            })
            .collect();
        project.link_labels(ids[0], ids[1]);
        project.link_labels(ids[0], ids[2]);

        let fresh = project.unlink_label(ids[0]).unwrap();
        assert_eq!(project.label_by_id(ids[0]).unwrap().1.object_id(), fresh);
        assert!(project.linked_labels(ids[0]).is_empty());
        assert_eq!(project.linked_labels(ids[1]).len(), 2);
        assert!(project.unlink_label(LabelId(999)).is_none());
    }

    #[test]
    fn test_singleton_is_not_linked() {
        let mut project = two_image_project();
        let a = project
            .add_label("img1", "tree", Coord::new(1.0, 1.0), geo(0.0, 0.0))
            .id();
        assert!(project.linked_labels(a).is_empty());
        assert!(project.linked_labels(LabelId(42)).is_empty());
    }

    #[test]
    fn test_remove_class_removes_its_labels() {
        let mut project = two_image_project();
        for i in 0..3 {
            project.add_label("img1", "vehicle", Coord::new(i as f64, 0.0), geo(0.0, 0.0));
        }
        project.add_label("img1", "tree", Coord::new(5.0, 5.0), geo(0.0, 0.0));
        project.add_label("img2", "tree", Coord::new(6.0, 6.0), geo(0.0, 0.0));

        assert_eq!(project.remove_class("vehicle"), Some(3));
        assert_eq!(project.label_count(), 2);
        assert!(!project.classes().iter().any(|c| c == "vehicle"));
        assert!(project.remove_class("vehicle").is_none());
        assert!(project.index_drift().is_empty());
    }

    #[test]
    fn test_remove_label_of_linked_pair() {
        let mut project = two_image_project();
        let a = project
            .add_label("img1", "tree", Coord::new(1.0, 1.0), geo(0.0, 0.0))
            .id();
        let b = project
            .add_label("img2", "tree", Coord::new(1.0, 1.0), geo(0.0, 0.0))
            .id();
        project.link_labels(a, b);

        let removed = project.remove_label(a).unwrap();
        assert_eq!(removed.id(), a);
        assert!(project.linked_labels(b).is_empty());
        assert!(project.remove_label(a).is_none());
        assert!(project.label_by_id(a).is_none());
    }

    #[test]
    fn test_set_classes_drops_removed_class_labels() {
        let mut project = two_image_project();
        project.add_label("img1", "vehicle", Coord::new(1.0, 1.0), geo(0.0, 0.0));
        project.add_label("img1", "tree", Coord::new(1.0, 1.0), geo(0.0, 0.0));

        let removed = project.set_classes(parse_class_list(" tree \n\nbuilding\ntree\n"));
        assert_eq!(removed, 1);
        assert_eq!(project.classes(), ["tree".to_string(), "building".to_string()]);
        assert_eq!(project.label_count(), 1);
    }

    #[test]
    fn test_clear_labels_keeps_counter() {
        let mut project = two_image_project();
        project.add_label("img1", "tree", Coord::new(1.0, 1.0), geo(0.0, 0.0));
        let before = project.next_id();
        project.clear_labels();
        assert_eq!(project.label_count(), 0);
        assert_eq!(project.image_count(), 2);
        assert_eq!(project.next_id(), before);

        project.clear_all();
        assert_eq!(project.image_count(), 0);
        assert!(project.classes().is_empty());
        assert_eq!(project.next_id(), before);
    }

    #[test]
    fn test_queries() {
        let mut project = two_image_project();
        project.add_label("img1", "tree", Coord::new(1.0, 1.0), geo(0.0, 0.0));
        project.add_label("img2", "vehicle", Coord::new(1.0, 1.0), geo(0.0, 0.0));
        project.add_label("img2", "tree", Coord::new(2.0, 1.0), geo(0.0, 0.0));

        assert_eq!(project.all_labels().count(), 3);
        assert_eq!(project.labels_by_class("tree").count(), 2);
        assert_eq!(project.labels_for_image("img2").len(), 2);
        assert!(project.labels_for_image("nope").is_empty());
    }

    #[test]
    fn test_add_label_at_pixel_uses_transform() {
        let mut project = LabelProject::new();
        project.add_image(ImageSpec::new("plain", "plain"));
        project.add_image(
            ImageSpec::new("geo", "geo")
                .with_dimensions(100, 100)
                .with_transform(Affine::from_origin(0.0, 0.0, 10.0, 10.0), Epsg::WEB_MERCATOR),
        );

        assert!(project
            .add_label_at_pixel("plain", "tree", Coord::new(1.0, 1.0))
            .is_none());
        assert!(project
            .add_label_at_pixel("missing", "tree", Coord::new(1.0, 1.0))
            .is_none());

        let label = project
            .add_label_at_pixel("geo", "tree", Coord::new(10.0, 20.0))
            .unwrap()
            .clone();
        let expected = project.image("geo").unwrap().pixel_to_latlon(10.0, 20.0);
        assert_eq!(Some(label.position()), expected);
    }

    #[test]
    fn test_custom_readers_first_wins() {
        let mut project = LabelProject::new();
        assert!(project.register_custom_reader("h5", "h5_gcps"));
        assert!(!project.register_custom_reader("h5", "./other.py"));
        assert!(!project.register_custom_reader("tif", "default"));
        assert_eq!(project.custom_reader("h5"), Some("h5_gcps"));
        assert_eq!(project.custom_readers().len(), 1);
    }

    #[test]
    fn test_update_image_group() {
        let mut project = two_image_project();
        assert!(project.update_image_group("img1", "flights/2024"));
        assert_eq!(project.image("img1").unwrap().group(), "flights/2024");
        assert!(!project.update_image_group("nope", "x"));
    }

    #[test]
    fn test_from_parts_raises_stale_counter() {
        let mut image = ImageData::from_spec(ImageSpec::new("a", "a"));
        image
            .labels
            .push(PointLabel::new(10u64, "car", Coord::new(0.0, 0.0), geo(0.0, 0.0)));
        let project = LabelProject::from_parts(vec!["car".into()], vec![image], vec![], 3);
        assert_eq!(project.next_id(), LabelId(11));
        assert!(project.index_drift().is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "label index holds 1 entries for 0 labels")]
    fn test_debug_check_reports_drift() {
        let mut project = two_image_project();
        project.label_index.insert(LabelId(42), 0);
        project.debug_check_indexes();
    }
}

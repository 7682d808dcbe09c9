//! The point-label project data model.
//!
//! A [`LabelProject`] owns the class list and an ordered set of
//! [`ImageData`], each owning its [`PointLabel`]s. Labels on different
//! images that mark the same real-world object share an [`ObjectId`].
//!
//! # Design Principles
//!
//! 1. **Single mutation path**: labels are only created, removed, linked,
//!    and unlinked through [`LabelProject`], so its indexes cannot drift.
//!
//! 2. **Typed coordinates**: pixel positions and storage fractions are
//!    distinct types ([`Coord<Pixel>`] and [`Coord<Normalized>`]).
//!
//! 3. **Not found is not an error**: lookups return `Option` or an empty
//!    collection.
//!
//! # Example
//!
//! ```
//! use geolabel::geo::LatLon;
//! use geolabel::model::{Coord, ImageSpec, LabelProject};
//!
//! let mut project = LabelProject::new();
//! project.add_class("vehicle");
//! project.add_image(ImageSpec::new("/data/a.tif", "a").with_dimensions(640, 480));
//! project.add_image(ImageSpec::new("/data/b.tif", "b").with_dimensions(640, 480));
//!
//! let a = project
//!     .add_label("/data/a.tif", "vehicle", Coord::new(10.0, 20.0), LatLon::new(52.0, 4.0))
//!     .id();
//! let b = project
//!     .add_label("/data/b.tif", "vehicle", Coord::new(30.0, 40.0), LatLon::new(52.0, 4.0))
//!     .id();
//!
//! project.link_labels(a, b);
//! assert_eq!(project.linked_labels(a).len(), 2);
//! ```

mod coord;
mod ids;
mod image;
pub mod io_geolabel;
mod label;
mod project;
pub mod schema;
mod space;

pub use coord::Coord;
pub use ids::{LabelId, ObjectId, UniqueId};
pub use image::{Corners, GeoTransform, ImageData, ImageSpec};
pub use label::PointLabel;
pub use project::{parse_class_list, LabelProject};
pub use schema::SchemaVersion;
pub use space::{Normalized, Pixel};

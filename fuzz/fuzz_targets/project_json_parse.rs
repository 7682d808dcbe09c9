//! Fuzz target for `.geolabel` project parsing.
//!
//! Feeds arbitrary bytes to the project loader and re-serializes anything
//! that loads, checking for panics, crashes, or hangs.

#![no_main]

use geolabel::model::io_geolabel::{from_project_slice, to_project_string};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(project) = from_project_slice(data) {
        assert!(project.index_drift().is_empty());
        let _ = to_project_string(&project);
    }
});

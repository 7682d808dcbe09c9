//! Fuzz target for single label record decoding.
//!
//! Feeds arbitrary UTF-8 to the label record entrypoint, checking for
//! panics, crashes, or hangs.

#![no_main]

use geolabel::model::io_geolabel::fuzz_parse_label_record;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let _ = fuzz_parse_label_record(input);
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Identification documents come from external search engines; malformed
    // input must error, never panic
    let _ = mzreport::mzid::read_identifications_from(Cursor::new(data), 0.01);
});

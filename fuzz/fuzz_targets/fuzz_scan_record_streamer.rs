#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the parser, only return errors
    let _ = mzreport::mzml::detect_demultiplexing(Cursor::new(data));

    if let Ok(mut streamer) = mzreport::mzml::ScanRecordStreamer::new(Cursor::new(data), false) {
        // Read up to 100 records to exercise the spectrum parsing paths
        for _ in 0..100 {
            match streamer.next_record() {
                Ok(Some(_record)) => {}
                Ok(None) => break,
                Err(_) => break,
            }
        }
    }
});

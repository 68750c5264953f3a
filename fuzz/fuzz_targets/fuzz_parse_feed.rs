#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data) {
        // Either a full list of finite points or an error, never a panic
        if let Ok(points) = pumpcontrol::prices::parse_feed(body, chrono_tz::Europe::Stockholm) {
            assert!(points.iter().all(|p| p.value.is_finite()));
        }
    }
});

#![no_main]
use libfuzzer_sys::fuzz_target;
use pumpcontrol::overrides::OverrideResolver;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data)
        && let Ok(doc) = pumpcontrol::control::ControlDocument::parse(body)
    {
        // Malformed windows are skipped, not fatal
        let tz = chrono_tz::Europe::Stockholm;
        let now = chrono::Utc::now().with_timezone(&tz);
        let _ = OverrideResolver::new(tz).resolve(&doc.overrides, now);
    }
});

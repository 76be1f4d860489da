/// The in-page probe JavaScript. Injected once per inspected tab; all
/// queries are synchronous reads against the live DOM and the
/// performance timeline.
pub const PROBE_JS: &str = include_str!("probe.js");

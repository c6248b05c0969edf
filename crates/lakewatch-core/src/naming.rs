use crate::window::DateWindow;

/// Deterministic composite identifier: `{area}{YYYY-MM-DD}{sensor}`.
///
/// With `area = "MDAS_NDWI_"` and `sensor = "_L5"` the January 1993 window
/// becomes `MDAS_NDWI_1993-01-01_L5`. Window starts are unique within a run,
/// so names are too. The name doubles as the exported file stem.
pub fn composite_name(area: &str, window: &DateWindow, sensor: &str) -> String {
    format!("{}{}{}", area, window.start.format("%Y-%m-%d"), sensor)
}

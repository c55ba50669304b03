use shared::protocol::ControlEvent;

pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 3.0;
/// One detent of the dial, matching its hardware resolution.
pub const ZOOM_STEP: f64 = 0.01;
const DIAL_START: f64 = 1.0;

/// Local state behind one key or dial.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingBehavior {
    /// Key that reports how many times it has been pressed.
    Counter { presses: i64 },
    /// Dial owning an absolute level, stepped per detent and clamped.
    Dial { level: f64 },
}

/// One configured control: what it is called on the surface and which event
/// type it emits. Every binding shares this shape; the table in
/// [`standard_bindings`] is just data.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckBinding {
    pub display_name: String,
    pub event_kind: String,
    behavior: BindingBehavior,
}

impl DeckBinding {
    pub fn counter(display_name: impl Into<String>, event_kind: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            event_kind: event_kind.into(),
            behavior: BindingBehavior::Counter { presses: 0 },
        }
    }

    pub fn dial(display_name: impl Into<String>, event_kind: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            event_kind: event_kind.into(),
            behavior: BindingBehavior::Dial { level: DIAL_START },
        }
    }

    /// Key-press path. Counters bump their running total and report it;
    /// dials do not respond to presses.
    pub fn press(&mut self) -> Option<ControlEvent> {
        match &mut self.behavior {
            BindingBehavior::Counter { presses } => {
                *presses += 1;
                Some(ControlEvent::counter(self.event_kind.clone(), *presses))
            }
            BindingBehavior::Dial { .. } => None,
        }
    }

    /// Dial-rotation path. Applies the detents to the level and reports the
    /// new absolute position. Zero-detent ticks and counters emit nothing.
    pub fn rotate(&mut self, detents: i64) -> Option<ControlEvent> {
        match &mut self.behavior {
            BindingBehavior::Dial { level } => {
                if detents == 0 {
                    return None;
                }
                let stepped = *level + detents as f64 * ZOOM_STEP;
                *level = (stepped.clamp(ZOOM_MIN, ZOOM_MAX) * 100.0).round() / 100.0;
                Some(ControlEvent::dial_value(self.event_kind.clone(), *level))
            }
            BindingBehavior::Counter { .. } => None,
        }
    }

    pub fn behavior(&self) -> &BindingBehavior {
        &self.behavior
    }

    /// Text shown on the key: name over current state.
    pub fn display_text(&self) -> String {
        match &self.behavior {
            BindingBehavior::Counter { presses } => format!("{}\n{presses}", self.display_name),
            BindingBehavior::Dial { level } => format!("{}\n{level:.2}", self.display_name),
        }
    }
}

/// The stock binding table: six press counters and the zoom dial.
pub fn standard_bindings() -> Vec<DeckBinding> {
    vec![
        DeckBinding::counter("Press Counter", "pressCount"),
        DeckBinding::counter("Press Counter X", "pressCountX"),
        DeckBinding::counter("Move X-", "MoveXMinus"),
        DeckBinding::counter("Export", "Export"),
        DeckBinding::counter("Copy", "Copy"),
        DeckBinding::counter("Create Mesh", "CreateMeshAI"),
        DeckBinding::dial("Zoom", "zoom"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_binding_reports_a_running_total() {
        let mut binding = DeckBinding::counter("Press Counter", "pressCount");
        let first = binding.press().expect("envelope");
        let second = binding.press().expect("envelope");
        assert_eq!(first, ControlEvent::counter("pressCount", 1));
        assert_eq!(second, ControlEvent::counter("pressCount", 2));
        assert_eq!(binding.display_text(), "Press Counter\n2");
        assert_eq!(binding.rotate(3), None);
    }

    #[test]
    fn dial_binding_steps_and_clamps_its_level() {
        let mut binding = DeckBinding::dial("Zoom", "zoom");
        assert_eq!(binding.rotate(0), None);
        assert_eq!(binding.press(), None);

        let up = binding.rotate(10).expect("envelope");
        assert_eq!(up.value, Some(1.1));

        let down = binding.rotate(-100).expect("envelope");
        assert_eq!(down.value, Some(ZOOM_MIN));

        let pegged = binding.rotate(1000).expect("envelope");
        assert_eq!(pegged.value, Some(ZOOM_MAX));
        assert_eq!(binding.display_text(), "Zoom\n3.00");
    }

    #[test]
    fn the_stock_table_covers_every_surface_control() {
        let bindings = standard_bindings();
        assert_eq!(bindings.len(), 7);

        let kinds: Vec<_> = bindings.iter().map(|b| b.event_kind.as_str()).collect();
        assert!(kinds.contains(&"pressCount"));
        assert!(kinds.contains(&"Export"));
        assert!(kinds.contains(&"zoom"));

        for binding in bindings.iter().filter(|b| b.event_kind != "zoom") {
            let mut fresh = binding.clone();
            assert_eq!(fresh.press().and_then(|e| e.count), Some(1));
        }
    }
}

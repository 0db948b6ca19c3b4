//! Built-in starting diagrams.
//!
//! Presets are what a new session shows before the user has typed anything.
//! A source that is exactly a preset is never written into a share link,
//! so untouched sessions keep a clean address.

/// A named built-in diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    name: &'static str,
    source: &'static str,
}

impl Preset {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn source(&self) -> &'static str {
        self.source
    }
}

/// All presets. The first one is the default starting diagram.
pub const PRESETS: &[Preset] = &[
    Preset {
        name: "flowchart",
        source: "\
flowchart TD
    Start([Start]) --> Edit[Edit the diagram]
    Edit --> Preview{Looks right?}
    Preview -- No --> Edit
    Preview -- Yes --> Share[Copy the share link]
    Share --> Done([Done])
",
    },
    Preset {
        name: "sequence",
        source: "\
sequenceDiagram
    participant Editor
    participant Scheduler
    participant Renderer
    Editor->>Scheduler: edit
    Scheduler->>Renderer: render latest source
    Renderer-->>Scheduler: markup
    Scheduler-->>Editor: apply if still current
",
    },
    Preset {
        name: "class",
        source: "\
classDiagram
    class Session {
        +source: String
        +edit(text)
        +apply_preset(name)
    }
    class RenderScheduler {
        +on_edit(source)
        +commit_now(source)
    }
    class ViewportController {
        +zoom_by_factor(f)
        +fit_to_view()
    }
    Session --> RenderScheduler
    Session --> ViewportController
",
    },
    Preset {
        name: "state",
        source: "\
stateDiagram-v2
    [*] --> Idle
    Idle --> Dragging: pointer down
    Dragging --> Dragging: pointer move
    Dragging --> Idle: pointer up
    Dragging --> Idle: pointer cancel
",
    },
];

/// Returns the default starting preset.
pub fn default_preset() -> &'static Preset {
    &PRESETS[0]
}

/// Looks up a preset by name, ignoring ASCII case.
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name.trim()))
}

/// Returns `true` if `source` is exactly the text of a preset.
pub fn is_preset(source: &str) -> bool {
    PRESETS.iter().any(|preset| preset.source == source)
}

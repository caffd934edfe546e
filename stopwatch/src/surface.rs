//! The display layer a stopwatch draws on.
//!
//! A [`Surface`] is whatever holds the elements: a browser document, a
//! terminal form, or the in-memory [`Page`] used by tests and the CLI.
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the toggle control offers to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlState {
    /// The stopwatch is running; clicking pauses it.
    Pause,
    /// The stopwatch is paused; clicking resumes it.
    Resume,
}

impl ControlState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pause => "Pause",
            Self::Resume => "Resume",
        }
    }

    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Pause => "sw-pause",
            Self::Resume => "sw-resume",
        }
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Pause => Self::Resume,
            Self::Resume => Self::Pause,
        }
    }
}

pub trait Surface {
    /// Current text of a field, or `None` if the element does not exist.
    fn value(&self, element: ElementId) -> Option<String>;

    fn contains(&self, element: ElementId) -> bool {
        self.value(element).is_some()
    }

    fn set_value(&mut self, element: ElementId, value: &str);

    /// Empty the element's rendered content.
    fn clear(&mut self, element: ElementId);

    /// Create a toggle button placed right after `after`.
    fn insert_control(
        &mut self,
        after: ElementId,
        state: ControlState,
    ) -> ElementId;

    fn update_control(&mut self, control: ElementId, state: ControlState);

    fn remove_control(&mut self, control: ElementId);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Input,
    Button,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub text: String,
    pub classes: BTreeSet<String>,
}

impl Element {
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// In-memory document: a flat, ordered list of elements.
#[derive(Debug, Default)]
pub struct Page {
    next_id: u32,
    elements: HashMap<ElementId, Element>,
    order: Vec<ElementId>,
}

impl Page {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text input holding `value`.
    pub fn add_input(&mut self, value: &str) -> ElementId {
        let id = self.allocate();
        self.elements.insert(
            id,
            Element {
                kind: ElementKind::Input,
                text: value.to_string(),
                classes: BTreeSet::new(),
            },
        );
        self.order.push(id);
        id
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// All buttons currently on the page, in document order.
    #[must_use]
    pub fn buttons(&self) -> Vec<ElementId> {
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.elements
                    .get(id)
                    .is_some_and(|e| e.kind == ElementKind::Button)
            })
            .collect()
    }

    /// Element placed directly after `id`, if any.
    #[must_use]
    pub fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        let position = self.order.iter().position(|e| *e == id)?;
        self.order.get(position + 1).copied()
    }

    fn allocate(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    fn apply_control_state(element: &mut Element, state: ControlState) {
        element.text = state.label().to_string();
        element.classes.remove(state.flipped().class());
        element.classes.insert(state.class().to_string());
    }
}

impl Surface for Page {
    fn value(&self, element: ElementId) -> Option<String> {
        self.elements.get(&element).map(|e| e.text.clone())
    }

    fn contains(&self, element: ElementId) -> bool {
        self.elements.contains_key(&element)
    }

    fn set_value(&mut self, element: ElementId, value: &str) {
        if let Some(e) = self.elements.get_mut(&element) {
            e.text = value.to_string();
        }
    }

    fn clear(&mut self, element: ElementId) {
        if let Some(e) = self.elements.get_mut(&element) {
            e.text.clear();
        }
    }

    fn insert_control(
        &mut self,
        after: ElementId,
        state: ControlState,
    ) -> ElementId {
        let id = self.allocate();
        let mut button = Element {
            kind: ElementKind::Button,
            text: String::new(),
            classes: BTreeSet::new(),
        };
        Self::apply_control_state(&mut button, state);
        self.elements.insert(id, button);

        let position = self
            .order
            .iter()
            .position(|e| *e == after)
            .map_or(self.order.len(), |p| p + 1);
        self.order.insert(position, id);
        id
    }

    fn update_control(&mut self, control: ElementId, state: ControlState) {
        if let Some(e) = self.elements.get_mut(&control) {
            Self::apply_control_state(e, state);
        }
    }

    fn remove_control(&mut self, control: ElementId) {
        self.elements.remove(&control);
        self.order.retain(|e| *e != control);
    }
}

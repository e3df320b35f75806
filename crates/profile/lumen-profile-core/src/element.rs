//! The profile tree: an arena of layers and folders indexed by stable ids.
//!
//! Children hold ids, parents are non-owning back-references, and every
//! structural edit is validated synchronously so the composer can walk the
//! tree each tick without re-checking shape invariants.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use lumen_api_core::{coercion, Value, ValueKind};
use lumen_timeline_core::{ease, KeyframeTrack, MainRepeat, Timeline};

use crate::binding::{BindingError, DataBinding};
use crate::condition::{ActivityState, Condition};
use crate::error::ProfileError;
use crate::scripting::ScriptContext;
use crate::surface::{LedBuffer, LedId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

/// One animatable property of a layer. The base value comes from the
/// keyframe track when one exists, otherwise from the static value; an
/// enabled data binding then folds its modifiers over the base.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerProperty {
    pub value: Value,
    pub track: Option<KeyframeTrack>,
    /// Attached through [`LayerProperty::set_binding`] so the kind check
    /// cannot be skipped.
    binding: Option<DataBinding>,
}

impl LayerProperty {
    pub fn fixed(value: Value) -> Self {
        Self {
            value,
            track: None,
            binding: None,
        }
    }

    pub fn animated(track: KeyframeTrack) -> Self {
        Self {
            value: Value::default(),
            track: Some(track),
            binding: None,
        }
    }

    /// Kind of the property's base value; keyframed properties take the kind
    /// of their first key.
    pub fn kind(&self) -> ValueKind {
        self.track
            .as_ref()
            .and_then(|track| track.keys().first())
            .map(|key| key.value.kind())
            .unwrap_or_else(|| self.value.kind())
    }

    /// Attach a binding. Like pushing a modifier, attaching is validated
    /// against the property's kind at configuration time, never during the
    /// frame.
    pub fn with_binding(mut self, binding: DataBinding) -> Result<Self, BindingError> {
        self.set_binding(binding)?;
        Ok(self)
    }

    pub fn set_binding(&mut self, binding: DataBinding) -> Result<(), BindingError> {
        let kind = self.kind();
        if binding.target() != kind {
            return Err(BindingError::TargetKindMismatch {
                binding: binding.target(),
                property: kind,
            });
        }
        self.binding = Some(binding);
        Ok(())
    }

    pub fn binding(&self) -> Option<&DataBinding> {
        self.binding.as_ref()
    }

    pub fn binding_mut(&mut self) -> Option<&mut DataBinding> {
        self.binding.as_mut()
    }

    pub fn clear_binding(&mut self) -> Option<DataBinding> {
        self.binding.take()
    }

    /// Timeline-sampled base value, before bindings.
    pub fn base_value(&self, position: f32) -> Value {
        match &self.track {
            Some(track) => track.sample(position).unwrap_or_else(|| self.value.clone()),
            None => self.value.clone(),
        }
    }

    /// Fully resolved value for this tick.
    pub fn resolve(&mut self, position: f32, ctx: &mut ScriptContext<'_>) -> Value {
        let base = self.base_value(position);
        match &mut self.binding {
            Some(binding) => binding.apply(base, ctx),
            None => base,
        }
    }
}

/// Brush painting a layer's LEDs from its resolved properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Brush {
    /// One color for every LED, from the `color` and `opacity` properties.
    #[default]
    Solid,
    /// Linear blend from `color` to `color_end` across the LED list order.
    Gradient,
}

impl Brush {
    /// Write one color per assigned LED into the frame buffer.
    pub fn paint(
        &self,
        resolved: &HashMap<String, Value>,
        leds: &[LedId],
        buffer: &mut LedBuffer,
    ) {
        let opacity = resolved
            .get("opacity")
            .map(coercion::to_float)
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);
        let color = resolved
            .get("color")
            .map(coercion::to_color)
            .unwrap_or([0.0, 0.0, 0.0, 1.0]);
        match self {
            Brush::Solid => {
                let out = with_opacity(color, opacity);
                for led in leds {
                    buffer.write(*led, out);
                }
            }
            Brush::Gradient => {
                let end = resolved
                    .get("color_end")
                    .map(coercion::to_color)
                    .unwrap_or(color);
                let span = leds.len().saturating_sub(1).max(1) as f32;
                for (i, led) in leds.iter().enumerate() {
                    let t = i as f32 / span;
                    buffer.write(*led, with_opacity(ease::lerp_color(color, end, t), opacity));
                }
            }
        }
    }
}

fn with_opacity(color: [f32; 4], opacity: f32) -> [f32; 4] {
    [color[0], color[1], color[2], color[3] * opacity]
}

/// Layer-only payload: the brush and the LEDs it covers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerData {
    pub brush: Brush,
    pub leds: Vec<LedId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ElementKind {
    Folder,
    Layer(LayerData),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileElement {
    pub id: ElementId,
    pub name: String,
    pub kind: ElementKind,
    pub condition: Condition,
    pub timeline: Timeline,
    pub properties: HashMap<String, LayerProperty>,
    /// Ordered child ids; meaningful for folders only. Order index == render
    /// order: later children composite over earlier ones.
    pub children: Vec<ElementId>,
    /// Non-owning back-reference, for queries only.
    pub parent: Option<ElementId>,
    #[serde(skip)]
    pub activity: ActivityState,
}

impl ProfileElement {
    fn new(id: ElementId, name: String, kind: ElementKind) -> Self {
        Self {
            id,
            name,
            kind,
            condition: Condition::AlwaysOn,
            timeline: Timeline::new(0.0, 1.0, 0.0, MainRepeat::Loop),
            properties: HashMap::new(),
            children: Vec::new(),
            parent: None,
            activity: ActivityState::Idle,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ElementKind::Folder)
    }
}

/// Arena of profile elements plus the ordered root list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileTree {
    elements: HashMap<ElementId, ProfileElement>,
    roots: Vec<ElementId>,
    next_id: u32,
}

impl ProfileTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    pub fn element(&self, id: ElementId) -> Option<&ProfileElement> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut ProfileElement> {
        self.elements.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append a new element under `parent` (or as a root). The parent must
    /// be a folder.
    pub fn add_element(
        &mut self,
        parent: Option<ElementId>,
        name: impl Into<String>,
        kind: ElementKind,
    ) -> Result<ElementId, ProfileError> {
        if let Some(pid) = parent {
            let folder = self
                .elements
                .get(&pid)
                .ok_or(ProfileError::UnknownElement(pid))?;
            if !folder.is_folder() {
                return Err(ProfileError::NotAFolder(pid));
            }
        }
        let id = self.allocate();
        let mut element = ProfileElement::new(id, name.into(), kind);
        element.parent = parent;
        self.elements.insert(id, element);
        match parent {
            Some(pid) => {
                if let Some(folder) = self.elements.get_mut(&pid) {
                    folder.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Remove an element and its entire subtree.
    pub fn remove_element(&mut self, id: ElementId) -> Result<(), ProfileError> {
        let element = self
            .elements
            .get(&id)
            .ok_or(ProfileError::UnknownElement(id))?;
        let parent = element.parent;
        match parent {
            Some(pid) => {
                if let Some(folder) = self.elements.get_mut(&pid) {
                    folder.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|c| *c != id),
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(removed) = self.elements.remove(&current) {
                stack.extend(removed.children);
            }
        }
        Ok(())
    }

    /// Re-parent an element, inserting it at `index` among the new siblings.
    /// Moving a folder into its own subtree is rejected.
    pub fn move_element(
        &mut self,
        id: ElementId,
        new_parent: Option<ElementId>,
        index: usize,
    ) -> Result<(), ProfileError> {
        if !self.elements.contains_key(&id) {
            return Err(ProfileError::UnknownElement(id));
        }
        if let Some(pid) = new_parent {
            let folder = self
                .elements
                .get(&pid)
                .ok_or(ProfileError::UnknownElement(pid))?;
            if !folder.is_folder() {
                return Err(ProfileError::NotAFolder(pid));
            }
            if pid == id || self.is_descendant(pid, id) {
                return Err(ProfileError::MoveIntoDescendant {
                    element: id,
                    target: pid,
                });
            }
        }

        let old_parent = self.elements[&id].parent;
        match old_parent {
            Some(pid) => {
                if let Some(folder) = self.elements.get_mut(&pid) {
                    folder.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|c| *c != id),
        }

        match new_parent {
            Some(pid) => {
                let folder = self.elements.get_mut(&pid).ok_or(ProfileError::UnknownElement(pid))?;
                let clamped = index.min(folder.children.len());
                folder.children.insert(clamped, id);
            }
            None => {
                let clamped = index.min(self.roots.len());
                self.roots.insert(clamped, id);
            }
        }
        if let Some(element) = self.elements.get_mut(&id) {
            element.parent = new_parent;
        }
        Ok(())
    }

    /// Move a child within its parent's order list.
    pub fn reorder_child(
        &mut self,
        parent: Option<ElementId>,
        from: usize,
        to: usize,
    ) -> Result<(), ProfileError> {
        let (list, pid) = match parent {
            Some(pid) => {
                let folder = self
                    .elements
                    .get_mut(&pid)
                    .ok_or(ProfileError::UnknownElement(pid))?;
                if !folder.is_folder() {
                    return Err(ProfileError::NotAFolder(pid));
                }
                (&mut folder.children, pid)
            }
            None => (&mut self.roots, ElementId(u32::MAX)),
        };
        let len = list.len();
        if from >= len {
            return Err(ProfileError::IndexOutOfRange {
                parent: pid,
                index: from,
                len,
            });
        }
        let id = list.remove(from);
        list.insert(to.min(len - 1), id);
        Ok(())
    }

    pub fn replace_condition(
        &mut self,
        id: ElementId,
        condition: Condition,
    ) -> Result<(), ProfileError> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(ProfileError::UnknownElement(id))?;
        element.condition = condition;
        element.activity = ActivityState::Idle;
        element.timeline.reset();
        Ok(())
    }

    pub fn set_segment_durations(
        &mut self,
        id: ElementId,
        start_len: f32,
        main_len: f32,
        end_len: f32,
    ) -> Result<(), ProfileError> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(ProfileError::UnknownElement(id))?;
        element.timeline.set_durations(start_len, main_len, end_len);
        Ok(())
    }

    /// Current activity of an element, for editor preview.
    pub fn activity(&self, id: ElementId) -> Option<ActivityState> {
        self.elements.get(&id).map(|e| e.activity)
    }

    /// Current playback position of an element's timeline.
    pub fn timeline_position(&self, id: ElementId) -> Option<f32> {
        self.elements.get(&id).map(|e| e.timeline.position())
    }

    /// Whether `candidate` sits somewhere below `ancestor`.
    fn is_descendant(&self, candidate: ElementId, ancestor: ElementId) -> bool {
        let mut stack: Vec<ElementId> = self
            .elements
            .get(&ancestor)
            .map(|e| e.children.clone())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            if current == candidate {
                return true;
            }
            if let Some(element) = self.elements.get(&current) {
                stack.extend(element.children.iter().copied());
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_timeline_core::Keyframe;

    #[test]
    fn layers_cannot_hold_children() {
        let mut tree = ProfileTree::new();
        let layer = tree
            .add_element(None, "layer", ElementKind::Layer(LayerData::default()))
            .unwrap();
        let err = tree
            .add_element(Some(layer), "child", ElementKind::Folder)
            .unwrap_err();
        assert_eq!(err, ProfileError::NotAFolder(layer));
    }

    #[test]
    fn remove_drops_the_whole_subtree() {
        let mut tree = ProfileTree::new();
        let folder = tree.add_element(None, "folder", ElementKind::Folder).unwrap();
        let inner = tree.add_element(Some(folder), "inner", ElementKind::Folder).unwrap();
        tree.add_element(Some(inner), "layer", ElementKind::Layer(LayerData::default()))
            .unwrap();
        tree.remove_element(folder).unwrap();
        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn move_into_own_subtree_is_rejected() {
        let mut tree = ProfileTree::new();
        let outer = tree.add_element(None, "outer", ElementKind::Folder).unwrap();
        let inner = tree.add_element(Some(outer), "inner", ElementKind::Folder).unwrap();
        let err = tree.move_element(outer, Some(inner), 0).unwrap_err();
        assert!(matches!(err, ProfileError::MoveIntoDescendant { .. }));
        assert_eq!(tree.element(outer).unwrap().parent, None);
    }

    #[test]
    fn reorder_changes_render_order() {
        let mut tree = ProfileTree::new();
        let a = tree
            .add_element(None, "a", ElementKind::Layer(LayerData::default()))
            .unwrap();
        let b = tree
            .add_element(None, "b", ElementKind::Layer(LayerData::default()))
            .unwrap();
        tree.reorder_child(None, 1, 0).unwrap();
        assert_eq!(tree.roots(), &[b, a]);
    }

    #[test]
    fn binding_target_kind_must_match_the_property() {
        use crate::binding::{DataBinding, DataBindingModifier, ModifierKind};

        let mut binding = DataBinding::new(ValueKind::Float);
        binding
            .push_modifier(DataBindingModifier::literal(
                ModifierKind::Add,
                Value::Float(1.0),
            ))
            .unwrap();

        let err = LayerProperty::fixed(Value::Text("hello".into()))
            .with_binding(binding.clone())
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::TargetKindMismatch {
                binding: ValueKind::Float,
                property: ValueKind::Text,
            }
        );

        // Matching kinds attach fine, keyed off the first keyframe for
        // animated properties.
        let track = KeyframeTrack::from_keys([
            Keyframe::new(0.0, Value::Float(0.0)),
            Keyframe::new(1.0, Value::Float(1.0)),
        ])
        .unwrap();
        assert!(LayerProperty::animated(track).with_binding(binding).is_ok());
    }

    #[test]
    fn replace_condition_resets_runtime_state() {
        let mut tree = ProfileTree::new();
        let id = tree
            .add_element(None, "layer", ElementKind::Layer(LayerData::default()))
            .unwrap();
        {
            let element = tree.element_mut(id).unwrap();
            element.activity = ActivityState::Active;
            element.timeline.trigger();
            element.timeline.advance(0.5);
        }
        tree.replace_condition(id, Condition::AlwaysOn).unwrap();
        assert_eq!(tree.activity(id), Some(ActivityState::Idle));
        assert_eq!(tree.timeline_position(id), Some(0.0));
    }
}

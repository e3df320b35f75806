//! Per-frame tree walk and LED compositing.
//!
//! `Composer::tick` runs the whole frame: condition step, timeline advance,
//! property resolution and brush painting for every element, depth-first in
//! order. Later siblings paint over earlier ones; a folder whose condition is
//! idle gates its entire subtree. Script failures are collected per element
//! and reported, never propagated out of the tick.

use hashbrown::{HashMap, HashSet};

use lumen_api_core::Value;
use lumen_graph_core::{DataModelResolver, NodeRegistry, ScriptError};

use crate::element::{ElementId, ElementKind, ProfileTree};
use crate::surface::{LedBuffer, LedSurface};

/// One element's failure during a tick. The element rendered nothing this
/// frame; siblings were unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementError {
    pub element: ElementId,
    pub name: String,
    pub error: ScriptError,
}

/// Outcome of one tick: the frame counter, the colors produced and every
/// isolated element failure.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub epoch: u64,
    pub dt: f32,
    pub buffer: LedBuffer,
    pub errors: Vec<ElementError>,
}

pub struct Composer {
    tree: ProfileTree,
    surface: LedSurface,
    registry: NodeRegistry,
    data_model: Option<Box<dyn DataModelResolver>>,
    buffer: LedBuffer,
    epoch: u64,
    /// Host trigger pulses, consumed by the next tick.
    pending_triggers: HashSet<ElementId>,
}

impl Composer {
    pub fn new(surface: LedSurface) -> Self {
        Self {
            tree: ProfileTree::new(),
            surface,
            registry: NodeRegistry::default(),
            data_model: None,
            buffer: LedBuffer::default(),
            epoch: 0,
            pending_triggers: HashSet::new(),
        }
    }

    pub fn tree(&self) -> &ProfileTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ProfileTree {
        &mut self.tree
    }

    pub fn surface(&self) -> &LedSurface {
        &self.surface
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    pub fn set_data_model(&mut self, resolver: Box<dyn DataModelResolver>) {
        self.data_model = Some(resolver);
    }

    /// Colors produced by the most recent tick.
    pub fn buffer(&self) -> &LedBuffer {
        &self.buffer
    }

    /// Queue a one-tick trigger pulse for an element, OR-ed with its own
    /// condition script on the next tick.
    pub fn trigger_element(&mut self, id: ElementId) {
        self.pending_triggers.insert(id);
    }

    /// Resolve one property at the element's current playback position,
    /// bindings included. Preview query for editors; advances no time.
    pub fn resolved_property(&mut self, id: ElementId, name: &str) -> Option<Value> {
        let mut ctx =
            crate::scripting::ScriptContext::new(0.0, self.data_model.as_deref(), &self.registry);
        let element = self.tree.element_mut(id)?;
        let position = element.timeline.position();
        let property = element.properties.get_mut(name)?;
        Some(property.resolve(position, &mut ctx))
    }

    /// Advance every element by `dt` seconds and composite one frame.
    pub fn tick(&mut self, dt: f32) -> FrameReport {
        self.epoch = self.epoch.wrapping_add(1);
        self.buffer.begin_frame(&self.surface);
        let mut errors = Vec::new();

        let roots: Vec<ElementId> = self.tree.roots().to_vec();
        for id in roots {
            Self::visit(
                &mut self.tree,
                id,
                true,
                dt,
                &self.registry,
                self.data_model.as_deref(),
                &mut self.pending_triggers,
                &mut self.buffer,
                &mut errors,
            );
        }
        self.pending_triggers.clear();

        FrameReport {
            epoch: self.epoch,
            dt,
            buffer: self.buffer.clone(),
            errors,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        tree: &mut ProfileTree,
        id: ElementId,
        parent_visible: bool,
        dt: f32,
        registry: &NodeRegistry,
        data_model: Option<&dyn DataModelResolver>,
        triggers: &mut HashSet<ElementId>,
        buffer: &mut LedBuffer,
        errors: &mut Vec<ElementError>,
    ) {
        // An idle folder freezes its subtree: no condition steps, no
        // timeline advancement, nothing painted.
        if !parent_visible {
            return;
        }

        let external_trigger = triggers.remove(&id);
        let mut ctx = crate::scripting::ScriptContext::new(dt, data_model, registry);

        let (visible, children, paint) = {
            let element = match tree.element_mut(id) {
                Some(element) => element,
                None => return,
            };
            let mut activity = element.activity;
            element
                .condition
                .step(&mut activity, &mut element.timeline, external_trigger, &mut ctx);
            let completed = if activity.is_visible() {
                element.timeline.advance(dt)
            } else {
                false
            };
            element
                .condition
                .after_advance(&mut activity, &mut element.timeline, completed);
            element.activity = activity;

            let visible = activity.is_visible();
            let paint = match (&element.kind, visible) {
                (ElementKind::Layer(layer), true) => {
                    let position = element.timeline.position();
                    let mut resolved: HashMap<String, Value> = HashMap::new();
                    let names: Vec<String> = element.properties.keys().cloned().collect();
                    for name in names {
                        if let Some(property) = element.properties.get_mut(&name) {
                            let value = property.resolve(position, &mut ctx);
                            resolved.insert(name, value);
                        }
                    }
                    Some((layer.brush.clone(), layer.leds.clone(), resolved))
                }
                _ => None,
            };
            (visible, element.children.clone(), paint)
        };

        let failed = !ctx.errors.is_empty();
        if failed {
            let name = tree
                .element(id)
                .map(|e| e.name.clone())
                .unwrap_or_default();
            errors.extend(ctx.errors.drain(..).map(|error| ElementError {
                element: id,
                name: name.clone(),
                error,
            }));
        }

        // A failed element contributes nothing this frame.
        if let (Some((brush, leds, resolved)), false) = (paint, failed) {
            brush.paint(&resolved, &leds, buffer);
        }

        for child in children {
            Self::visit(
                tree,
                child,
                visible,
                dt,
                registry,
                data_model,
                triggers,
                buffer,
                errors,
            );
        }
    }
}

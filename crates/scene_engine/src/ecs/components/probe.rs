//! Probe components for the reserved test slots
//!
//! A probe counts how often each phase hook ran and can append a line per
//! hook to a shared [`Journal`], which makes dispatch order observable.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ecs::component::{
    parse_attribute, Attribute, AttributeError, Component, ComponentContext, ComponentKind, ComponentState,
    ComponentType,
};
use crate::ecs::GameObjectId;
use crate::foundation::math::{Mat4, Transform};

/// Shared, ordered log of hook invocations
pub type Journal = Rc<RefCell<Vec<String>>>;

/// Probe in reserved slot 1
pub type Probe1 = Probe<1>;
/// Probe in reserved slot 2
pub type Probe2 = Probe<2>;
/// Probe in reserved slot 3
pub type Probe3 = Probe<3>;

/// Counting component for one of the three reserved slots
#[derive(Debug, Clone, PartialEq)]
pub struct Probe<const SLOT: u8> {
    state: ComponentState,
    journal: Option<Journal>,
    /// Free-form label, editable through attributes
    pub label: String,
    /// Event hook calls
    pub events: u32,
    /// Input hook calls
    pub inputs: u32,
    /// Loop hook calls
    pub loops: u32,
    /// Render hook calls
    pub renders: u32,
    /// World transform seen by the most recent hook
    pub last_world: Option<Transform>,
    /// Model-view matrix seen by the most recent render hook
    pub last_model_view: Option<Mat4>,
}

impl<const SLOT: u8> Probe<SLOT> {
    const SLOT_KIND: ComponentKind = match SLOT {
        1 => ComponentKind::Probe1,
        2 => ComponentKind::Probe2,
        _ => ComponentKind::Probe3,
    };

    /// Fresh probe with zeroed counters
    pub fn with_owner(owner: GameObjectId) -> Self {
        Self {
            state: ComponentState::new(owner),
            journal: None,
            label: String::new(),
            events: 0,
            inputs: 0,
            loops: 0,
            renders: 0,
            last_world: None,
            last_model_view: None,
        }
    }

    /// Append hook invocations to `journal` as `"<owner>:<kind>:<phase>"`
    pub fn attach_journal(&mut self, journal: Journal) {
        self.journal = Some(journal);
    }

    /// Sum of all hook calls
    pub const fn total_calls(&self) -> u32 {
        self.events + self.inputs + self.loops + self.renders
    }

    fn record(&mut self, ctx: &ComponentContext<'_, '_>, phase: &str) {
        self.last_world = Some(ctx.world_transform.clone());
        if let Some(journal) = &self.journal {
            journal
                .borrow_mut()
                .push(format!("{}:{}:{}", ctx.owner_name, Self::SLOT_KIND, phase));
        }
    }
}

impl<const SLOT: u8> Component for Probe<SLOT> {
    fn kind(&self) -> ComponentKind {
        Self::SLOT_KIND
    }

    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn on_event(&mut self, ctx: &mut ComponentContext<'_, '_>) {
        self.events += 1;
        self.record(ctx, "event");
    }

    fn on_input(&mut self, ctx: &mut ComponentContext<'_, '_>) {
        self.inputs += 1;
        self.record(ctx, "input");
    }

    fn on_loop(&mut self, ctx: &mut ComponentContext<'_, '_>) {
        self.loops += 1;
        self.record(ctx, "loop");
    }

    fn on_render(&mut self, ctx: &mut ComponentContext<'_, '_>, _projection: &Mat4, model_view: &Mat4) {
        self.renders += 1;
        self.last_model_view = Some(*model_view);
        self.record(ctx, "render");
    }

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            Attribute::new("label", "string", &self.label),
            Attribute::new("loops", "u32", self.loops),
            Attribute::new("renders", "u32", self.renders),
        ]
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), AttributeError> {
        match name {
            "label" => self.label = value.trim().to_string(),
            "loops" => self.loops = parse_attribute(name, value, "u32")?,
            "renders" => self.renders = parse_attribute(name, value, "u32")?,
            _ => return Err(AttributeError::unknown(Self::SLOT_KIND, name)),
        }
        Ok(())
    }
}

macro_rules! probe_slot {
    ($slot:literal, $field:ident) => {
        impl ComponentType for Probe<$slot> {
            const KIND: ComponentKind = Self::SLOT_KIND;

            fn new(owner: GameObjectId) -> Self {
                Self::with_owner(owner)
            }

            stored_in_slot!($field);
        }
    };
}

probe_slot!(1, probe1);
probe_slot!(2, probe2);
probe_slot!(3, probe3);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_map_to_distinct_kinds() {
        assert_eq!(Probe1::KIND, ComponentKind::Probe1);
        assert_eq!(Probe2::KIND, ComponentKind::Probe2);
        assert_eq!(Probe3::KIND, ComponentKind::Probe3);

        let probe = Probe2::with_owner(GameObjectId::default());
        assert_eq!(probe.kind(), ComponentKind::Probe2);
        assert_eq!(probe.total_calls(), 0);
    }

    #[test]
    fn label_is_editable() {
        let mut probe = Probe3::with_owner(GameObjectId::default());
        probe.set_attribute("label", " marker ").unwrap();
        assert_eq!(probe.label, "marker");
        assert!(matches!(
            probe.set_attribute("nope", "1"),
            Err(AttributeError::Unknown { component: ComponentKind::Probe3, .. })
        ));
    }
}

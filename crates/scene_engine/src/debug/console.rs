//! Debug console
//!
//! Commands:
//!
//! ```text
//! list
//! show <object> [component]
//! set <object> <component> <attribute> <value...>
//! enable <object> [recursive]
//! disable <object> [recursive]
//! help
//! ```

use crate::ecs::{AttributeError, ComponentKind, GameObjectId, World};

const HELP: [&str; 6] = [
    "list",
    "show <object> [component]",
    "set <object> <component> <attribute> <value...>",
    "enable <object> [recursive]",
    "disable <object> [recursive]",
    "help",
];

/// Console command failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Blank input
    #[error("empty command")]
    Empty,

    /// First word is not a command
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),

    /// Wrong arguments for a known command
    #[error("usage: {0}")]
    Usage(&'static str),

    /// No registered object with that name
    #[error("no object named `{0}`")]
    UnknownObject(String),

    /// Component name does not map to a kind
    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    /// Object has no component of that kind
    #[error("`{object}` has no {component} component")]
    ComponentAbsent {
        /// Object name
        object: String,
        /// Requested kind
        component: ComponentKind,
    },

    /// Attribute edit rejected
    #[error(transparent)]
    Attribute(#[from] AttributeError),
}

/// Line-oriented inspector for a [`World`]
#[derive(Debug, Default)]
pub struct Console {
    history: Vec<String>,
}

impl Console {
    /// Create a console with empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands executed so far, successful or not
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Parse and run one command line, returning its output lines.
    pub fn execute(&mut self, world: &mut World, line: &str) -> Result<Vec<String>, ConsoleError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            return Err(ConsoleError::Empty);
        };
        self.history.push(line.trim().to_string());
        log::debug!("console: {}", line.trim());

        match command {
            "list" => Ok(list(world)),
            "show" => show(world, args),
            "set" => set(world, args),
            "enable" => set_state(world, args, true),
            "disable" => set_state(world, args, false),
            "help" => Ok(HELP.iter().map(|usage| (*usage).to_string()).collect()),
            other => Err(ConsoleError::UnknownCommand(other.to_string())),
        }
    }
}

fn lookup(world: &World, name: &str) -> Result<GameObjectId, ConsoleError> {
    world
        .find(name)
        .ok_or_else(|| ConsoleError::UnknownObject(name.to_string()))
}

fn parse_kind(name: &str) -> Result<ComponentKind, ConsoleError> {
    match ComponentKind::from_name(name) {
        ComponentKind::NotDefined | ComponentKind::Base => Err(ConsoleError::UnknownComponent(name.to_string())),
        kind => Ok(kind),
    }
}

fn list(world: &World) -> Vec<String> {
    let mut rows: Vec<_> = world
        .iter()
        .map(|(_, object)| object)
        .filter(|object| object.is_registered())
        .collect();
    rows.sort_by_key(|object| object.id());

    rows.into_iter()
        .map(|object| {
            format!(
                "#{} {} [{}] {} components, {} children",
                object.id(),
                object.name(),
                if object.is_active() { "active" } else { "inactive" },
                object.component_kinds().len(),
                object.child_count()
            )
        })
        .collect()
}

fn show(world: &World, args: &[&str]) -> Result<Vec<String>, ConsoleError> {
    let (name, component) = match args {
        [name] => (*name, None),
        [name, component] => (*name, Some(*component)),
        _ => return Err(ConsoleError::Usage(HELP[1])),
    };
    let id = lookup(world, name)?;
    let Some(object) = world.get(id) else {
        return Err(ConsoleError::UnknownObject(name.to_string()));
    };

    let Some(component) = component else {
        let mut lines = vec![format!(
            "{} #{} enabled={} initialized={} preserve={} parent={}",
            object.name(),
            object.id(),
            object.is_enabled(),
            object.is_initialized(),
            object.is_preserved(),
            object.parent().and_then(|p| world.name_of(p)).unwrap_or("-")
        )];
        lines.extend(object.component_kinds().into_iter().map(|kind| format!("  {kind}")));
        lines.extend(object.children().map(|(child, _)| format!("  child {child}")));
        return Ok(lines);
    };

    let kind = parse_kind(component)?;
    let component = object.component(kind).ok_or_else(|| ConsoleError::ComponentAbsent {
        object: name.to_string(),
        component: kind,
    })?;
    Ok(component
        .attributes()
        .into_iter()
        .map(|attribute| format!("{} ({}) = {}", attribute.name, attribute.type_name, attribute.value))
        .collect())
}

fn set(world: &mut World, args: &[&str]) -> Result<Vec<String>, ConsoleError> {
    let [name, component, attribute, value @ ..] = args else {
        return Err(ConsoleError::Usage(HELP[2]));
    };
    if value.is_empty() {
        return Err(ConsoleError::Usage(HELP[2]));
    }
    let value = value.join(" ");

    let id = lookup(world, name)?;
    let kind = parse_kind(component)?;
    let absent = || ConsoleError::ComponentAbsent {
        object: (*name).to_string(),
        component: kind,
    };
    let component = world
        .get_mut(id)
        .and_then(|object| object.component_mut(kind))
        .ok_or_else(absent)?;

    component.set_attribute(attribute, &value)?;
    Ok(vec![format!("{name}.{kind}.{attribute} = {value}")])
}

fn set_state(world: &mut World, args: &[&str], enabled: bool) -> Result<Vec<String>, ConsoleError> {
    let usage = if enabled { HELP[3] } else { HELP[4] };
    let (name, recursive) = match args {
        [name] => (*name, false),
        [name, "recursive"] => (*name, true),
        _ => return Err(ConsoleError::Usage(usage)),
    };

    let id = lookup(world, name)?;
    world.set_state(id, enabled, recursive);
    Ok(vec![format!(
        "{} {}{}",
        name,
        if enabled { "enabled" } else { "disabled" },
        if recursive { " (recursive)" } else { "" }
    )])
}

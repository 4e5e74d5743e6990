//! Event template registry and builder.
//!
//! Templates arrive as parameterized instruction strings,
//! `"bank[index] arg, arg, ..."`, where an arg is a decimal literal
//! (emitted as a little-endian u32), a byte literal `bN` (emitted as a
//! single byte), or a placeholder `$name` declared in the template's
//! `params` list. Placeholders are bound positionally, in declared
//! order, at build time; an unresolved placeholder is a fatal compile
//! error, never a silent zero.

use crate::error::{CompileError, CompileResult};
use crate::script::{Event, EventScript, Instruction, RestartBehavior};
use crate::types::EventId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTemplate {
    pub id: EventId,
    pub name: String,
    /// Sets the reset-on-respawn header flag on the emitted event.
    #[serde(default)]
    pub restart: bool,
    /// Declared placeholder names, in substitution order.
    #[serde(default)]
    pub params: Vec<String>,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateTable {
    pub templates: Vec<EventTemplate>,
}

/// A build-time constant bound to one declared placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateArg {
    /// Any allocator-issued or table id; encoded as four LE bytes.
    Id(u32),
    /// A destination map byte tuple; encoded verbatim.
    MapBytes([u8; 4]),
    /// A single raw byte.
    Byte(u8),
}

impl TemplateArg {
    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            TemplateArg::Id(v) => out.extend_from_slice(&v.to_le_bytes()),
            TemplateArg::MapBytes(b) => out.extend_from_slice(b),
            TemplateArg::Byte(b) => out.push(*b),
        }
    }
}

pub struct TemplateRegistry {
    by_name: BTreeMap<String, EventTemplate>,
}

impl TemplateRegistry {
    pub fn from_table(table: TemplateTable) -> Self {
        let mut by_name = BTreeMap::new();
        for template in table.templates {
            by_name.insert(template.name.clone(), template);
        }
        TemplateRegistry { by_name }
    }

    pub fn get(&self, name: &str) -> CompileResult<&EventTemplate> {
        self.by_name
            .get(name)
            .ok_or_else(|| CompileError::missing("event template", name))
    }

    /// Check every referenced template up front, before any code
    /// generation begins.
    pub fn validate_references<'a, I>(&self, names: I) -> CompileResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            self.get(name)?;
        }
        Ok(())
    }

    /// Instantiate a concrete event from `name`, substituting declared
    /// placeholders in declared order with `args`. `id` overrides the
    /// template's own numeric id (per-edge events get fresh ids; shared
    /// subroutines keep their table id).
    pub fn build_event(
        &self,
        name: &str,
        id: Option<EventId>,
        args: &[TemplateArg],
    ) -> CompileResult<Event> {
        let template = self.get(name)?;
        if args.len() != template.params.len() {
            return Err(CompileError::malformed(
                "template arguments",
                format!(
                    "template '{name}' declares {} params, got {} args",
                    template.params.len(),
                    args.len()
                ),
            ));
        }
        let bindings: BTreeMap<&str, TemplateArg> = template
            .params
            .iter()
            .map(String::as_str)
            .zip(args.iter().copied())
            .collect();

        let mut event = Event::new(id.unwrap_or(template.id));
        if template.restart {
            event.restart = RestartBehavior::Restart;
        }
        for line in &template.instructions {
            event
                .instructions
                .push(parse_instruction(name, line, &bindings)?);
        }
        Ok(event)
    }

    /// The fixed "invoke template as subroutine" instruction:
    /// `[slot, template_id, ...args]`.
    pub fn build_initializer(
        &self,
        name: &str,
        slot: u32,
        args: &[u32],
    ) -> CompileResult<Instruction> {
        let template = self.get(name)?;
        Ok(crate::codec::initialize_event(slot, template.id, args))
    }
}

/// Merge an event into a destination container. Registering an id that
/// already exists is a no-op with a warning — idempotent, never overwrite.
pub fn register_into(script: &mut EventScript, event: Event) {
    if script.contains(event.id) {
        log::warn!("event {} already registered in container; keeping existing", event.id);
        return;
    }
    script.insert(event);
}

fn parse_instruction(
    template: &str,
    line: &str,
    bindings: &BTreeMap<&str, TemplateArg>,
) -> CompileResult<Instruction> {
    let malformed = |context: String| CompileError::malformed("template instruction", context);

    let (head, rest) = match line.split_once(' ') {
        Some((head, rest)) => (head, rest.trim()),
        None => (line.trim(), ""),
    };
    let (bank, index) = parse_opcode(head)
        .ok_or_else(|| malformed(format!("'{line}' in template '{template}': bad opcode")))?;

    let mut args = Vec::new();
    if !rest.is_empty() {
        for token in rest.split(',') {
            let token = token.trim();
            if let Some(placeholder) = token.strip_prefix('$') {
                let arg = bindings.get(placeholder).ok_or_else(|| {
                    malformed(format!(
                        "unresolved placeholder '${placeholder}' in template '{template}'"
                    ))
                })?;
                arg.encode_into(&mut args);
            } else if let Some(byte) = token.strip_prefix('b') {
                let value: u8 = byte.parse().map_err(|_| {
                    malformed(format!("bad byte literal '{token}' in template '{template}'"))
                })?;
                args.push(value);
            } else {
                let value: u32 = token.parse().map_err(|_| {
                    malformed(format!("bad literal '{token}' in template '{template}'"))
                })?;
                args.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
    Ok(Instruction { bank, index, args })
}

/// `"2003[66]"` → (2003, 66).
fn parse_opcode(head: &str) -> Option<(u16, u16)> {
    let open = head.find('[')?;
    let close = head.strip_suffix(']')?;
    let bank: u16 = close[..open].parse().ok()?;
    let index: u16 = close[open + 1..].parse().ok()?;
    Some((bank, index))
}

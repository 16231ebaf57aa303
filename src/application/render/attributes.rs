//! Serialization of an element's attributes into its opening tag.
//!
//! - `true` renders as a bare attribute, `false` and `null` omit it.
//! - `className`/`class` accept a string, a list of names, a `{name: bool}`
//!   map, or a component returning any of those; all class attributes of an
//!   element are merged into one `class`. Class components run inside the
//!   pass's memo scope, like any other component.
//! - `style` accepts a string or a map of declarations with camelCase keys.
//! - `htmlFor` is written as `for`.

use crate::application::memo::MemoScope;
use crate::domain::{ElementView, InvalidNodeError, Map, Node};

use super::{escape::push_escaped, types::RenderError};

pub(crate) fn write_attributes(
    out: &mut String,
    element: ElementView<'_>,
    scope: &MemoScope,
) -> Result<(), RenderError> {
    let tag = element.tag();
    let mut class_written = false;

    for (name, value) in element.attributes() {
        if is_class_attribute(name) {
            if !class_written {
                class_written = true;
                write_classes(out, element, scope)?;
            }
            continue;
        }

        let name = if name == "htmlFor" { "for" } else { name };
        if !is_valid_attribute_name(name) {
            return Err(InvalidNodeError::InvalidAttributeName {
                tag: tag.to_string(),
                name: name.to_string(),
            }
            .into());
        }

        match value {
            Node::Null | Node::Bool(false) => {}
            Node::Bool(true) => {
                out.push(' ');
                out.push_str(name);
            }
            Node::String(_) | Node::Number(_) => {
                write_pair(out, name, &value.as_text().unwrap_or_default());
            }
            Node::Map(declarations) if name == "style" => {
                let css = style_declarations(tag, declarations)?;
                if !css.is_empty() {
                    write_pair(out, name, &css);
                }
            }
            Node::List(_) | Node::Map(_) | Node::Function(_) => {
                return Err(InvalidNodeError::attribute_shape(tag, name, value.type_name()).into());
            }
        }
    }

    Ok(())
}

fn write_classes(
    out: &mut String,
    element: ElementView<'_>,
    scope: &MemoScope,
) -> Result<(), RenderError> {
    let mut classes = Vec::new();
    for (name, value) in element.attributes().filter(|(name, _)| is_class_attribute(name)) {
        collect_classes(element.tag(), name, value, &mut classes, Some(scope))?;
    }
    if !classes.is_empty() {
        write_pair(out, "class", &classes.join(" "));
    }
    Ok(())
}

fn collect_classes(
    tag: &str,
    name: &str,
    value: &Node,
    classes: &mut Vec<String>,
    resolve_in: Option<&MemoScope>,
) -> Result<(), RenderError> {
    match value {
        Node::Null | Node::Bool(false) => {}
        Node::String(_) | Node::Number(_) => {
            let text = value.as_text().unwrap_or_default();
            let text = text.trim();
            if !text.is_empty() {
                classes.push(text.to_string());
            }
        }
        Node::List(items) => {
            for item in items.iter() {
                collect_classes(tag, name, item, classes, resolve_in)?;
            }
        }
        Node::Map(toggles) => {
            classes.extend(
                toggles
                    .iter()
                    .filter(|(_, enabled)| !enabled.is_omitted())
                    .map(|(class, _)| class.clone()),
            );
        }
        Node::Function(component) => {
            let Some(scope) = resolve_in else {
                return Err(InvalidNodeError::attribute_shape(tag, name, value.type_name()).into());
            };
            let resolved = scope
                .enter(|| component.call())
                .map_err(|source| RenderError::component(component.name(), source))?;
            collect_classes(tag, name, &resolved, classes, None)?;
        }
        Node::Bool(true) => {
            return Err(InvalidNodeError::attribute_shape(tag, name, value.type_name()).into());
        }
    }
    Ok(())
}

fn style_declarations(tag: &str, declarations: &Map) -> Result<String, RenderError> {
    let mut css = String::new();
    for (property, value) in declarations {
        if value.is_omitted() {
            continue;
        }
        let Some(text) = value.as_text() else {
            return Err(InvalidNodeError::attribute_shape(tag, "style", value.type_name()).into());
        };
        if !css.is_empty() {
            css.push(';');
        }
        push_kebab_case(&mut css, property);
        css.push(':');
        css.push_str(&text);
    }
    Ok(css)
}

fn push_kebab_case(out: &mut String, property: &str) {
    if property.starts_with("--") {
        out.push_str(property);
        return;
    }
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
}

fn write_pair(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    push_escaped(out, value);
    out.push('"');
}

fn is_class_attribute(name: &str) -> bool {
    matches!(name, "className" | "class")
}

fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
        })
}

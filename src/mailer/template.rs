use crate::error::{Result, ToolError};
use std::collections::BTreeMap;

/// Substitute `{field}` placeholders from `fields`.
///
/// `{{` and `}}` produce literal braces. Anything after a `:` or `!` inside
/// a placeholder is a format spec and is ignored.
pub fn render(template: &str, fields: &BTreeMap<String, String>) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '{' => {
                let mut placeholder = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    placeholder.push(inner);
                }

                if !closed {
                    return Err(ToolError::Template {
                        message: "unclosed '{' in template".to_string(),
                    });
                }

                let name = placeholder
                    .split([':', '!'])
                    .next()
                    .unwrap_or_default()
                    .trim();

                if name.is_empty() {
                    return Err(ToolError::Template {
                        message: "empty placeholder '{}' in template".to_string(),
                    });
                }

                let value = fields.get(name).ok_or_else(|| ToolError::Template {
                    message: format!("missing field '{}'", name),
                })?;
                output.push_str(value);
            }
            '}' => {
                return Err(ToolError::Template {
                    message: "single '}' encountered in template".to_string(),
                });
            }
            _ => output.push(ch),
        }
    }

    Ok(output)
}

use crate::error::{Result, ToolError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One row of a bulk mailing: template fields, including `email`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipient {
    pub fields: BTreeMap<String, String>,
}

impl Recipient {
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.fields.get("email").map(String::as_str)
    }
}

/// Read recipients from a JSON array of flat objects.
pub fn load_recipients<P: AsRef<Path>>(path: P) -> Result<Vec<Recipient>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_recipients(&content)
}

pub fn parse_recipients(json: &str) -> Result<Vec<Recipient>> {
    let rows: Vec<BTreeMap<String, Value>> = serde_json::from_str(json)?;

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let mut fields = BTreeMap::new();
            for (key, value) in row {
                let text = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => String::new(),
                    Value::Array(_) | Value::Object(_) => {
                        return Err(ToolError::Config {
                            message: format!(
                                "recipient #{} field '{}' must be a string, number or boolean",
                                index + 1,
                                key
                            ),
                        });
                    }
                };
                fields.insert(key, text);
            }
            Ok(Recipient { fields })
        })
        .collect()
}

use crate::error::{OlapError, OlapResult};
use crate::value::{format_number, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL dialect surface used when rendering statements.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Longest identifier the database accepts; 0 means unlimited.
    fn max_column_name_length(&self) -> usize;

    fn quote_identifier(&self, identifier: &str) -> String;

    fn allows_as_in_table_alias(&self) -> bool {
        true
    }

    fn quote_qualified(&self, qualifier: &str, name: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(qualifier),
            self.quote_identifier(name)
        )
    }

    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Boolean(true) => "TRUE".to_string(),
            Value::Boolean(false) => "FALSE".to_string(),
            Value::Number(n) => format_number(n.0),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

/// Serializable dialect settings.
///
/// ```json
/// { "name": "oracle", "maxColumnNameLength": 30, "identifierQuote": "\"" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DialectConfig {
    pub name: String,
    pub max_column_name_length: usize,
    /// `None` leaves identifiers unquoted.
    pub identifier_quote: Option<char>,
    pub allows_as_in_table_alias: bool,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            name: "generic".to_string(),
            max_column_name_length: 0,
            identifier_quote: Some('"'),
            allows_as_in_table_alias: true,
        }
    }
}

impl DialectConfig {
    pub fn from_json(json: &str) -> OlapResult<Self> {
        let config: DialectConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OlapResult<()> {
        if self.name.trim().is_empty() {
            return Err(OlapError::Config("dialect name is empty".to_string()));
        }
        if let Some(q) = self.identifier_quote {
            if q.is_alphanumeric() || q == '_' || q.is_whitespace() {
                return Err(OlapError::Config(format!(
                    "invalid identifier quote character {q:?} for dialect {}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct GenericDialect {
    config: DialectConfig,
}

impl GenericDialect {
    pub fn new(config: DialectConfig) -> OlapResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_max_column_name_length(max_column_name_length: usize) -> Self {
        Self {
            config: DialectConfig {
                max_column_name_length,
                ..DialectConfig::default()
            },
        }
    }

    pub fn config(&self) -> &DialectConfig {
        &self.config
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn max_column_name_length(&self) -> usize {
        self.config.max_column_name_length
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        match self.config.identifier_quote {
            None => identifier.to_string(),
            Some(q) => {
                let escaped = identifier.replace(q, &format!("{q}{q}"));
                format!("{q}{escaped}{q}")
            }
        }
    }

    fn allows_as_in_table_alias(&self) -> bool {
        self.config.allows_as_in_table_alias
    }
}

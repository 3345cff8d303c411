use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use std::{
    fmt,
    str::FromStr,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("table `{0}` must be of the form <keyspace>.<table>")]
    Malformed(String),
}

/// A monitored `<keyspace>.<table>` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionTarget {
    keyspace: String,
    table: String,
}

impl CollectionTarget {
    pub fn new(keyspace: impl Into<String>, table: impl Into<String>) -> Result<Self, TargetError> {
        let keyspace = keyspace.into();
        let table = table.into();
        if keyspace.is_empty() || table.is_empty() || keyspace.contains('.') || table.contains('.') {
            return Err(TargetError::Malformed(format!("{keyspace}.{table}")));
        }
        Ok(Self { keyspace, table })
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The dot-qualified name handed to nodetool and reported as `table_name`.
    pub fn qualified_name(&self) -> String {
        self.to_string()
    }
}

impl FromStr for CollectionTarget {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s.split('.').collect::<Vec<_>>();
        match segments.as_slice() {
            [keyspace, table] if !keyspace.is_empty() && !table.is_empty() => Self::new(*keyspace, *table),
            _ => Err(TargetError::Malformed(s.to_string())),
        }
    }
}

impl fmt::Display for CollectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.keyspace, self.table)
    }
}

impl Serialize for CollectionTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CollectionTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

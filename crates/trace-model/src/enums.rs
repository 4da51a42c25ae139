//! Type-safe enumerations for trace field configuration.
//!
//! The config file spells these as loose strings (`"IP"`, `"word2vec_port"`,
//! `"unprocessed"`). Parsing is case-insensitive and accepts the aliases the
//! trace tooling has historically written.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Function of a field within a modeled record.
///
/// - **Metadata**: per-flow keys (addresses, ports, protocol)
/// - **Timeseries**: per-record measurements
/// - **Timestamp**: the record time, generated as interarrival deltas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Metadata,
    Timeseries,
    Timestamp,
}

impl Role {
    /// All roles in emission order.
    pub const ALL: [Role; 3] = [Role::Metadata, Role::Timeseries, Role::Timestamp];

    /// Returns the config section key for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Metadata => "metadata",
            Role::Timeseries => "timeseries",
            Role::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "METADATA" => Ok(Role::Metadata),
            "TIMESERIES" => Ok(Role::Timeseries),
            "TIMESTAMP" => Ok(Role::Timestamp),
            _ => Err(format!("Unknown field role: {s}")),
        }
    }
}

/// The `format` key of a field entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldFormat {
    Integer,
    String,
    Float,
    Timestamp,
    Ip,
    List,
}

impl FieldFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldFormat::Integer => "integer",
            FieldFormat::String => "string",
            FieldFormat::Float => "float",
            FieldFormat::Timestamp => "timestamp",
            FieldFormat::Ip => "IP",
            FieldFormat::List => "list",
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INTEGER" | "INT" => Ok(FieldFormat::Integer),
            "STRING" | "STR" => Ok(FieldFormat::String),
            "FLOAT" => Ok(FieldFormat::Float),
            "TIMESTAMP" => Ok(FieldFormat::Timestamp),
            "IP" => Ok(FieldFormat::Ip),
            "LIST" => Ok(FieldFormat::List),
            _ => Err(format!("Unknown field format: {s}")),
        }
    }
}

/// Resolved semantic type of a field, used to pick its transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Integer,
    String,
    Float,
    Timestamp,
    #[serde(rename = "IPv4")]
    Ipv4,
    #[serde(rename = "IPv6")]
    Ipv6,
    ListAttributes,
    ListValues,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Integer => "Integer",
            PrimitiveType::String => "String",
            PrimitiveType::Float => "Float",
            PrimitiveType::Timestamp => "Timestamp",
            PrimitiveType::Ipv4 => "IPv4",
            PrimitiveType::Ipv6 => "IPv6",
            PrimitiveType::ListAttributes => "ListAttributes",
            PrimitiveType::ListValues => "ListValues",
        }
    }

    /// Storage class of the raw column before encoding.
    ///
    /// Addresses and lists arrive as text, timestamps share the integer
    /// class with plain integers.
    pub fn storage_class(&self) -> StorageClass {
        match self {
            PrimitiveType::String
            | PrimitiveType::Ipv4
            | PrimitiveType::Ipv6
            | PrimitiveType::ListAttributes
            | PrimitiveType::ListValues => StorageClass::Text,
            PrimitiveType::Integer | PrimitiveType::Timestamp => StorageClass::Integer,
            PrimitiveType::Float => StorageClass::Float,
        }
    }

    /// Returns true if the encoder replaces this field with derived columns.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            PrimitiveType::ListAttributes | PrimitiveType::ListValues
        )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical storage class of a raw column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Text,
    Integer,
    Float,
}

/// Column dtype observed in a loaded dataset, reduced to what schema
/// validation cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservedType {
    Integer,
    Float,
    Text,
    /// All-null column; compatible with every declared type.
    Null,
    Other,
}

impl ObservedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservedType::Integer => "integer",
            ObservedType::Float => "float",
            ObservedType::Text => "text",
            ObservedType::Null => "null",
            ObservedType::Other => "other",
        }
    }
}

impl fmt::Display for ObservedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Requested encoding of a field or derived column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Bit,
    Categorical,
    #[serde(alias = "word2vec_port")]
    WordPort,
    #[serde(alias = "word2vec_proto")]
    WordProto,
    Float,
    Interarrival,
    ListAttributes,
    ListValues,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Bit => "bit",
            Encoding::Categorical => "categorical",
            Encoding::WordPort => "word_port",
            Encoding::WordProto => "word_proto",
            Encoding::Float => "float",
            Encoding::Interarrival => "interarrival",
            Encoding::ListAttributes => "list_attributes",
            Encoding::ListValues => "list_values",
        }
    }

    /// Encodings a scalar integer column may request.
    pub fn is_integer_encoding(&self) -> bool {
        matches!(
            self,
            Encoding::Bit | Encoding::Categorical | Encoding::WordPort | Encoding::WordProto
        )
    }

    /// Encodings a derived list-values column may request.
    pub fn is_scalar(&self) -> bool {
        self.is_integer_encoding() || matches!(self, Encoding::Float)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BIT" => Ok(Encoding::Bit),
            "CATEGORICAL" => Ok(Encoding::Categorical),
            "WORD_PORT" | "WORD2VEC_PORT" => Ok(Encoding::WordPort),
            "WORD_PROTO" | "WORD2VEC_PROTO" => Ok(Encoding::WordProto),
            "FLOAT" => Ok(Encoding::Float),
            "INTERARRIVAL" => Ok(Encoding::Interarrival),
            "LIST_ATTRIBUTES" => Ok(Encoding::ListAttributes),
            "LIST_VALUES" => Ok(Encoding::ListValues),
            _ => Err(format!("Unknown encoding: {s}")),
        }
    }
}

/// Address family of an IP field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    #[serde(rename = "IPv4")]
    V4,
    #[serde(rename = "IPv6")]
    V6,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        }
    }

    /// Width of the integer form in bits.
    pub fn bits(&self) -> u32 {
        match self {
            AddressFamily::V4 => 32,
            AddressFamily::V6 => 128,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AddressFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IPV4" | "V4" => Ok(AddressFamily::V4),
            "IPV6" | "V6" => Ok(AddressFamily::V6),
            _ => Err(format!("Unknown address family: {s}")),
        }
    }
}

/// Value-range normalization applied by the model trainer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Normalization {
    #[default]
    #[serde(rename = "ZERO_ONE")]
    ZeroOne,
    #[serde(rename = "MINUSONE_ONE")]
    MinusOneOne,
}

impl FromStr for Normalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ZERO_ONE" => Ok(Normalization::ZeroOne),
            "MINUSONE_ONE" => Ok(Normalization::MinusOneOne),
            _ => Err(format!("Unknown normalization: {s}")),
        }
    }
}

/// Whether a timestamp column still needs parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimestampKind {
    /// Already integer ticks.
    #[default]
    Processed,
    /// Formatted text parsed with the field's `time_format`.
    Unprocessed,
}

impl FromStr for TimestampKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PROCESSED" => Ok(TimestampKind::Processed),
            "UNPROCESSED" => Ok(TimestampKind::Unprocessed),
            _ => Err(format!("Unknown timestamp type: {s}")),
        }
    }
}

/// Value format of an encoded column; selects the abnormal-value sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueFormat {
    Text,
    Numeric,
}

impl ValueFormat {
    /// Text form of the sentinel standing in for abnormal values.
    pub fn sentinel(&self) -> &'static str {
        match self {
            ValueFormat::Text => "unavailable",
            ValueFormat::Numeric => "0",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_format_aliases() {
        assert_eq!("ip".parse::<FieldFormat>().unwrap(), FieldFormat::Ip);
        assert_eq!("int".parse::<FieldFormat>().unwrap(), FieldFormat::Integer);
        assert_eq!(" str ".parse::<FieldFormat>().unwrap(), FieldFormat::String);
        assert!("blob".parse::<FieldFormat>().is_err());
    }

    #[test]
    fn test_encoding_aliases() {
        assert_eq!(
            "word2vec_port".parse::<Encoding>().unwrap(),
            Encoding::WordPort
        );
        assert_eq!("WORD_PROTO".parse::<Encoding>().unwrap(), Encoding::WordProto);
        assert!("onehot".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_storage_class_lookup() {
        assert_eq!(PrimitiveType::Ipv6.storage_class(), StorageClass::Text);
        assert_eq!(
            PrimitiveType::ListValues.storage_class(),
            StorageClass::Text
        );
        assert_eq!(
            PrimitiveType::Timestamp.storage_class(),
            StorageClass::Integer
        );
        assert_eq!(PrimitiveType::Float.storage_class(), StorageClass::Float);
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(ValueFormat::Text.sentinel(), "unavailable");
        assert_eq!(ValueFormat::Numeric.sentinel(), "0");
    }

    #[test]
    fn test_address_family_serde() {
        let json = serde_json::to_string(&AddressFamily::V6).unwrap();
        assert_eq!(json, "\"IPv6\"");
        assert_eq!(AddressFamily::V4.bits(), 32);
    }
}

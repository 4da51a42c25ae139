//! Per-column generation directives consumed by the model trainer.

use serde::{Deserialize, Serialize};

use crate::enums::{Encoding, Normalization, Role};

/// Value type label written into a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveType {
    Integer,
    String,
    Float,
}

/// Encoding label written into a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveEncoding {
    Bit,
    #[serde(rename = "word2vec_port")]
    Word2VecPort,
    #[serde(rename = "word2vec_proto")]
    Word2VecProto,
    Categorical,
    Interarrival,
}

/// How the trainer should model one encoded column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub column: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<DirectiveType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<DirectiveEncoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_bits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorical_mapping: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<Normalization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log1p_norm: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<bool>,
}

impl Directive {
    fn bare(column: &str) -> Self {
        Self {
            column: column.to_string(),
            value_type: None,
            encoding: None,
            n_bits: None,
            categorical_mapping: None,
            normalization: None,
            log1p_norm: None,
            generation: None,
        }
    }

    pub fn bit(column: &str, n_bits: u32) -> Self {
        Self {
            value_type: Some(DirectiveType::Integer),
            encoding: Some(DirectiveEncoding::Bit),
            n_bits: Some(n_bits),
            categorical_mapping: Some(false),
            ..Self::bare(column)
        }
    }

    pub fn categorical(column: &str) -> Self {
        Self {
            value_type: Some(DirectiveType::String),
            encoding: Some(DirectiveEncoding::Categorical),
            ..Self::bare(column)
        }
    }

    pub fn word2vec(column: &str, encoding: DirectiveEncoding) -> Self {
        Self {
            value_type: Some(DirectiveType::Integer),
            encoding: Some(encoding),
            ..Self::bare(column)
        }
    }

    pub fn float(column: &str, normalization: Normalization) -> Self {
        Self {
            value_type: Some(DirectiveType::Float),
            normalization: Some(normalization),
            log1p_norm: Some(true),
            ..Self::bare(column)
        }
    }

    /// Timestamp column generated as deltas between consecutive records.
    pub fn interarrival(column: &str) -> Self {
        Self {
            generation: Some(true),
            encoding: Some(DirectiveEncoding::Interarrival),
            normalization: Some(Normalization::ZeroOne),
            ..Self::bare(column)
        }
    }

    /// Directive for a scalar column with the given encoding.
    pub fn from_encoding(column: &str, encoding: Encoding, normalization: Normalization) -> Self {
        match encoding {
            Encoding::Bit => Self::bit(column, 32),
            Encoding::WordPort => Self::word2vec(column, DirectiveEncoding::Word2VecPort),
            Encoding::WordProto => Self::word2vec(column, DirectiveEncoding::Word2VecProto),
            Encoding::Float => Self::float(column, normalization),
            Encoding::Interarrival => Self::interarrival(column),
            Encoding::Categorical | Encoding::ListAttributes | Encoding::ListValues => {
                Self::categorical(column)
            }
        }
    }
}

/// Directives grouped by role, in encoded column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub metadata: Vec<Directive>,
    pub timeseries: Vec<Directive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Directive>,
}

impl GenerationConfig {
    pub fn push(&mut self, role: Role, directive: Directive) {
        match role {
            Role::Metadata => self.metadata.push(directive),
            Role::Timeseries => self.timeseries.push(directive),
            Role::Timestamp => self.timestamp = Some(directive),
        }
    }

    pub fn len(&self) -> usize {
        self.metadata.len() + self.timeseries.len() + usize::from(self.timestamp.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

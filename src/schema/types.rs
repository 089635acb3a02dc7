use std::fmt;
use std::str::FromStr;

use arrow::datatypes::DataType;
use serde::Serialize;

use crate::error::{IngestError, Result};

/// Physical column types recognised in dataset files.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalType {
    /// UTF-8 string.
    String,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Untyped numeric value.
    Number,
    /// Boolean.
    Boolean,
    /// Struct or map valued column.
    Object,
    /// List of integers.
    Array,
    /// List of strings (`list<element: string>`).
    StringList,
    /// All-null column.
    Null,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    DateTime,
    /// Timestamp.
    Timestamp,
    /// Dynamically typed value.
    Any,
}

/// Column types of the target graph database.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraphType {
    /// `STRING`
    String,
    /// `INT32`
    Int32,
    /// `INT64`
    Int64,
    /// `FLOAT`
    Float,
    /// `BOOLEAN`
    Boolean,
    /// `MAP`
    Map,
    /// `INT64[]`
    Int64List,
    /// `STRING[]`
    StringList,
    /// `NULL`
    Null,
    /// `DATE`
    Date,
    /// `TIME`
    Time,
    /// `DATETIME`
    DateTime,
    /// `ANY`
    Any,
}

impl PhysicalType {
    /// Every physical type, in declaration order.
    pub const ALL: [PhysicalType; 16] = [
        PhysicalType::String,
        PhysicalType::Int32,
        PhysicalType::Int64,
        PhysicalType::Float,
        PhysicalType::Double,
        PhysicalType::Number,
        PhysicalType::Boolean,
        PhysicalType::Object,
        PhysicalType::Array,
        PhysicalType::StringList,
        PhysicalType::Null,
        PhysicalType::Date,
        PhysicalType::Time,
        PhysicalType::DateTime,
        PhysicalType::Timestamp,
        PhysicalType::Any,
    ];

    /// Target column type for this physical type.
    pub fn graph_type(self) -> GraphType {
        match self {
            PhysicalType::String => GraphType::String,
            PhysicalType::Int32 => GraphType::Int32,
            PhysicalType::Int64 => GraphType::Int64,
            PhysicalType::Float | PhysicalType::Double | PhysicalType::Number => GraphType::Float,
            PhysicalType::Boolean => GraphType::Boolean,
            PhysicalType::Object => GraphType::Map,
            PhysicalType::Array => GraphType::Int64List,
            PhysicalType::StringList => GraphType::StringList,
            PhysicalType::Null => GraphType::Null,
            PhysicalType::Date => GraphType::Date,
            PhysicalType::Time => GraphType::Time,
            PhysicalType::DateTime | PhysicalType::Timestamp => GraphType::DateTime,
            PhysicalType::Any => GraphType::Any,
        }
    }

    /// Canonical token for this type, as accepted by [`map_type`].
    pub fn as_str(self) -> &'static str {
        match self {
            PhysicalType::String => "string",
            PhysicalType::Int32 => "int32",
            PhysicalType::Int64 => "int64",
            PhysicalType::Float => "float",
            PhysicalType::Double => "double",
            PhysicalType::Number => "number",
            PhysicalType::Boolean => "boolean",
            PhysicalType::Object => "object",
            PhysicalType::Array => "array",
            PhysicalType::StringList => "list<element: string>",
            PhysicalType::Null => "null",
            PhysicalType::Date => "date",
            PhysicalType::Time => "time",
            PhysicalType::DateTime => "datetime",
            PhysicalType::Timestamp => "timestamp",
            PhysicalType::Any => "any",
        }
    }

    /// Classifies an Arrow field type read from a file footer.
    pub fn from_arrow(column: &str, data_type: &DataType) -> Result<Self> {
        let ty = match data_type {
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => PhysicalType::String,
            DataType::Int32 => PhysicalType::Int32,
            DataType::Int64 => PhysicalType::Int64,
            DataType::Float32 => PhysicalType::Float,
            DataType::Float64 => PhysicalType::Double,
            DataType::Boolean => PhysicalType::Boolean,
            DataType::Struct(_) | DataType::Map(_, _) => PhysicalType::Object,
            DataType::List(field) | DataType::LargeList(field) => match field.data_type() {
                DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
                    PhysicalType::StringList
                }
                inner if inner.is_integer() => PhysicalType::Array,
                _ => return Err(unsupported(column, data_type)),
            },
            DataType::Null => PhysicalType::Null,
            DataType::Date32 | DataType::Date64 => PhysicalType::Date,
            DataType::Time32(_) | DataType::Time64(_) => PhysicalType::Time,
            DataType::Timestamp(_, _) => PhysicalType::Timestamp,
            other => return Err(unsupported(column, other)),
        };
        Ok(ty)
    }
}

fn unsupported(column: &str, data_type: &DataType) -> IngestError {
    IngestError::UnsupportedType {
        column: column.to_string(),
        found: data_type.to_string(),
    }
}

impl FromStr for PhysicalType {
    type Err = IngestError;

    fn from_str(token: &str) -> Result<Self> {
        let lowered = token.trim().to_ascii_lowercase();
        PhysicalType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == lowered)
            .ok_or_else(|| IngestError::UnsupportedType {
                column: String::new(),
                found: token.to_string(),
            })
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GraphType {
    /// Type name as written in DDL.
    pub fn as_str(self) -> &'static str {
        match self {
            GraphType::String => "STRING",
            GraphType::Int32 => "INT32",
            GraphType::Int64 => "INT64",
            GraphType::Float => "FLOAT",
            GraphType::Boolean => "BOOLEAN",
            GraphType::Map => "MAP",
            GraphType::Int64List => "INT64[]",
            GraphType::StringList => "STRING[]",
            GraphType::Null => "NULL",
            GraphType::Date => "DATE",
            GraphType::Time => "TIME",
            GraphType::DateTime => "DATETIME",
            GraphType::Any => "ANY",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a physical type name to its graph column type.
pub fn map_type(physical: &str) -> Result<GraphType> {
    physical.parse::<PhysicalType>().map(PhysicalType::graph_type)
}

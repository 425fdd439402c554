//! Records exported from the platform.
//!
//! A record is kept as the complete, insertion-ordered JSON object it was exported as. Only the
//! handful of fields the materializer needs are interpreted; everything else is written back
//! untouched, numbers included with their exact digits.
//!
//! Definitions are written the way the platform's own exporter writes them: one-space indent and
//! every non-ASCII character escaped as `\uXXXX`.

use crate::errors::RecordError;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Map, Value};
use std::fmt;
use std::io;

const NAME_FIELD: &str = "name";
const MODULE_FIELD: &str = "module";
const REPORT_TYPE_FIELD: &str = "report_type";
const REPORT_SCRIPT_FIELD: &str = "report_script";
const STANDARD_FIELD: &str = "is_standard";
const DOCSTATUS_FIELD: &str = "docstatus";

const SCRIPT_REPORT_TYPE: &str = "Script Report";
const DEFAULT_REPORT_TYPE: &str = "Report Builder";
/// Value the platform uses to flag a record as shipped by an app.
const STANDARD_VALUE: &str = "Yes";

/// Kind of export a record comes from. Selects the category folder of the package layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Category {
    Report,
    PrintFormat,
}

impl Category {
    /// Lower-case plural, as used in progress messages.
    pub(crate) fn plural(&self) -> &'static str {
        match self {
            Category::Report => "reports",
            Category::PrintFormat => "print formats",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Report => write!(f, "Report"),
            Category::PrintFormat => write!(f, "Print Format"),
        }
    }
}

/// How a record is executed by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordKind {
    /// Query and report-builder reports, defined entirely by their JSON.
    Query,
    /// Script reports, which need a companion source file.
    Script,
    PrintFormat,
}

impl RecordKind {
    /// Returns `true` if the record kind is [`Script`].
    ///
    /// [`Script`]: RecordKind::Script
    #[must_use]
    pub(crate) fn is_script(&self) -> bool {
        matches!(self, Self::Script)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Record {
    name: String,
    kind: RecordKind,
    report_type: Option<String>,
    payload: Map<String, Value>,
}

impl Record {
    /// Builds a record from the `index`-th element of an export.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingName`] if the element is not an object or has no non-empty
    /// string `name`.
    pub(crate) fn from_value(
        index: usize,
        value: Value,
        category: Category,
    ) -> Result<Self, RecordError> {
        let Value::Object(payload) = value else {
            return Err(RecordError::MissingName { index });
        };

        let name = match payload.get(NAME_FIELD).and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(RecordError::MissingName { index }),
        };

        let report_type = payload
            .get(REPORT_TYPE_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string);

        let kind = match category {
            Category::PrintFormat => RecordKind::PrintFormat,
            Category::Report if report_type.as_deref() == Some(SCRIPT_REPORT_TYPE) => {
                RecordKind::Script
            }
            Category::Report => RecordKind::Query,
        };

        Ok(Self {
            name,
            kind,
            report_type,
            payload,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Declared module, if the record names a non-empty one.
    pub(crate) fn module(&self) -> Option<&str> {
        self.payload
            .get(MODULE_FIELD)
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
    }

    /// Embedded script text of a script report. Empty scripts count as absent.
    pub(crate) fn script_body(&self) -> Option<&str> {
        self.payload
            .get(REPORT_SCRIPT_FIELD)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Human readable type, as shown in progress messages.
    pub(crate) fn type_label(&self) -> &str {
        match self.kind {
            RecordKind::PrintFormat => "Print Format",
            _ => self.report_type.as_deref().unwrap_or(DEFAULT_REPORT_TYPE),
        }
    }

    /// Forces the fields an app-shipped print format must carry. No-op for reports.
    pub(crate) fn apply_standard_fields(&mut self) {
        if self.kind == RecordKind::PrintFormat {
            self.payload.insert(
                STANDARD_FIELD.to_string(),
                Value::String(STANDARD_VALUE.to_string()),
            );
            self.payload
                .insert(DOCSTATUS_FIELD.to_string(), Value::from(0));
        }
    }

    /// Serializes the full payload with one-space indentation, keys in export order and
    /// non-ASCII characters escaped.
    pub(crate) fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(
            &mut buf,
            AsciiFormatter(PrettyFormatter::with_indent(b" ")),
        );
        self.payload.serialize(&mut ser)?;
        Ok(buf)
    }
}

/// Pretty printer which escapes every character outside printable ASCII as UTF-16 `\uXXXX`
/// units.
struct AsciiFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiFormatter<'_> {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

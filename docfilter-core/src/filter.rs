//! Filter expression parsing.
//!
//! Clients describe constraints as raw tokens in the shape `field|operator|value`:
//!
//! ```text
//! room|gte|100
//! guest.address.city|eq|Berlin
//! status|in|CONFIRMED;CHECKED_IN
//! ```
//!
//! [`FilterParser`] turns a batch of such tokens into a [`FilterSet`], resolving each field
//! path against a [`SchemaDescriptor`] and coercing each value to the field's declared
//! [`ScalarType`](crate::value::ScalarType). Parsing is all-or-nothing: the first invalid
//! token aborts the batch and no partial set is returned.
//!
//! # Example
//!
//! ```ignore
//! use docfilter_core::filter::FilterParser;
//!
//! let filters = FilterParser::default().parse(["room|gte|100", "room|lt|200"], &schema)?;
//! assert_eq!(filters.len(), 2);
//! ```

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{FilterError, FilterResult},
    schema::{Filterable, SchemaDescriptor},
    value::TypedValue,
};

/// Client-facing filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// Equal to.
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Value is one of a set.
    In,
    /// Value is none of a set.
    Nin,
    /// Text matches a regular expression.
    Regex,
}

impl OperatorKind {
    /// All operators, in declaration order.
    pub const ALL: [OperatorKind; 9] = [
        OperatorKind::Eq,
        OperatorKind::Ne,
        OperatorKind::Gt,
        OperatorKind::Gte,
        OperatorKind::Lt,
        OperatorKind::Lte,
        OperatorKind::In,
        OperatorKind::Nin,
        OperatorKind::Regex,
    ];

    /// Returns the textual name used in filter tokens.
    pub fn as_str(self) -> &'static str {
        match self {
            OperatorKind::Eq => "eq",
            OperatorKind::Ne => "ne",
            OperatorKind::Gt => "gt",
            OperatorKind::Gte => "gte",
            OperatorKind::Lt => "lt",
            OperatorKind::Lte => "lte",
            OperatorKind::In => "in",
            OperatorKind::Nin => "nin",
            OperatorKind::Regex => "regex",
        }
    }

    /// Returns `true` for operators that take a set of values.
    pub fn is_multi_valued(self) -> bool {
        matches!(self, OperatorKind::In | OperatorKind::Nin)
    }

    /// Returns `true` for range bounds, which merge into one criterion per field.
    pub fn is_range(self) -> bool {
        matches!(
            self,
            OperatorKind::Gt | OperatorKind::Gte | OperatorKind::Lt | OperatorKind::Lte
        )
    }
}

impl FromStr for OperatorKind {
    type Err = FilterError;

    /// Matches operator names case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperatorKind::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An insertion-ordered set of coerced values. Duplicates collapse silently.
#[derive(Debug, Clone, Default)]
pub struct ValueSet {
    values: Vec<TypedValue>,
    seen: HashSet<TypedValue>,
}

impl ValueSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, returning `false` if an equal value was already present.
    pub fn insert(&mut self, value: TypedValue) -> bool {
        if !self.seen.insert(value.clone()) {
            return false;
        }

        self.values.push(value);
        true
    }

    /// Returns `true` if an equal value is present.
    pub fn contains(&self, value: &TypedValue) -> bool {
        self.seen.contains(value)
    }

    /// Iterates over the values in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &TypedValue> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}

impl FromIterator<TypedValue> for ValueSet {
    fn from_iter<I: IntoIterator<Item = TypedValue>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl IntoIterator for ValueSet {
    type Item = TypedValue;
    type IntoIter = std::vec::IntoIter<TypedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// The value side of a filter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// One scalar, for every operator except `in` and `nin`.
    Single(TypedValue),
    /// A set of scalars, for `in` and `nin`.
    Set(ValueSet),
}

/// One parsed constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    /// Dot-separated path of the constrained field.
    pub field_path: String,
    /// The operator applied to the field.
    pub operator: OperatorKind,
    /// The coerced value(s) the field is compared against.
    pub value: FilterValue,
}

impl FilterEntry {
    pub fn new(field_path: impl Into<String>, operator: OperatorKind, value: FilterValue) -> Self {
        Self {
            field_path: field_path.into(),
            operator,
            value,
        }
    }
}

/// An ordered batch of filter entries, all of which must hold.
///
/// Entries can only be appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    entries: Vec<FilterEntry>,
}

impl FilterSet {
    /// Creates an empty filter set, which matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses tokens against the schema of `T` with the default parser configuration.
    pub fn parse<T, I, S>(tokens: I) -> FilterResult<Self>
    where
        T: Filterable,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FilterParser::default().parse(tokens, T::schema())
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: FilterEntry) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a FilterEntry;
    type IntoIter = std::slice::Iter<'a, FilterEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// How `regex` filter values are handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegexMode {
    /// The value is used as a pattern as-is. Callers are responsible for what the pattern
    /// matches, including any metacharacters it contains.
    #[default]
    Raw,
    /// Metacharacters in the value are escaped, so the value matches literally anywhere
    /// in the field.
    Literal,
}

/// Parser settings.
///
/// Deserializes with defaults for any missing key so it can be embedded in an
/// application's configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Separates the field path, operator and value of a token.
    pub token_delimiter: char,
    /// Separates the values of an `in` / `nin` token.
    pub value_delimiter: char,
    /// Treatment of `regex` values.
    pub regex_mode: RegexMode,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            token_delimiter: '|',
            value_delimiter: ';',
            regex_mode: RegexMode::Raw,
        }
    }
}

impl ParserConfig {
    pub fn with_regex_mode(mut self, regex_mode: RegexMode) -> Self {
        self.regex_mode = regex_mode;
        self
    }

    pub fn with_token_delimiter(mut self, delimiter: char) -> Self {
        self.token_delimiter = delimiter;
        self
    }

    pub fn with_value_delimiter(mut self, delimiter: char) -> Self {
        self.value_delimiter = delimiter;
        self
    }
}

/// Parses raw filter tokens into a [`FilterSet`].
#[derive(Debug, Clone, Default)]
pub struct FilterParser {
    config: ParserConfig,
}

impl FilterParser {
    /// Creates a parser with the given configuration.
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses every token against `schema`.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered, in token order:
    ///
    /// - [`FilterError::Malformed`] if a token does not split into exactly three parts or
    ///   its value part is empty
    /// - [`FilterError::UnknownOperator`] if the operator text names no operator
    /// - [`FilterError::UnknownField`] / [`FilterError::UnsupportedFieldType`] if the field
    ///   path does not resolve to a scalar field
    /// - [`FilterError::Coercion`] if a value is not a literal of the field's type, or a
    ///   `regex` filter targets a non-string field
    pub fn parse<I, S>(&self, tokens: I, schema: &SchemaDescriptor) -> FilterResult<FilterSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filters = FilterSet::new();

        for token in tokens {
            let token = token.as_ref();
            let entry = self.parse_token(token, schema).inspect_err(|err| {
                debug!(
                    target: "docfilter::parser",
                    schema = schema.name(),
                    token,
                    error = %err,
                    "Rejected filter token"
                );
            })?;

            filters.push(entry);
        }

        debug!(
            target: "docfilter::parser",
            schema = schema.name(),
            filters = filters.len(),
            "Parsed filter tokens"
        );

        Ok(filters)
    }

    /// Parses a single token against `schema`.
    pub fn parse_token(&self, token: &str, schema: &SchemaDescriptor) -> FilterResult<FilterEntry> {
        let parts = split_trimmed(token, self.config.token_delimiter);
        let [field_path, operator, value] = parts[..] else {
            return Err(FilterError::Malformed(token.to_string()));
        };

        let operator = operator.parse::<OperatorKind>()?;
        let scalar_type = schema.resolve(field_path)?;

        let value = if operator.is_multi_valued() {
            FilterValue::Set(
                split_trimmed(value, self.config.value_delimiter)
                    .into_iter()
                    .map(|text| scalar_type.coerce(text))
                    .collect::<FilterResult<ValueSet>>()?,
            )
        } else if operator == OperatorKind::Regex {
            if !scalar_type.is_textual() {
                return Err(FilterError::Coercion {
                    value: value.to_string(),
                    target: scalar_type,
                    reason: "regex filters apply to string fields only".to_string(),
                });
            }

            FilterValue::Single(TypedValue::String(match self.config.regex_mode {
                RegexMode::Raw => value.to_string(),
                RegexMode::Literal => regex::escape(value),
            }))
        } else {
            FilterValue::Single(scalar_type.coerce(value)?)
        };

        Ok(FilterEntry {
            field_path: field_path.to_string(),
            operator,
            value,
        })
    }
}

/// Splits on `delimiter` and drops trailing empty parts, so `a|b|` has two parts and
/// `1;2;` has two values.
fn split_trimmed(text: &str, delimiter: char) -> Vec<&str> {
    let mut parts = text.split(delimiter).collect::<Vec<_>>();

    while parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ScalarType;
    use proptest::prelude::*;

    fn booking_schema() -> SchemaDescriptor {
        let guest = SchemaDescriptor::builder("Guest")
            .scalar("name", ScalarType::String)
            .scalar("vip", ScalarType::Boolean)
            .build();

        SchemaDescriptor::builder("Booking")
            .scalar("name", ScalarType::String)
            .scalar("status", ScalarType::String)
            .scalar("room", ScalarType::Int32)
            .scalar("price", ScalarType::Double)
            .scalar("checkIn", ScalarType::Timestamp)
            .nested("guest", guest)
            .unsupported("tags", "array")
            .build()
    }

    #[test]
    fn test_operator_parse_is_case_insensitive() {
        assert_eq!("EQ".parse::<OperatorKind>().unwrap(), OperatorKind::Eq);
        assert_eq!("Gte".parse::<OperatorKind>().unwrap(), OperatorKind::Gte);
        assert_eq!("NIN".parse::<OperatorKind>().unwrap(), OperatorKind::Nin);
        assert_eq!(
            "like".parse::<OperatorKind>().unwrap_err(),
            FilterError::UnknownOperator("like".into())
        );
    }

    #[test]
    fn test_parse_single_eq() {
        let filters = FilterParser::default()
            .parse(["room|eq|101"], &booking_schema())
            .unwrap();

        assert_eq!(filters.len(), 1);
        assert_eq!(
            filters.iter().next().unwrap(),
            &FilterEntry::new("room", OperatorKind::Eq, FilterValue::Single(TypedValue::Int32(101)))
        );
    }

    #[test]
    fn test_parse_nested_path() {
        let filters = FilterParser::default()
            .parse(["guest.vip|eq|true"], &booking_schema())
            .unwrap();

        let entry = filters.iter().next().unwrap();
        assert_eq!(entry.field_path, "guest.vip");
        assert_eq!(entry.value, FilterValue::Single(TypedValue::Boolean(true)));
    }

    #[test]
    fn test_parse_in_collapses_duplicates() {
        let filters = FilterParser::default()
            .parse(["room|in|1;2;2;3"], &booking_schema())
            .unwrap();

        let entry = filters.iter().next().unwrap();
        assert_eq!(entry.operator, OperatorKind::In);
        assert_eq!(
            entry.value,
            FilterValue::Set(ValueSet::from_iter([
                TypedValue::Int32(1),
                TypedValue::Int32(2),
                TypedValue::Int32(3),
            ]))
        );
        match &entry.value {
            FilterValue::Set(set) => assert_eq!(set.len(), 3),
            other => panic!("expected a set, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_nin_with_trailing_delimiter() {
        let filters = FilterParser::default()
            .parse(["status|nin|CANCELLED;"], &booking_schema())
            .unwrap();

        let entry = filters.iter().next().unwrap();
        assert_eq!(
            entry.value,
            FilterValue::Set(ValueSet::from_iter([TypedValue::String("CANCELLED".into())]))
        );
    }

    #[test]
    fn test_parse_in_with_bad_member_fails() {
        let err = FilterParser::default()
            .parse(["room|in|1;two;3"], &booking_schema())
            .unwrap_err();
        assert!(matches!(err, FilterError::Coercion { ref value, .. } if value == "two"));
    }

    #[test]
    fn test_parse_missing_value_is_malformed() {
        let schema = booking_schema();
        let parser = FilterParser::default();

        assert_eq!(
            parser.parse(["room|eq"], &schema).unwrap_err(),
            FilterError::Malformed("room|eq".into())
        );
        assert_eq!(
            parser.parse(["room|eq|"], &schema).unwrap_err(),
            FilterError::Malformed("room|eq|".into())
        );
        assert!(matches!(
            parser.parse(["room|eq|1|2"], &schema),
            Err(FilterError::Malformed(_))
        ));
        assert!(matches!(parser.parse([""], &schema), Err(FilterError::Malformed(_))));
    }

    #[test]
    fn test_parse_unknown_operator() {
        assert_eq!(
            FilterParser::default()
                .parse(["room|between|1"], &booking_schema())
                .unwrap_err(),
            FilterError::UnknownOperator("between".into())
        );
    }

    #[test]
    fn test_parse_unknown_field() {
        assert!(matches!(
            FilterParser::default().parse(["guest.age|eq|30"], &booking_schema()),
            Err(FilterError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_parse_unsupported_field() {
        assert!(matches!(
            FilterParser::default().parse(["tags|eq|x"], &booking_schema()),
            Err(FilterError::UnsupportedFieldType { .. })
        ));
        assert!(matches!(
            FilterParser::default().parse(["guest|eq|x"], &booking_schema()),
            Err(FilterError::UnsupportedFieldType { .. })
        ));
    }

    #[test]
    fn test_parse_stops_at_first_error() {
        let err = FilterParser::default()
            .parse(["room|eq|abc", "nope|eq|1", "room|bad|1"], &booking_schema())
            .unwrap_err();
        assert!(matches!(err, FilterError::Coercion { .. }));
    }

    #[test]
    fn test_parse_regex_raw_and_literal() {
        let schema = booking_schema();

        let raw = FilterParser::default()
            .parse(["name|regex|^Al.*"], &schema)
            .unwrap();
        assert_eq!(
            raw.iter().next().unwrap().value,
            FilterValue::Single(TypedValue::String("^Al.*".into()))
        );

        let literal = FilterParser::new(ParserConfig::default().with_regex_mode(RegexMode::Literal))
            .parse(["name|regex|a.b"], &schema)
            .unwrap();
        assert_eq!(
            literal.iter().next().unwrap().value,
            FilterValue::Single(TypedValue::String("a\\.b".into()))
        );
    }

    #[test]
    fn test_parse_regex_on_non_string_field_fails() {
        let err = FilterParser::default()
            .parse(["room|regex|1.*"], &booking_schema())
            .unwrap_err();
        assert!(matches!(err, FilterError::Coercion { target: ScalarType::Int32, .. }));
    }

    #[test]
    fn test_parse_with_custom_delimiters() {
        let parser = FilterParser::new(
            ParserConfig::default()
                .with_token_delimiter(':')
                .with_value_delimiter(','),
        );
        let filters = parser.parse(["room:in:1,2"], &booking_schema()).unwrap();
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn test_parse_timestamp_value() {
        let filters = FilterParser::default()
            .parse(["checkIn|gte|2024-05-01T00:00:00"], &booking_schema())
            .unwrap();
        assert!(matches!(
            filters.iter().next().unwrap().value,
            FilterValue::Single(TypedValue::Timestamp(_))
        ));
    }

    #[test]
    fn test_parser_config_deserializes_with_defaults() {
        let config: ParserConfig = serde_json::from_str(r#"{ "regex_mode": "literal" }"#).unwrap();
        assert_eq!(config.regex_mode, RegexMode::Literal);
        assert_eq!(config.token_delimiter, '|');
        assert_eq!(config.value_delimiter, ';');
    }

    proptest! {
        #[test]
        fn eq_token_yields_one_coerced_entry(n in any::<i32>()) {
            let filters = FilterParser::default()
                .parse([format!("room|eq|{n}")], &booking_schema())
                .unwrap();
            prop_assert_eq!(filters.len(), 1);
            prop_assert_eq!(
                &filters.iter().next().unwrap().value,
                &FilterValue::Single(TypedValue::Int32(n))
            );
        }

        #[test]
        fn in_token_collapses_to_distinct_values(values in prop::collection::vec(0i32..20, 1..30)) {
            let text = values.iter().map(i32::to_string).collect::<Vec<_>>().join(";");
            let filters = FilterParser::default()
                .parse([format!("room|in|{text}")], &booking_schema())
                .unwrap();

            let distinct = values.iter().collect::<HashSet<_>>().len();
            match &filters.iter().next().unwrap().value {
                FilterValue::Set(set) => prop_assert_eq!(set.len(), distinct),
                other => prop_assert!(false, "expected a set, got {:?}", other),
            }
        }
    }
}

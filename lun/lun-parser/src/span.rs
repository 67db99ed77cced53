use std::fmt::{self, Debug, Formatter};
use std::ops::Range;

use schemars::JsonSchema;
use serde::de::Visitor;
use serde::{Deserialize, Serialize};

/// A range of chars within a single source. Offsets are counted in chars,
/// not bytes.
#[derive(Clone, PartialEq, Eq, Hash, Copy, JsonSchema)]
pub struct Span {
    pub start: usize,
    pub end: usize,

    /// A key representing the path of the source. Value is stored in lun's
    /// `SourceTree::source_ids`.
    pub source_id: u16,
}

impl Span {
    pub fn new(source_id: u16, range: Range<usize>) -> Self {
        Span {
            start: range.start,
            end: range.end,
            source_id,
        }
    }

    pub fn merge(a: Span, b: Span) -> Span {
        assert_eq!(a.source_id, b.source_id);
        Span {
            start: usize::min(a.start, b.start),
            end: usize::max(a.end, b.end),
            source_id: a.source_id,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Span> for Range<usize> {
    fn from(a: Span) -> Self {
        a.start..a.end
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.source_id, self.start, self.end)
    }
}

impl Serialize for Span {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let str = format!("{self:?}");
        serializer.serialize_str(&str)
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        // Spans from different sources have no order
        if self.source_id != other.source_id {
            return None;
        }
        Some(
            self.start
                .cmp(&other.start)
                .then_with(|| self.end.cmp(&other.end)),
        )
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SpanVisitor {}

        impl Visitor<'_> for SpanVisitor {
            type Value = Span;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "A span string of form `file_id:x-y`")
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                use serde::de;

                if let Some((file_id, char_span)) = v.split_once(':') {
                    let file_id = file_id
                        .parse::<u16>()
                        .map_err(|e| de::Error::custom(e.to_string()))?;

                    if let Some((start, end)) = char_span.split_once('-') {
                        let start = start
                            .parse::<usize>()
                            .map_err(|e| de::Error::custom(e.to_string()))?;
                        let end = end
                            .parse::<usize>()
                            .map_err(|e| de::Error::custom(e.to_string()))?;

                        return Ok(Span {
                            start,
                            end,
                            source_id: file_id,
                        });
                    }
                }

                Err(de::Error::custom("malformed span"))
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(&v)
            }
        }

        deserializer.deserialize_string(SpanVisitor {})
    }
}

impl chumsky::Span for Span {
    type Context = u16;

    type Offset = usize;

    fn new(context: Self::Context, range: std::ops::Range<Self::Offset>) -> Self {
        Self {
            start: range.start,
            end: range.end,
            source_id: context,
        }
    }

    fn context(&self) -> Self::Context {
        self.source_id
    }

    fn start(&self) -> Self::Offset {
        self.start
    }

    fn end(&self) -> Self::Offset {
        self.end
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_span_serde() {
        let span = Span {
            start: 12,
            end: 15,
            source_id: 45,
        };
        let span_serialized = serde_json::to_string(&span).unwrap();
        insta::assert_snapshot!(span_serialized, @r###""45:12-15""###);
        let span_deserialized: Span = serde_json::from_str(&span_serialized).unwrap();
        assert_eq!(span_deserialized, span);
    }

    #[test]
    fn test_span_malformed() {
        assert!(serde_json::from_str::<Span>(r#""12-15""#).is_err());
        assert!(serde_json::from_str::<Span>(r#""a:12-15""#).is_err());
    }

    #[test]
    fn test_span_partial_cmp() {
        let span1 = Span::new(1, 10..20);
        let span2 = Span::new(1, 15..25);
        let span3 = Span::new(2, 5..15);

        assert_eq!(span1.partial_cmp(&span2), Some(std::cmp::Ordering::Less));
        assert_eq!(span2.partial_cmp(&span1), Some(std::cmp::Ordering::Greater));

        // different sources can't be compared
        assert_eq!(span1.partial_cmp(&span3), None);
        assert_eq!(span3.partial_cmp(&span1), None);
    }

    #[test]
    fn test_span_merge() {
        let a = Span::new(0, 3..5);
        let b = Span::new(0, 8..13);
        let merged = Span::merge(a, b);
        assert_eq!(merged, Span::new(0, 3..13));
        assert_eq!(Span::merge(b, a), merged);
        assert_eq!(merged.len(), 10);
    }
}

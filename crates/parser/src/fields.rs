//! Comma-separated payload fields.

use fieldwatch_core::Source;

use crate::error::{ParseError, ParseResult};

/// A payload split on `,`
#[derive(Debug)]
pub(crate) struct Fields<'a> {
    channel: Source,
    items: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    pub(crate) fn split(channel: Source, payload: &'a str) -> Self {
        Self {
            channel,
            items: payload.split(',').collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Fail unless at least `expected` fields are present
    pub(crate) fn require(&self, expected: usize) -> ParseResult<()> {
        if self.items.len() < expected {
            return Err(ParseError::TruncatedPayload {
                channel: self.channel,
                expected,
                actual: self.items.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn text(&self, index: usize) -> ParseResult<&'a str> {
        self.require(index + 1)?;
        Ok(self.items[index])
    }

    /// Parse field `index` as a float; `field` names it in errors
    pub(crate) fn number(&self, index: usize, field: &'static str) -> ParseResult<f64> {
        let raw = self.text(index)?;
        raw.trim()
            .parse::<f64>()
            .map_err(|_| ParseError::MalformedField {
                field,
                value: raw.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_is_one_field() {
        assert_eq!(Fields::split(Source::RockBlock, "").len(), 1);
    }

    #[test]
    fn test_number_trims_whitespace() {
        let fields = Fields::split(Source::Particle, "3.9, 0.5 ,x");
        assert_eq!(fields.number(1, "charge").unwrap(), 0.5);
        assert_eq!(
            fields.number(2, "lat"),
            Err(ParseError::MalformedField {
                field: "lat",
                value: "x".to_string()
            })
        );
    }

    #[test]
    fn test_missing_index_is_truncated() {
        let fields = Fields::split(Source::Particle, "1,2");
        assert_eq!(
            fields.number(3, "lon"),
            Err(ParseError::TruncatedPayload {
                channel: Source::Particle,
                expected: 4,
                actual: 2
            })
        );
    }
}

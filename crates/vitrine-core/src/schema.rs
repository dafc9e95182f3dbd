//! Record shape and the declarative field-to-parser table.
//!
//! Each [`FieldRule`] says where a field lives inside a content node, how to
//! capture it, how to parse it into a [`ProductDraft`] and how to render it
//! back to text for the CSV output. The table order is the column order.

use crate::error::FieldError;
use crate::models::Product;

/// Symbols stripped from the front of a price before parsing.
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₩', '₹'];

/// What to read from the element(s) matched by a rule's selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Full text content of the first match, including non-rendered text.
    RawContent,
    /// Rendered text of the first match.
    VisibleText,
    /// Number of matches. Zero is a valid value.
    Count,
}

/// A value read from a content node, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    Text(String),
    Count(usize),
}

impl Captured {
    fn into_text(self, field: &'static str) -> Result<String, FieldError> {
        match self {
            Captured::Text(text) => Ok(text),
            Captured::Count(_) => Err(FieldError::Render {
                field,
                message: "expected text, got a match count".into(),
            }),
        }
    }

    fn into_count(self, field: &'static str) -> Result<usize, FieldError> {
        match self {
            Captured::Count(n) => Ok(n),
            Captured::Text(_) => Err(FieldError::Render {
                field,
                message: "expected a match count, got text".into(),
            }),
        }
    }
}

/// Partially extracted product. Turned into a [`Product`] only when every
/// field has been set.
#[derive(Debug, Default)]
pub struct ProductDraft {
    title: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    rating: Option<u32>,
    num_of_reviews: Option<u32>,
}

impl ProductDraft {
    pub fn finish(self) -> Result<Product, FieldError> {
        Ok(Product {
            title: self.title.ok_or(FieldError::Unset { field: TITLE })?,
            description: self
                .description
                .ok_or(FieldError::Unset { field: DESCRIPTION })?,
            price: self.price.ok_or(FieldError::Unset { field: PRICE })?,
            rating: self.rating.ok_or(FieldError::Unset { field: RATING })?,
            num_of_reviews: self
                .num_of_reviews
                .ok_or(FieldError::Unset { field: NUM_OF_REVIEWS })?,
        })
    }
}

type ApplyFn = fn(Captured, &mut ProductDraft) -> Result<(), FieldError>;
type RenderFn = fn(&Product) -> String;

/// How one column is extracted, parsed and rendered.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub selector: &'static str,
    pub capture: Capture,
    apply: ApplyFn,
    render: RenderFn,
}

impl FieldRule {
    /// Parse a captured value into the draft.
    pub fn apply(&self, captured: Captured, draft: &mut ProductDraft) -> Result<(), FieldError> {
        (self.apply)(captured, draft)
    }

    /// Locale-invariant text for the output column.
    pub fn render(&self, product: &Product) -> String {
        (self.render)(product)
    }
}

pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const PRICE: &str = "price";
pub const RATING: &str = "rating";
pub const NUM_OF_REVIEWS: &str = "num_of_reviews";

/// Ordered field table for [`Product`].
#[derive(Debug, Clone)]
pub struct RecordSchema {
    rules: Vec<FieldRule>,
}

impl RecordSchema {
    /// The product table for the e-commerce test-site catalog markup.
    pub fn product() -> Self {
        Self {
            rules: vec![
                FieldRule {
                    name: TITLE,
                    selector: "a.title",
                    capture: Capture::RawContent,
                    apply: |c, d| {
                        let title = c.into_text(TITLE)?;
                        if title.trim().is_empty() {
                            return Err(FieldError::Empty { field: TITLE });
                        }
                        d.title = Some(title);
                        Ok(())
                    },
                    render: |p| p.title.clone(),
                },
                FieldRule {
                    name: DESCRIPTION,
                    selector: "[class*=description]",
                    capture: Capture::VisibleText,
                    apply: |c, d| {
                        d.description = Some(c.into_text(DESCRIPTION)?);
                        Ok(())
                    },
                    render: |p| p.description.clone(),
                },
                FieldRule {
                    name: PRICE,
                    selector: "[class*=price]",
                    capture: Capture::VisibleText,
                    apply: |c, d| {
                        d.price = Some(parse_price(&c.into_text(PRICE)?)?);
                        Ok(())
                    },
                    render: |p| p.price.to_string(),
                },
                FieldRule {
                    name: RATING,
                    selector: "p > span.ws-icon-star",
                    capture: Capture::Count,
                    apply: |c, d| {
                        let stars = c.into_count(RATING)?;
                        d.rating = Some(u32::try_from(stars).map_err(|e| FieldError::Parse {
                            field: RATING,
                            raw: stars.to_string(),
                            reason: e.to_string(),
                        })?);
                        Ok(())
                    },
                    render: |p| p.rating.to_string(),
                },
                FieldRule {
                    name: NUM_OF_REVIEWS,
                    selector: "[class*=review-count]",
                    capture: Capture::VisibleText,
                    apply: |c, d| {
                        let text = c.into_text(NUM_OF_REVIEWS)?;
                        d.num_of_reviews = Some(parse_leading_count(NUM_OF_REVIEWS, &text)?);
                        Ok(())
                    },
                    render: |p| p.num_of_reviews.to_string(),
                },
            ],
        }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Column names in declared order; this is the CSV header.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Render one product as a row in declared order.
    pub fn row(&self, product: &Product) -> Vec<String> {
        self.rules.iter().map(|r| r.render(product)).collect()
    }
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self::product()
    }
}

/// Parse a currency-prefixed price such as `"$1009.99"`.
///
/// Leading currency symbols and whitespace are stripped; anything left that
/// is not a finite, non-negative decimal is rejected.
pub fn parse_price(raw: &str) -> Result<f64, FieldError> {
    let fail = |reason: String| FieldError::Parse {
        field: PRICE,
        raw: raw.to_string(),
        reason,
    };

    let number = raw
        .trim()
        .trim_start_matches(|c: char| CURRENCY_SYMBOLS.contains(&c) || c.is_whitespace());
    if number.is_empty() {
        return Err(fail("no digits after currency symbol".into()));
    }

    let value: f64 = number.parse().map_err(|e| fail(format!("{e}")))?;
    if !value.is_finite() {
        return Err(fail("not a finite number".into()));
    }
    if value < 0.0 {
        return Err(fail("negative price".into()));
    }
    Ok(value)
}

/// Parse the first whitespace-separated token of `raw` as a count,
/// e.g. `"16 reviews"` → 16.
pub fn parse_leading_count(field: &'static str, raw: &str) -> Result<u32, FieldError> {
    let token = raw.split_whitespace().next().ok_or_else(|| FieldError::Parse {
        field,
        raw: raw.to_string(),
        reason: "no leading token".into(),
    })?;
    token.parse().map_err(|e| FieldError::Parse {
        field,
        raw: raw.to_string(),
        reason: format!("{e}"),
    })
}

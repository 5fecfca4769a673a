use serde::{Deserialize, Serialize};

/// Optional criteria for a menu search. Absent fields don't constrain the result.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    pub text_query: Option<String>,
    pub category: Option<String>,
    pub dietary_tags: Option<Vec<String>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text_query = Some(text.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn dietary<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.dietary_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn min_price(mut self, min: f64) -> Self {
        self.min_price = Some(min);
        self
    }

    pub fn max_price(mut self, max: f64) -> Self {
        self.max_price = Some(max);
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.text_query.as_deref().map_or(true, str::is_empty)
            && self.category.is_none()
            && self.dietary_tags.as_ref().map_or(true, Vec::is_empty)
            && self.min_price.is_none()
            && self.max_price.is_none()
    }
}

use diesel::prelude::*;

use super::schema::quotes;
use crate::models::{Quote, QuoteId, StoredQuote};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = quotes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuoteRow {
    pub id: i64,
    pub quote: String,
    pub author: String,
}

impl From<QuoteRow> for StoredQuote {
    fn from(row: QuoteRow) -> Self {
        StoredQuote::new(QuoteId(row.id), Quote::new(row.quote, row.author))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = quotes)]
pub struct NewQuoteRow {
    pub quote: String,
    pub author: String,
}

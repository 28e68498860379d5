use chrono::{DateTime, Utc};
use connectors_common::{OrderBook, OrderBookLevel, Pair};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedLevel {
    pub price: f64,
    pub quantity: f64,
    pub exchange: String,
}

/// Merged ladder across exchanges. Levels at the same price from different
/// exchanges stay separate entries; quantities are never summed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedOrderBook {
    pub pair: Pair,
    pub depth: usize,
    pub bids: Vec<AggregatedLevel>,
    pub asks: Vec<AggregatedLevel>,
    /// Exchanges whose book was merged, in registration order.
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl AggregatedOrderBook {
    /// `books` must be in registration order: equal prices keep that order.
    pub fn merge(pair: Pair, depth: usize, books: Vec<OrderBook>) -> Self {
        let mut bids = Vec::new();
        let mut asks = Vec::new();
        let mut sources = Vec::with_capacity(books.len());

        for book in books {
            bids.extend(tag(&book.exchange, &book.bids));
            asks.extend(tag(&book.exchange, &book.asks));
            sources.push(book.exchange);
        }

        // sort_by is stable
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        bids.truncate(depth);
        asks.truncate(depth);

        AggregatedOrderBook {
            pair,
            depth,
            bids,
            asks,
            sources,
            timestamp: Utc::now(),
        }
    }

    pub fn empty(pair: Pair, depth: usize) -> Self {
        Self::merge(pair, depth, Vec::new())
    }

    pub fn best_bid(&self) -> Option<&AggregatedLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&AggregatedLevel> {
        self.asks.first()
    }

    pub fn spread(&self) -> Option<f64> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }
}

fn tag<'a>(
    exchange: &'a str,
    levels: &'a [OrderBookLevel],
) -> impl Iterator<Item = AggregatedLevel> + 'a {
    levels
        .iter()
        .filter(|l| l.is_valid())
        .map(move |l| AggregatedLevel {
            price: l.price,
            quantity: l.quantity,
            exchange: exchange.to_string(),
        })
}

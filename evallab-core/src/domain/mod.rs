//! Domain types for evallab

pub mod bar;
pub mod equity;
pub mod money;
pub mod signal;
pub mod summary;
pub mod trade;

pub use bar::{
    deserialize_calendar_date, parse_calendar_date, to_price_bars, AnnotatedBar, BarError,
    PriceBar, RawBar,
};
pub use equity::EquityPoint;
pub use money::round_cents;
pub use signal::Signal;
pub use summary::Summary;
pub use trade::{TradeAction, TradeRecord};

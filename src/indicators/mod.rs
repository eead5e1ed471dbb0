// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the technical indicators used by
// the feature assembler.  Every function consumes one symbol's ordered
// columns and returns a `Series` of identical length; positions without
// enough history are `None`, never an error.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod momentum;
pub mod rsi;
pub mod series;

pub use adx::calculate_adx;
pub use atr::calculate_atr;
pub use bollinger::{calculate_bollinger, BollingerBands};
pub use ema::{calculate_ema, cross_signal};
pub use macd::{calculate_macd, MacdSeries};
pub use momentum::calculate_momentum;
pub use rsi::calculate_rsi;
pub use series::Series;

pub mod candles;
pub mod control;
pub mod report;

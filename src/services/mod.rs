// src/services/mod.rs
pub mod dashboard;
pub mod fundamentals;
pub mod group;
pub mod indicators;
pub mod market_data;
pub mod ratios;
pub mod tickers;
pub mod valuation;

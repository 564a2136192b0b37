pub mod artifact;
pub mod charts;
pub mod config;
pub mod correlation;
pub mod dataset;
pub mod distributions;
pub mod error;
pub mod export;
pub mod league;
pub mod ols;
pub mod qb_rating;
pub mod report;
pub mod team_trend;

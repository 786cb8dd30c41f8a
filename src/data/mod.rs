//! Data layer: core types and loading.
//!
//! Architecture:
//! ```text
//!  .json / .csv / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file, coerce date/close → KalmanDataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────────┐
//!   │ KalmanDataset  │  Vec<DataPoint> in draw order
//!   └───────────────┘
//! ```

pub mod loader;
pub mod model;

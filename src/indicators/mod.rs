//! Indicator engine: derived series plus snapshot/live ranking.
//!
//! | Indicator | Lookback | Direction |
//! |---|---|---|
//! | Backwardation `(cash - 3m) / 3m` | 5y | higher is worse |
//! | Visible inventory (LME + COMEX), shown as `100 - raw` | 10y | lower is worse |
//! | CFTC net shorts | 8y | higher is worse |
//! | COMEX - LME 3m basis, USD/t | 10y | higher is worse |

pub mod derive;
pub mod snapshot;

pub use derive::*;
pub use snapshot::*;

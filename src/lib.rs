pub mod amount;
pub mod csv;
pub mod engine;
pub mod model;

pub use amount::Amount;
pub use engine::{EngineError, RoundSettlement, Scorecard};
pub use model::{Game, NetBalance, Player, PlayerId, RoundRecord, Transaction};

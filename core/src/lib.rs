//! Cinder core
//!
//! Builds shielded transactions from spendable notes and validates them.
//! The join-split proof system and the commitment store are external and
//! reached through [`prover::JoinSplitProver`] and [`store::CommitmentStore`].

pub mod builder;
pub mod error;
pub mod logging;
pub mod prover;
pub mod store;
pub mod validator;

use std::sync::Arc;

use cinder_config::{CinderConfig, ProverMode};

pub use builder::{BuildRequest, PaymentRequest, ShardWorkingSet, SpendableNote, TxBuilder};
pub use error::{BuildError, ValidationError};
pub use prover::{
    InputWitness, JoinSplitProver, JoinSplitStatement, MockProver, ProveReply, ProveRequest,
    ProverHandle, ProverService, VerifyReply, VerifyRequest,
};
pub use store::{CommitmentStore, MemoryStore};
pub use validator::TxValidator;

/// Prover selected by `[prover] mode`.
///
/// In service mode the returned service must be kept alive for as long as the
/// prover is used.
pub fn prover_from_config(config: &CinderConfig) -> (Arc<dyn JoinSplitProver>, Option<ProverService>) {
    match config.prover.mode {
        ProverMode::Mock => {
            let prover: Arc<dyn JoinSplitProver> = Arc::new(MockProver::new());
            (prover, None)
        }
        ProverMode::Service => {
            let service = ProverService::start(MockProver::new(), config.prover.queue_depth);
            let prover: Arc<dyn JoinSplitProver> = Arc::new(service.handle());
            (prover, Some(service))
        }
    }
}

//! # Session Guard
//!
//! Every read and write starts from a live wallet session on the
//! configured chain. Checking the session also keeps the cache bound to
//! the right account.

use shared_types::ChainSession;
use tracing::{debug, info};

use super::state_cache::LocalStateCache;
use crate::domain::LedgerError;
use crate::ports::WalletSession;

/// Returns the live session or the reason there is none.
///
/// A missing session clears the cache; a session for a new address resets
/// it before the caller touches it.
pub fn require_session<W: WalletSession + ?Sized>(
    wallet: &W,
    expected_chain: u64,
    cache: &LocalStateCache,
) -> Result<ChainSession, LedgerError> {
    let Some(session) = wallet.session() else {
        if cache.account().is_some() {
            info!("[ledger] Wallet disconnected, clearing local state");
            cache.clear();
        }
        return Err(LedgerError::NotConnected);
    };

    if session.chain_id != expected_chain {
        debug!(
            "[ledger] Session on chain {}, expected {}",
            session.chain_id, expected_chain
        );
        return Err(LedgerError::WrongChain {
            expected: expected_chain,
            actual: session.chain_id,
        });
    }

    if cache.bind_session(session.address) {
        info!("[ledger] Session bound to {}", session.address);
    }
    Ok(session)
}

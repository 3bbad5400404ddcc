//! Actor ownership of the ledger
//!
//! One task owns the [`Ledger`]; everything else talks to it through a
//! cloneable [`LedgerHandle`]. Requests are served strictly in arrival
//! order and each runs to completion, so the ledger keeps a single logical
//! thread of control no matter how many handles exist.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   Application state          │
//! │   (accept / complete / mine) │
//! └──────────────┬───────────────┘
//!                │ LedgerHandle (Clone)
//!                │ mpsc::channel (bounded)
//!                ▼
//! ┌──────────────────────────────┐
//! │   LedgerActor (single task)  │
//! │   owns Ledger { chain,       │
//! │                 mempool }    │
//! └──────────────────────────────┘
//! ```

use crate::types::{Address, Block, Transaction};
use crate::{Chain, Error, Ledger, Result};
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Submit a transaction to the mempool
    AddTransaction {
        /// Transaction to queue
        transaction: Transaction,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Mine the mempool into a block
    MinePending {
        /// Address recorded as miner
        reward_address: Address,
        /// Reply channel
        response: oneshot::Sender<Result<Block>>,
    },

    /// Verify chain integrity
    IsChainValid {
        /// Reply channel
        response: oneshot::Sender<bool>,
    },

    /// Balance of an address
    BalanceOf {
        /// Address to total
        address: Address,
        /// Reply channel
        response: oneshot::Sender<i64>,
    },

    /// Mined transactions of an address
    History {
        /// Address to look up
        address: Address,
        /// Reply channel
        response: oneshot::Sender<Vec<Transaction>>,
    },

    /// Snapshot of the mempool
    PendingTransactions {
        /// Reply channel
        response: oneshot::Sender<Vec<Transaction>>,
    },

    /// Snapshot of the chain
    ChainSnapshot {
        /// Reply channel
        response: oneshot::Sender<Chain>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the ledger
#[derive(Debug)]
pub struct LedgerActor {
    /// The ledger
    ledger: Ledger,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(ledger: Ledger, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        Self { ledger, mailbox }
    }

    /// Run the actor event loop until shutdown or all handles drop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown = msg {
                tracing::info!(
                    chain_len = self.ledger.chain().len(),
                    pending = self.ledger.pending_transactions().len(),
                    "Ledger actor shutting down"
                );
                break;
            }
            self.handle_message(msg);
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::AddTransaction {
                transaction,
                response,
            } => {
                let result = self.ledger.add_transaction(transaction);
                let _ = response.send(result);
            }

            LedgerMessage::MinePending {
                reward_address,
                response,
            } => {
                let result = self.ledger.mine_pending_transactions(&reward_address);
                let _ = response.send(result);
            }

            LedgerMessage::IsChainValid { response } => {
                let _ = response.send(self.ledger.is_chain_valid());
            }

            LedgerMessage::BalanceOf { address, response } => {
                let _ = response.send(self.ledger.balance_of(&address));
            }

            LedgerMessage::History { address, response } => {
                let _ = response.send(self.ledger.history(&address));
            }

            LedgerMessage::PendingTransactions { response } => {
                let _ = response.send(self.ledger.pending_transactions().to_vec());
            }

            LedgerMessage::ChainSnapshot { response } => {
                let _ = response.send(self.ledger.chain().clone());
            }

            LedgerMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    /// Send a request and wait for its reply
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Submit a transaction
    pub async fn add_transaction(&self, transaction: Transaction) -> Result<()> {
        self.request(|response| LedgerMessage::AddTransaction {
            transaction,
            response,
        })
        .await?
    }

    /// Mine pending transactions
    pub async fn mine_pending_transactions(&self, reward_address: Address) -> Result<Block> {
        self.request(|response| LedgerMessage::MinePending {
            reward_address,
            response,
        })
        .await?
    }

    /// Verify chain integrity
    pub async fn is_chain_valid(&self) -> Result<bool> {
        self.request(|response| LedgerMessage::IsChainValid { response })
            .await
    }

    /// Balance of an address
    pub async fn balance_of(&self, address: Address) -> Result<i64> {
        self.request(|response| LedgerMessage::BalanceOf { address, response })
            .await
    }

    /// Mined transactions of an address
    pub async fn history(&self, address: Address) -> Result<Vec<Transaction>> {
        self.request(|response| LedgerMessage::History { address, response })
            .await
    }

    /// Snapshot of the mempool
    pub async fn pending_transactions(&self) -> Result<Vec<Transaction>> {
        self.request(|response| LedgerMessage::PendingTransactions { response })
            .await
    }

    /// Snapshot of the chain
    pub async fn chain(&self) -> Result<Chain> {
        self.request(|response| LedgerMessage::ChainSnapshot { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
///
/// Must be called from within a Tokio runtime.
pub fn spawn_ledger_actor(ledger: Ledger) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(ledger.config().mailbox_capacity); // Bounded channel for backpressure
    let actor = LedgerActor::new(ledger, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}

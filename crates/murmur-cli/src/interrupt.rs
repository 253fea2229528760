//! Ctrl-C handling for the whole session
//!
//! The signal is registered once. While a turn is streaming, Ctrl-C cancels
//! that turn; at the prompt it exits.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// What a Ctrl-C did
#[derive(Debug, PartialEq, Eq)]
pub enum Interrupt {
    CancelledTurn,
    Exit,
}

#[derive(Clone, Default)]
pub struct Interrupts {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    /// Listen for Ctrl-C for the rest of the process
    pub fn install() -> Self {
        let interrupts = Self::default();
        let handler = interrupts.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if handler.interrupt() == Interrupt::Exit {
                    println!();
                    std::process::exit(130);
                }
            }
        });
        interrupts
    }

    /// Start a turn. Ctrl-C cancels the returned token until `end_turn`.
    pub fn begin_turn(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.current.lock() = Some(token.clone());
        token
    }

    pub fn end_turn(&self) {
        self.current.lock().take();
    }

    /// Route one Ctrl-C
    pub fn interrupt(&self) -> Interrupt {
        match self.current.lock().as_ref() {
            Some(token) => {
                tracing::debug!("Interrupt cancels the running turn");
                token.cancel();
                Interrupt::CancelledTurn
            }
            None => Interrupt::Exit,
        }
    }
}

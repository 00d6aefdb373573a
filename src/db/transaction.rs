//! Scoped transactions.

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use layerkv_store::OrderedStore;
use parking_lot::Mutex;
use tracing::debug;
use tracing::warn;

use super::Db;
use crate::error::Error;

type Deferred<S> = Box<dyn FnOnce(&Db<S>) + Send>;

/// State shared by every `Db` handle bound to one open transaction.
pub(crate) struct TxnState<S> {
    open: AtomicBool,
    deferred: Mutex<Vec<Deferred<S>>>,
}

impl<S> TxnState<S> {
    fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
            deferred: Mutex::new(Vec::new()),
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Mark the transaction ended and hand back the deferred callbacks.
    fn close(&self) -> Vec<Deferred<S>> {
        self.open.store(false, Ordering::Release);
        std::mem::take(&mut *self.deferred.lock())
    }
}

/// Handle to an open transaction, passed to the closure given to
/// [`Db::transact`].
///
/// Dereferences to a [`Db`] bound to the transaction, so every facade
/// operation is available, and code written against `&Db` can be handed
/// `&txn`: its [`Db::transact`] calls run inline and its
/// [`Db::between_transactions`] callbacks wait for the commit.
pub struct Txn<S> {
    db: Db<S>,
}

impl<S> Deref for Txn<S> {
    type Target = Db<S>;

    fn deref(&self) -> &Db<S> {
        &self.db
    }
}

/// Rolls the transaction back unless disarmed, including during unwinding.
struct RollbackGuard<'a, S: OrderedStore> {
    store: &'a S,
    state: &'a TxnState<S>,
    armed: bool,
}

impl<S: OrderedStore> Drop for RollbackGuard<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.state.close();
        match self.store.end_transaction(false) {
            Ok(()) => debug!("transaction rolled back after panic"),
            Err(err) => warn!(error = %err, "rollback after panic failed"),
        }
    }
}

impl<S: OrderedStore> Db<S> {
    fn open_txn(&self) -> Option<&Arc<TxnState<S>>> {
        self.txn.as_ref().filter(|state| state.is_open())
    }

    /// Whether this handle is bound to an open transaction.
    pub fn in_transaction(&self) -> bool {
        self.open_txn().is_some()
    }

    /// Run `f` in a store-wide transaction.
    ///
    /// Commits when `f` returns `Ok`, then runs callbacks registered with
    /// [`between_transactions`](Self::between_transactions). Rolls back when
    /// `f` returns `Err` or panics; the error or panic then propagates
    /// unchanged. On a handle already bound to a transaction `f` runs inline
    /// as part of it.
    pub fn transact<T, E>(&self, f: impl FnOnce(&Txn<S>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<Error>,
    {
        if self.in_transaction() {
            return f(&Txn { db: self.clone() });
        }

        self.begin_transaction(self.durable_transactions)?;
        debug!(durable = self.durable_transactions, "transaction started");

        let state = Arc::new(TxnState::new());
        let mut guard = RollbackGuard {
            store: self.store(),
            state: &state,
            armed: true,
        };
        let txn = Txn {
            db: Db {
                txn: Some(Arc::clone(&state)),
                ..self.clone()
            },
        };
        let result = f(&txn);
        guard.armed = false;
        let deferred = state.close();

        match result {
            Ok(value) => {
                self.end_transaction(true)?;
                debug!(callbacks = deferred.len(), "transaction committed");
                for callback in deferred {
                    callback(self);
                }
                Ok(value)
            }
            Err(err) => {
                match self.end_transaction(false) {
                    Ok(()) => debug!("transaction rolled back"),
                    Err(rollback) => warn!(error = %rollback, "rollback failed"),
                }
                Err(err)
            }
        }
    }

    /// Run `f` between transactions.
    ///
    /// Outside a transaction `f` runs now. On a handle bound to a transaction
    /// it runs after that transaction commits, outside of it, and is dropped
    /// if the transaction rolls back.
    pub fn between_transactions(&self, f: impl FnOnce(&Db<S>) + Send + 'static) {
        match self.open_txn() {
            Some(state) => state.deferred.lock().push(Box::new(f)),
            None => f(self),
        }
    }
}

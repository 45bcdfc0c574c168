use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::debug;

use crate::error::{NosqlError, NosqlResult};
use crate::traits::ConnectionAllocator;

/// Connection state shared by every backend: the native handle, the config
/// it was opened with, and the session flags.
///
/// The handle lives in an `Option`. `disconnect` takes it out before
/// closing, so a second `disconnect` (or the final `Drop`) finds nothing
/// to close.
pub struct DbConnection<A: ConnectionAllocator> {
    handle: Option<A::Handle>,
    config: Option<A::Config>,
    authenticated: bool,
    current_db: Option<String>,
    interrupted: Arc<AtomicBool>,
}

impl<A: ConnectionAllocator> Default for DbConnection<A> {
    fn default() -> Self {
        DbConnection {
            handle: None,
            config: None,
            authenticated: false,
            current_db: None,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<A: ConnectionAllocator> DbConnection<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, config: A::Config) -> NosqlResult<()> {
        if self.is_connected() {
            return Err(NosqlError::AlreadyConnected);
        }
        // A handle that went dead is released before reconnecting.
        self.disconnect();

        let start = Instant::now();
        debug!("{}: connecting with {:?}", A::NAME, config);
        let handle = A::connect(&config)?;
        self.handle = Some(handle);
        self.config = Some(config);
        debug!("{}: connected in {:?}", A::NAME, start.elapsed());
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Some(handle) = self.handle.take() {
            let start = Instant::now();
            A::disconnect(handle);
            debug!("{}: disconnected in {:?}", A::NAME, start.elapsed());
        }
        self.authenticated = false;
        self.current_db = None;
    }

    pub fn is_connected(&self) -> bool {
        self.handle.as_ref().is_some_and(A::is_connected)
    }

    pub fn handle(&self) -> NosqlResult<&A::Handle> {
        self.handle.as_ref().ok_or(NosqlError::NotConnected)
    }

    pub fn handle_mut(&mut self) -> NosqlResult<&mut A::Handle> {
        self.handle.as_mut().ok_or(NosqlError::NotConnected)
    }

    /// Config of the current (or last) connection.
    pub fn config(&self) -> Option<&A::Config> {
        self.config.as_ref()
    }

    pub fn test_is_connected(&self) -> NosqlResult<()> {
        if !self.is_connected() {
            return Err(NosqlError::NotConnected);
        }
        Ok(())
    }

    pub fn test_is_authenticated(&self) -> NosqlResult<()> {
        self.test_is_connected()?;
        if !self.authenticated {
            return Err(NosqlError::NotAuthenticated);
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    pub fn current_db_name(&self) -> Option<&str> {
        self.current_db.as_deref()
    }

    pub fn set_current_db_name(&mut self, name: impl Into<String>) {
        self.current_db = Some(name.into());
    }

    /// Shared cancellation flag for long-running verbs.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    pub fn set_interrupted(&self, interrupted: bool) {
        self.interrupted.store(interrupted, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

impl<A: ConnectionAllocator> Drop for DbConnection<A> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            A::disconnect(handle);
        }
    }
}

// Connection pool shared by connectors.
//
// The pool is filled lazily: `get_or_create` hands out an idle connection if
// there is one, otherwise it creates a new one. When a PooledConnection is
// dropped the connection goes back to the idle list, up to `capacity`.
//
// The pool also counts connections that are checked out, so a connector can
// refuse to shut down while a check still holds one.

use crate::error::Result;
use crate::fixture::LifecycleError;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const POOL_SIZE: usize = 10;

struct InnerConnectionPool<C> {
    idle: Mutex<Vec<C>>,
    checked_out: AtomicUsize,
    capacity: usize,
}

pub struct ConnectionPool<C> {
    inner: Arc<InnerConnectionPool<C>>,
}

impl<C> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Default for ConnectionPool<C> {
    fn default() -> Self {
        Self::new(POOL_SIZE)
    }
}

impl<C> ConnectionPool<C> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(InnerConnectionPool {
                idle: Mutex::new(Vec::with_capacity(capacity)),
                checked_out: AtomicUsize::new(0),
                capacity,
            }),
        }
    }

    pub fn get_or_create(&self, create: impl FnOnce() -> Result<C>) -> Result<PooledConnection<C>> {
        let idle = self.inner.idle.lock().pop();
        let conn = match idle {
            Some(conn) => conn,
            None => create()?,
        };
        self.inner.checked_out.fetch_add(1, Ordering::SeqCst);
        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
        })
    }

    pub fn available_connections(&self) -> usize {
        self.inner.idle.lock().len()
    }

    pub fn checked_out(&self) -> usize {
        self.inner.checked_out.load(Ordering::SeqCst)
    }

    /// Drop every idle connection. Fails, leaving the idle list intact, when
    /// connections are still checked out.
    pub fn clear(&self) -> std::result::Result<(), LifecycleError> {
        let checked_out = self.checked_out();
        if checked_out > 0 {
            return Err(LifecycleError::LeakedConnections(checked_out));
        }
        self.inner.idle.lock().clear();
        Ok(())
    }
}

/// A connection on loan from a [`ConnectionPool`].
pub struct PooledConnection<C> {
    conn: Option<C>,
    pool: Arc<InnerConnectionPool<C>>,
}

impl<C> PooledConnection<C> {
    /// Release without returning the connection to the pool, e.g. after it
    /// reported a broken state.
    pub fn discard(mut self) {
        self.conn.take();
        self.pool.checked_out.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<C> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        // only `discard` and `drop` empty the slot, and both consume self
        self.conn.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<C> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut C {
        self.conn.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<C> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let mut idle = self.pool.idle.lock();
            if idle.len() < self.pool.capacity {
                idle.push(conn);
            }
            drop(idle);
            self.pool.checked_out.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_connections_are_reused() {
        let pool = ConnectionPool::new(2);
        let mut created = 0;
        {
            let conn = pool
                .get_or_create(|| {
                    created += 1;
                    Ok(created)
                })
                .unwrap();
            assert_eq!(*conn, 1);
            assert_eq!(pool.checked_out(), 1);
        }
        assert_eq!(pool.available_connections(), 1);
        assert_eq!(pool.checked_out(), 0);

        let conn = pool.get_or_create(|| Ok(99)).unwrap();
        assert_eq!(*conn, 1);
    }

    #[test]
    fn test_capacity_bounds_idle_list() {
        let pool = ConnectionPool::new(1);
        let a = pool.get_or_create(|| Ok("a")).unwrap();
        let b = pool.get_or_create(|| Ok("b")).unwrap();
        drop(a);
        drop(b);
        assert_eq!(pool.available_connections(), 1);
    }

    #[test]
    fn test_clear_refuses_while_checked_out() {
        let pool = ConnectionPool::default();
        let conn = pool.get_or_create(|| Ok(())).unwrap();
        assert!(matches!(
            pool.clear(),
            Err(LifecycleError::LeakedConnections(1))
        ));
        drop(conn);
        assert_eq!(pool.available_connections(), 1);
        pool.clear().unwrap();
        assert_eq!(pool.available_connections(), 0);
    }

    #[test]
    fn test_discard_does_not_return() {
        let pool = ConnectionPool::default();
        let conn = pool.get_or_create(|| Ok(1)).unwrap();
        conn.discard();
        assert_eq!(pool.available_connections(), 0);
        assert_eq!(pool.checked_out(), 0);
    }

    #[test]
    fn test_create_error_is_propagated() {
        let pool: ConnectionPool<u8> = ConnectionPool::default();
        let err = pool
            .get_or_create(|| Err(Error::backend("unable to open database file")))
            .err()
            .unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::Backend);
        assert_eq!(pool.checked_out(), 0);
    }
}

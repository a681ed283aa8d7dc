//! Random, collision-free assignment of passive-mode data ports.

use rand::rngs::OsRng;
use rand::Rng;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Why a passive port could not be leased.
#[derive(Debug, Error, PartialEq)]
pub enum PortError {
    /// The configured range is inverted, which disables passive mode.
    #[error("passive mode is disabled")]
    Disabled,

    /// Every port of the range is currently leased.
    #[error("no free passive port")]
    Exhausted,
}

#[derive(Debug)]
struct PoolState {
    // Permutation of the range: free ports form the prefix `[0, free)`,
    // leased ports the suffix.
    ports: Vec<u16>,
    // Inverted index: idx[port - min] is the position of `port` in `ports`.
    idx: Vec<usize>,
    free: usize,
}

/// The process-wide table of passive-mode ports in `[min, max]`.
///
/// `min > max` disables passive mode entirely; `max == 0` means the
/// operating system picks a port (leases carry port 0 and releasing them is
/// a no-op). Both `choose` and `release` are O(1); the permutation is built
/// lazily on the first `choose`. Selection is backed by the OS random number
/// generator so the sequence cannot be predicted by an attacker.
#[derive(Debug)]
pub struct PortPool {
    min: i32,
    max: i32,
    state: Mutex<Option<PoolState>>,
}

impl PortPool {
    /// Creates a pool over the inclusive range `[min, max]`.
    pub fn new(min: i32, max: i32) -> PortPool {
        PortPool {
            min,
            max,
            state: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<Option<PoolState>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Leases a uniformly random free port. The lease returns the port to
    /// the pool when dropped.
    pub fn choose(self: &Arc<Self>) -> Result<PortLease, PortError> {
        if self.min > self.max {
            return Err(PortError::Disabled);
        }
        if self.max == 0 {
            // Port 0: let the operating system choose; nothing to track.
            return Ok(PortLease { port: 0, pool: None });
        }
        let min = self.min.max(0);
        let max = self.max.min(65535);

        let mut guard = self.lock();
        let state = guard.get_or_insert_with(|| {
            let n = (max - min + 1) as usize;
            PoolState {
                ports: (0..n).map(|i| (min as usize + i) as u16).collect(),
                idx: (0..n).collect(),
                free: n,
            }
        });
        if state.free == 0 {
            return Err(PortError::Exhausted);
        }

        let j = OsRng.gen_range(0..state.free);
        state.free -= 1;
        let last = state.free;
        let (chosen, moved) = (state.ports[j], state.ports[last]);
        state.ports[j] = moved;
        state.ports[last] = chosen;
        state.idx[(chosen as i32 - min) as usize] = last;
        state.idx[(moved as i32 - min) as usize] = j;

        Ok(PortLease {
            port: chosen,
            pool: Some(Arc::clone(self)),
        })
    }

    // Returns a leased port to the free set. A port outside the configured
    // range is a programming error, never reachable from client input.
    fn release(&self, port: u16) {
        let min = self.min.max(0);
        let max = self.max.min(65535);
        assert!(
            (port as i32) >= min && (port as i32) <= max,
            "invalid port number {}",
            port
        );
        let mut guard = self.lock();
        let state = match guard.as_mut() {
            Some(state) => state,
            None => return,
        };

        let idx1 = state.idx[(port as i32 - min) as usize];
        let idx2 = state.free;
        let other = state.ports[idx2];
        state.ports.swap(idx1, idx2);
        state.idx.swap((port as i32 - min) as usize, (other as i32 - min) as usize);
        state.free += 1;
    }
}

/// The right to use one passive port, handed out by [`PortPool::choose`].
/// Dropping the lease returns the port.
#[derive(Debug)]
pub struct PortLease {
    port: u16,
    pool: Option<Arc<PortPool>>,
}

impl PortLease {
    /// The leased port number; 0 when the operating system picks one.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(self.port);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_chosen_port() {
        let pool = Arc::new(PortPool::new(0, 0));
        let lease = pool.choose().unwrap();
        assert_eq!(lease.port(), 0);
    }

    #[test]
    fn inverted_range_disables_passive_mode() {
        let pool = Arc::new(PortPool::new(0, -1));
        assert_eq!(pool.choose().unwrap_err(), PortError::Disabled);
    }

    #[test]
    fn random_ports_are_collision_free() {
        let pool = Arc::new(PortPool::new(10000, 10001));

        let lease1 = pool.choose().unwrap();
        assert!(lease1.port() == 10000 || lease1.port() == 10001);

        let lease2 = pool.choose().unwrap();
        assert!(lease2.port() == 10000 || lease2.port() == 10001);
        assert_ne!(lease1.port(), lease2.port());

        assert_eq!(pool.choose().unwrap_err(), PortError::Exhausted);

        let released = lease1.port();
        drop(lease1);
        let lease3 = pool.choose().unwrap();
        assert_eq!(lease3.port(), released);
    }

    #[test]
    fn every_port_eventually_comes_back() {
        let pool = Arc::new(PortPool::new(20000, 20007));
        for _ in 0..3 {
            let leases: Vec<_> = (0..8).map(|_| pool.choose().unwrap()).collect();
            let mut ports: Vec<u16> = leases.iter().map(|l| l.port()).collect();
            ports.sort_unstable();
            assert_eq!(ports, (20000..=20007).collect::<Vec<u16>>());
            assert_eq!(pool.choose().unwrap_err(), PortError::Exhausted);
        }
    }
}

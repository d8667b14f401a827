//! Channel lifecycle notifications.
//!
//! The transport that owns a channel reports lifecycle transitions through a
//! [`ConnectivityNotifier`], which fans each event out to every registered
//! [`ConnectivityListener`].
//!
//! # Delivery guarantees
//!
//! - A listener is never reentered. Each registration has its own FIFO
//!   mailbox; an event that arrives while the listener is still inside a
//!   callback (emitted by another thread, or by the listener itself) is
//!   queued and delivered by the thread already draining that mailbox.
//! - Events emitted from one thread reach each listener in emission order.
//!   An event emitted from inside a callback is held until the event being
//!   dispatched has reached every listener, so all listeners observe the
//!   same sequence.
//! - Different listeners may be called concurrently by different emitters.
//! - Listeners may register or unregister listeners from inside a callback;
//!   the registration lock is never held while calling out.
//!
//! No ordering between event kinds is enforced here. Emitting a sequence that
//! matches a real channel lifecycle is the transport's job.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::ThreadId;
use tracing::{debug, trace};

/// Receiver of channel lifecycle callbacks.
pub trait ConnectivityListener: Send + Sync {
    fn on_connecting(&self);
    fn on_connected(&self);
    fn on_disconnected(&self);
    fn on_authentication_failure(&self);
}

/// One lifecycle transition of a transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityEvent {
    Connecting,
    Connected,
    Disconnected,
    AuthenticationFailure,
}

impl ConnectivityEvent {
    /// Invokes the callback slot matching this event.
    pub fn dispatch_to(self, listener: &dyn ConnectivityListener) {
        match self {
            ConnectivityEvent::Connecting => listener.on_connecting(),
            ConnectivityEvent::Connected => listener.on_connected(),
            ConnectivityEvent::Disconnected => listener.on_disconnected(),
            ConnectivityEvent::AuthenticationFailure => listener.on_authentication_failure(),
        }
    }
}

/// Handle returned by [`ConnectivityNotifier::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Mailbox {
    queue: VecDeque<ConnectivityEvent>,
    draining: bool,
}

struct Registration {
    id: ListenerId,
    listener: Arc<dyn ConnectivityListener>,
    mailbox: Mutex<Mailbox>,
}

impl Registration {
    fn deliver(&self, event: ConnectivityEvent) {
        {
            let mut mailbox = self.mailbox.lock();
            mailbox.queue.push_back(event);
            if mailbox.draining {
                return;
            }
            mailbox.draining = true;
        }

        let _guard = DrainGuard(&self.mailbox);
        loop {
            let next = {
                let mut mailbox = self.mailbox.lock();
                if let Some(next) = mailbox.queue.pop_front() {
                    next
                } else {
                    mailbox.draining = false;
                    return;
                }
            };
            next.dispatch_to(self.listener.as_ref());
        }
    }
}

/// Releases the drain flag if a listener panics mid-callback, so later events
/// still get delivered.
struct DrainGuard<'a>(&'a Mutex<Mailbox>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().draining = false;
        }
    }
}

/// Events emitted on a dispatching thread, each with the listener snapshot
/// taken when it was emitted.
type Pending = VecDeque<(ConnectivityEvent, Vec<Arc<Registration>>)>;

/// Ends a thread's dispatch pass, including when a listener panics.
struct DispatchGuard<'a> {
    dispatching: &'a Mutex<HashMap<ThreadId, Pending>>,
    thread: ThreadId,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.dispatching.lock().remove(&self.thread);
    }
}

/// Fan-out point for channel lifecycle events.
///
/// Constructed explicitly and shared by `Arc`; there is no process-wide
/// instance.
pub struct ConnectivityNotifier {
    registrations: RwLock<Vec<Arc<Registration>>>,
    dispatching: Mutex<HashMap<ThreadId, Pending>>,
    next_id: AtomicU64,
}

impl ConnectivityNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            dispatching: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn register(&self, listener: Arc<dyn ConnectivityListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.registrations.write().push(Arc::new(Registration {
            id,
            listener,
            mailbox: Mutex::new(Mailbox::default()),
        }));

        debug!(listener = id.0, "connectivity listener registered");
        id
    }

    /// Removes a listener. Returns `false` if `id` was not registered.
    ///
    /// Events already queued for the listener are still delivered.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut registrations = self.registrations.write();
        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        let removed = registrations.len() != before;

        if removed {
            debug!(listener = id.0, "connectivity listener unregistered");
        }
        removed
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registrations.read().len()
    }

    /// Delivers `event` to every listener registered at the time of the call.
    ///
    /// Called from inside a callback on a thread that is already dispatching,
    /// the event is queued and delivered by the outermost call once the
    /// current event has reached every listener.
    pub fn notify(&self, event: ConnectivityEvent) {
        let snapshot: Vec<Arc<Registration>> = self.registrations.read().clone();
        let thread = std::thread::current().id();

        {
            let mut dispatching = self.dispatching.lock();
            if let Some(pending) = dispatching.get_mut(&thread) {
                trace!(?event, "queued nested connectivity event");
                pending.push_back((event, snapshot));
                return;
            }
            dispatching.insert(thread, Pending::new());
        }

        let _guard = DispatchGuard {
            dispatching: &self.dispatching,
            thread,
        };
        let mut next = Some((event, snapshot));
        while let Some((event, snapshot)) = next.take() {
            trace!(?event, listeners = snapshot.len(), "dispatching connectivity event");
            for registration in snapshot {
                registration.deliver(event);
            }
            next = self
                .dispatching
                .lock()
                .get_mut(&thread)
                .and_then(VecDeque::pop_front);
        }
    }
}

impl Default for ConnectivityNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectivityNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Lets a transport hold the notifier as its single listener.
impl ConnectivityListener for ConnectivityNotifier {
    fn on_connecting(&self) {
        self.notify(ConnectivityEvent::Connecting);
    }

    fn on_connected(&self) {
        self.notify(ConnectivityEvent::Connected);
    }

    fn on_disconnected(&self) {
        self.notify(ConnectivityEvent::Disconnected);
    }

    fn on_authentication_failure(&self) {
        self.notify(ConnectivityEvent::AuthenticationFailure);
    }
}

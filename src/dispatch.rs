//! Demultiplexes decoded RX events between the application and the state
//! machine. Outside of an active [`crate::mac::MacCore::send`], a DATA
//! frame is only ever useful to the application; during a listen window
//! inside `send`, the same frame is *also* a deferral trigger, which
//! [`crate::mac::MacCore`] handles itself — this type only owns the
//! application-facing half.

use crate::radio::RxEvent;

/// A single-slot RX callback: `fn(payload, rssi_dbm, snr_db)`. Function
/// pointer rather than a boxed closure, since this crate assumes no
/// allocator.
pub type RxCallback = fn(payload: &[u8], rssi_dbm: i16, snr_db: f32);

/// Holds at most one registered callback. Registering a new one replaces
/// the old one outright; there is no chain to walk and no way to remove a
/// callback short of registering a no-op.
#[derive(Default)]
pub struct ReceiveDispatcher {
    callback: Option<RxCallback>,
}

impl ReceiveDispatcher {
    /// Register `callback`, replacing whatever was registered before.
    pub fn set_callback(&mut self, callback: RxCallback) {
        self.callback = Some(callback);
    }

    /// Hand a decoded DATA event to the registered callback, if any. A
    /// no-op if nothing is registered — the frame is simply not observed
    /// by the application.
    pub fn deliver(&self, event: &RxEvent) {
        if let Some(cb) = self.callback {
            cb(event.payload(), event.rssi_dbm, event.snr_db);
        }
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn no_callback_is_a_silent_no_op() {
        let dispatcher = ReceiveDispatcher::default();
        let event = RxEvent::new(0x02, &[1, 2, 3], -50, 8.0).unwrap();
        dispatcher.deliver(&event);
        assert!(!dispatcher.has_callback());
    }

    static CALLS: AtomicU32 = AtomicU32::new(0);

    #[test]
    fn registering_twice_replaces_rather_than_appends() {
        fn first(_payload: &[u8], _rssi: i16, _snr: f32) {
            CALLS.fetch_add(1, Ordering::SeqCst);
        }
        fn second(_payload: &[u8], _rssi: i16, _snr: f32) {
            CALLS.fetch_add(100, Ordering::SeqCst);
        }

        CALLS.store(0, Ordering::SeqCst);
        let mut dispatcher = ReceiveDispatcher::default();
        dispatcher.set_callback(first);
        dispatcher.set_callback(second);

        let event = RxEvent::new(0x02, &[9], 0, 0.0).unwrap();
        dispatcher.deliver(&event);
        assert_eq!(CALLS.load(Ordering::SeqCst), 100);
    }
}

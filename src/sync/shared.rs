//! ISR-safe controller wrapper using critical sections.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::driver::controller::Controller;
use crate::driver::error::Result;
use crate::driver::notify::{ErrorSink, RequestSink, StatusSink, deliver};
use crate::driver::request::{CancelOutcome, Rejected, RequestId, UserRequest};
use crate::hal::framer::LineFramer;
use crate::hal::pcm::PcmController;
use crate::internal::constants::{DEFAULT_DESCRIPTORS, DEFAULT_REQUESTS};

/// ISR-safe controller wrapper.
///
/// Every operation runs inside `critical_section::with()`, so the task side
/// and the interrupt handler can share one controller. Notifications are
/// delivered with the lock released, which lets sinks submit or cancel
/// through the same wrapper.
///
/// The wrapper is `Sync` when the chip and framer handles are `Send`.
///
/// # Example
///
/// ```ignore
/// static CTRL: SharedController<Pcm, Framers> =
///     SharedController::new(Controller::new(Pcm::new(), Framers::new(), CONFIG));
///
/// CTRL.with(|ctrl| ctrl.start(&mut delay))?;
/// CTRL.submit(UserRequest::new(Command::START_RX, 0))?;
///
/// #[interrupt]
/// fn PCM_IRQ() {
///     if CTRL.handle_interrupt() {
///         CTRL.dispatch(&mut SINKS);
///     }
/// }
/// ```
pub struct SharedController<
    P: PcmController,
    F: LineFramer,
    const DESCS: usize = { DEFAULT_DESCRIPTORS },
    const REQS: usize = { DEFAULT_REQUESTS },
> {
    inner: Mutex<RefCell<Controller<P, F, DESCS, REQS>>>,
}

impl<P, F, const DESCS: usize, const REQS: usize> SharedController<P, F, DESCS, REQS>
where
    P: PcmController,
    F: LineFramer,
{
    /// Wrap a controller (const, suitable for static initialization).
    pub const fn new(controller: Controller<P, F, DESCS, REQS>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(controller)),
        }
    }

    /// Execute a closure with exclusive access to the controller.
    ///
    /// Interrupts are disabled for the duration of the closure.
    ///
    /// # Panics
    ///
    /// Panics when called from inside another `with` on the same wrapper,
    /// e.g. from a sink invoked by [`Controller::dispatch`] inside `with`.
    /// Use [`dispatch`](Self::dispatch) or [`try_with`](Self::try_with) there.
    #[inline]
    pub fn with<R, G>(&self, f: G) -> R
    where
        G: FnOnce(&mut Controller<P, F, DESCS, REQS>) -> R,
    {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Try to execute a closure, returning `None` if the controller is
    /// already borrowed further up the stack.
    #[inline]
    pub fn try_with<R, G>(&self, f: G) -> Option<R>
    where
        G: FnOnce(&mut Controller<P, F, DESCS, REQS>) -> R,
    {
        critical_section::with(|cs| {
            let mut ctrl = self.inner.borrow(cs).try_borrow_mut().ok()?;
            Some(f(&mut ctrl))
        })
    }

    /// Submit a request; see [`Controller::submit`].
    pub fn submit(&self, request: UserRequest) -> core::result::Result<RequestId, Rejected> {
        self.with(|ctrl| ctrl.submit(request))
    }

    /// Cancel a request; see [`Controller::cancel`].
    pub fn cancel(&self, id: RequestId, break_if_running: bool) -> CancelOutcome {
        self.with(|ctrl| ctrl.cancel(id, break_if_running))
    }

    /// Process a chip interrupt; see [`Controller::handle_interrupt`].
    pub fn handle_interrupt(&self) -> bool {
        self.with(|ctrl| ctrl.handle_interrupt())
    }

    /// Sample the framers; see [`Controller::poll_status`].
    pub fn poll_status(&self) -> Result<()> {
        self.with(|ctrl| ctrl.poll_status())
    }

    /// Deliver queued notifications one at a time.
    ///
    /// Each notification is taken under the lock and delivered after it is
    /// released. Returns the number delivered.
    pub fn dispatch<S>(&self, sinks: &mut S) -> usize
    where
        S: RequestSink + ErrorSink + StatusSink,
    {
        let mut count = 0;
        while let Some(notification) = self.with(|ctrl| ctrl.next_notification()) {
            deliver(sinks, notification);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::driver::config::ControllerConfig;
    use crate::driver::error::ErrorBits;
    use crate::driver::notify::ErrorSource;
    use crate::driver::request::Command;
    use crate::driver::status::AlarmFlags;
    use crate::hal::framer::FifoKind;
    use crate::testing::{MockDelay, MockFramer, MockPcm};

    const BASE: u32 = 0x1000_0000;

    type Shared = SharedController<MockPcm, MockFramer, 80, 16>;

    fn shared() -> Shared {
        let config = ControllerConfig::new().with_descriptor_base(BASE);
        let shared = Shared::new(Controller::new(MockPcm::new(BASE), MockFramer::new(), config));
        shared.with(|ctrl| ctrl.start(MockDelay::new())).unwrap();
        settle(&shared);
        shared
    }

    fn settle(shared: &Shared) {
        for _ in 0..64 {
            let progressed = shared.with(|ctrl| {
                let chip = ctrl.chip_mut();
                if chip.ack_action(true).is_some() {
                    return true;
                }
                let armed = chip.timer.is_some();
                chip.expire_timer();
                armed
            });
            if !progressed {
                return;
            }
            assert!(shared.handle_interrupt());
        }
        panic!("engine did not settle");
    }

    /// Sink that starts the transmit side when the receive start completes.
    struct Chaining<'a> {
        shared: &'a Shared,
        completed: Vec<RequestId>,
        follow_up: Option<RequestId>,
    }

    impl RequestSink for Chaining<'_> {
        fn on_complete(&mut self, id: RequestId, request: &UserRequest) {
            self.completed.push(id);
            if request.command == Command::START_RX && self.follow_up.is_none() {
                let next = UserRequest::new(Command::START_TX, request.channel);
                self.follow_up = self.shared.submit(next).ok();
            }
        }
    }

    impl ErrorSink for Chaining<'_> {
        fn on_error(&mut self, _source: ErrorSource, _bits: ErrorBits) {}
    }

    impl StatusSink for Chaining<'_> {
        fn on_status_change(&mut self, _interface: u8, _delta: AlarmFlags) {}

        fn on_fifo_trigger(&mut self, _interface: u8, _kind: FifoKind) {}
    }

    #[test]
    fn with_and_try_with_reach_the_controller() {
        let shared = shared();
        assert!(shared.with(|ctrl| ctrl.state()) == crate::driver::config::State::Running);
        assert_eq!(shared.try_with(|ctrl| ctrl.free_descriptors()), Some(16));
        assert_eq!(shared.with(|_| shared.try_with(|ctrl| ctrl.free_descriptors())), None);
    }

    #[test]
    fn sinks_can_submit_while_dispatching() {
        let shared = shared();
        let first = shared.submit(UserRequest::new(Command::START_RX, 3)).unwrap();
        settle(&shared);

        let mut sink = Chaining {
            shared: &shared,
            completed: Vec::new(),
            follow_up: None,
        };
        assert_eq!(shared.dispatch(&mut sink), 1);
        assert_eq!(sink.completed, [first]);
        let follow_up = sink.follow_up.expect("follow-up rejected");

        settle(&shared);
        assert_eq!(shared.dispatch(&mut sink), 1);
        assert_eq!(sink.completed, [first, follow_up]);
        let state = shared.with(|ctrl| ctrl.channel_state(3)).unwrap();
        assert!(state.rx_running && state.tx_running);
    }

    #[test]
    fn cancel_and_poll_go_through_the_lock() {
        let shared = shared();
        shared.submit(UserRequest::new(Command::START_RX, 1)).unwrap();
        let queued = shared.submit(UserRequest::new(Command::START_RX, 2)).unwrap();
        assert_eq!(shared.cancel(queued, false), CancelOutcome::Cancelled);
        assert!(shared.poll_status().is_ok());
        settle(&shared);
    }
}

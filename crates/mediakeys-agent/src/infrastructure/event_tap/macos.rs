//! CoreGraphics event tap backend.
//!
//! The tap is created with raw `CGEventTapCreate` rather than a wrapper type:
//! media keys arrive as `NX_SYSDEFINED` (type 14), which the wrapper crates'
//! event-type enums do not model, and suppressing an event means returning
//! NULL from the callback.
//!
//! # Resource ownership
//!
//! ```text
//! MacosEventTap (tap thread only)
//!  ├─ source   CFRunLoopSource          attached by activate(), released on drop
//!  ├─ _context Box<CallbackContext>     user_info of the tap; dropped last
//!  └─ control  Arc<MacosTapControl>     shared with the manager
//!       ├─ port      CFMachPort (the tap)
//!       └─ run_loop  CFRunLoop of the tap thread
//! ```
//!
//! The port is invalidated before the context box is freed, so the OS can
//! never call back into a dangling `user_info`.

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use core_foundation::base::{CFRelease, CFRetain, CFTypeRef};
use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode};
use core_foundation::string::CFStringRef;
use core_graphics::geometry::CGPoint;
use mediakeys_core::classify::NS_EVENT_TYPE_SYSTEM_DEFINED;
use mediakeys_core::{ModifierSet, RawInputEvent};
use objc::rc::autoreleasepool;
use objc::runtime::{Class, Object};
use objc::{msg_send, sel, sel_impl};
use tracing::{debug, error};

use super::{
    EventTap, NativeEvent, TapBackend, TapControl, TapCreateError, TapEvent, TapEventHandler,
    TapLocation, TapNotice, TapVerdict,
};

type CGEventRef = CFTypeRef;
type CGEventTapProxy = *const c_void;
type CGEventMask = u64;
type TapCallback = extern "C" fn(CGEventTapProxy, u32, CGEventRef, *mut c_void) -> CGEventRef;

/// `kCGHeadInsertEventTap`.
const HEAD_INSERT_EVENT_TAP: u32 = 0;
/// `kCGEventTapOptionDefault`: an active filter that may drop events.
const EVENT_TAP_OPTION_DEFAULT: u32 = 0;
/// `kCGEventTapDisabledByTimeout`.
const EVENT_TAP_DISABLED_BY_TIMEOUT: u32 = 0xFFFF_FFFE;
/// `kCGEventTapDisabledByUserInput`.
const EVENT_TAP_DISABLED_BY_USER_INPUT: u32 = 0xFFFF_FFFF;

const SYSTEM_DEFINED_MASK: CGEventMask = 1 << NS_EVENT_TYPE_SYSTEM_DEFINED;

/// How long one run-loop slice lasts before the stop flag is re-checked.
const RUN_SLICE_SECONDS: f64 = 0.5;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapCreate(
        tap: u32,
        place: u32,
        options: u32,
        events_of_interest: CGEventMask,
        callback: TapCallback,
        user_info: *mut c_void,
    ) -> CFTypeRef;
    fn CGEventTapEnable(tap: CFTypeRef, enable: bool);
    fn CGEventTapIsEnabled(tap: CFTypeRef) -> bool;
    fn CGEventGetLocation(event: CGEventRef) -> CGPoint;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFMachPortCreateRunLoopSource(allocator: CFTypeRef, port: CFTypeRef, order: isize)
        -> CFTypeRef;
    fn CFMachPortInvalidate(port: CFTypeRef);
    fn CFRunLoopGetCurrent() -> CFTypeRef;
    fn CFRunLoopAddSource(rl: CFTypeRef, source: CFTypeRef, mode: CFStringRef);
    fn CFRunLoopRemoveSource(rl: CFTypeRef, source: CFTypeRef, mode: CFStringRef);
    fn CFRunLoopRunInMode(mode: CFStringRef, seconds: f64, return_after_source_handled: bool)
        -> i32;
    fn CFRunLoopStop(rl: CFTypeRef);
}

// NSEvent lives in AppKit.
#[link(name = "AppKit", kind = "framework")]
extern "C" {}

fn location_code(location: TapLocation) -> u32 {
    match location {
        TapLocation::Hid => 0,
        TapLocation::Session => 1,
        TapLocation::AnnotatedSession => 2,
    }
}

// ── CF ownership ──────────────────────────────────────────────────────────────

/// A CF object this code holds one retain count on.
struct CfOwned(CFTypeRef);

impl Drop for CfOwned {
    fn drop(&mut self) {
        // SAFETY: we own exactly one retain on a non-null object.
        unsafe { CFRelease(self.0) }
    }
}

// SAFETY: CFRetain/CFRelease are thread-safe, and the wrapped port and run
// loop are only touched through CGEventTapEnable, CGEventTapIsEnabled and
// CFRunLoopStop, which are documented as callable from any thread.
unsafe impl Send for CfOwned {}
unsafe impl Sync for CfOwned {}

// ── Control ───────────────────────────────────────────────────────────────────

struct MacosTapControl {
    port: CfOwned,
    run_loop: CfOwned,
    stopped: AtomicBool,
}

impl TapControl for MacosTapControl {
    fn set_enabled(&self, enabled: bool) {
        // SAFETY: `port` is a live event tap port.
        unsafe { CGEventTapEnable(self.port.0, enabled) }
    }

    fn is_enabled(&self) -> bool {
        // SAFETY: as above.
        unsafe { CGEventTapIsEnabled(self.port.0) }
    }

    fn stop_loop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        // SAFETY: `run_loop` is retained; stopping a loop that is not
        // running is harmless and the flag covers that case.
        unsafe { CFRunLoopStop(self.run_loop.0) }
    }
}

// ── Tap ───────────────────────────────────────────────────────────────────────

/// The callback's view of the engine.  Never owns it.
struct CallbackContext {
    handler: Weak<dyn TapEventHandler>,
}

pub struct MacosEventTap {
    control: Arc<MacosTapControl>,
    source: CfOwned,
    /// Whether `source` is on the run loop.
    attached: bool,
    /// Read only through the tap's `user_info`; kept alive until drop.
    _context: Box<CallbackContext>,
}

impl EventTap for MacosEventTap {
    fn control(&self) -> Arc<dyn TapControl> {
        Arc::clone(&self.control) as Arc<dyn TapControl>
    }

    fn activate(&mut self) {
        if self.attached || self.control.stopped.load(Ordering::SeqCst) {
            return;
        }
        // SAFETY: the run loop is this thread's own, and the source belongs
        // to the retained port.
        unsafe {
            CFRunLoopAddSource(
                self.control.run_loop.0,
                self.source.0,
                kCFRunLoopCommonModes,
            );
            CGEventTapEnable(self.control.port.0, true);
        }
        self.attached = true;
    }

    fn run(self: Box<Self>) {
        let control = &self.control;
        while self.attached && !control.stopped.load(Ordering::SeqCst) {
            // SAFETY: runs the current thread's loop for one slice.
            unsafe {
                CFRunLoopRunInMode(kCFRunLoopDefaultMode, RUN_SLICE_SECONDS, false);
            }
        }

        if self.attached {
            // SAFETY: same objects as in `activate`, on the same thread.
            unsafe {
                CGEventTapEnable(control.port.0, false);
                CFRunLoopRemoveSource(control.run_loop.0, self.source.0, kCFRunLoopCommonModes);
            }
            debug!("event tap source detached");
        }
    }
}

impl Drop for MacosEventTap {
    fn drop(&mut self) {
        // SAFETY: invalidation is idempotent; after it returns the OS
        // delivers no further callbacks carrying `context`.
        unsafe {
            CGEventTapEnable(self.control.port.0, false);
            CFMachPortInvalidate(self.control.port.0);
        }
    }
}

// ── Native events ─────────────────────────────────────────────────────────────

/// A retained `CGEventRef` waiting for primary-thread decoding.
struct RetainedEvent {
    event: CGEventRef,
    category: u32,
}

impl RetainedEvent {
    /// # Safety
    /// `event` must be a valid `CGEventRef`.
    unsafe fn retain(event: CGEventRef, category: u32) -> Self {
        Self {
            event: CFRetain(event),
            category,
        }
    }
}

impl Drop for RetainedEvent {
    fn drop(&mut self) {
        // SAFETY: balanced with the CFRetain in `retain`.
        unsafe { CFRelease(self.event) }
    }
}

// SAFETY: CGEvent objects are reference counted with thread-safe CF
// retain/release, and the event is only read after being handed over.
unsafe impl Send for RetainedEvent {}

impl NativeEvent for RetainedEvent {
    fn decode(self: Box<Self>) -> Option<RawInputEvent> {
        let category = self.category;
        autoreleasepool(|| {
            let class = Class::get("NSEvent")?;
            // SAFETY: called on the primary thread; `self.event` is retained
            // for the duration, and the returned NSEvent is autoreleased into
            // the surrounding pool.
            unsafe {
                let ns_event: *mut Object = msg_send![class, eventWithCGEvent: self.event];
                if ns_event.is_null() {
                    return None;
                }
                let subtype: i16 = msg_send![ns_event, subtype];
                let data1: isize = msg_send![ns_event, data1];
                let modifier_flags: usize = msg_send![ns_event, modifierFlags];
                Some(RawInputEvent {
                    category,
                    subtype,
                    data1: data1 as i64,
                    modifiers: ModifierSet::from_native(modifier_flags as u64),
                })
            }
        })
    }
}

// ── Callback ──────────────────────────────────────────────────────────────────

extern "C" fn tap_callback(
    _proxy: CGEventTapProxy,
    event_type: u32,
    event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef {
    if user_info.is_null() {
        return event;
    }
    // SAFETY: `user_info` is the boxed CallbackContext owned by the
    // MacosEventTap, which invalidates the port before freeing it.
    let context = unsafe { &*(user_info as *const CallbackContext) };

    match panic::catch_unwind(AssertUnwindSafe(|| deliver(context, event_type, event))) {
        Ok(TapVerdict::Suppress) => ptr::null(),
        Ok(TapVerdict::PassThrough) => event,
        Err(_) => {
            error!("event tap handler panicked; passing event through");
            event
        }
    }
}

fn deliver(context: &CallbackContext, event_type: u32, event: CGEventRef) -> TapVerdict {
    let Some(handler) = context.handler.upgrade() else {
        return TapVerdict::PassThrough;
    };

    let tap_event = match event_type {
        EVENT_TAP_DISABLED_BY_TIMEOUT => TapEvent::Disabled(TapNotice::DisabledByTimeout),
        EVENT_TAP_DISABLED_BY_USER_INPUT => TapEvent::Disabled(TapNotice::DisabledByUserInput),
        category => {
            if event.is_null() {
                return TapVerdict::PassThrough;
            }
            // SAFETY: non-null event delivered by the OS for this callback.
            let (pointer, native) = unsafe {
                let location = CGEventGetLocation(event);
                (
                    (location.x, location.y),
                    RetainedEvent::retain(event, category),
                )
            };
            TapEvent::Input {
                category,
                pointer,
                native: Box::new(native),
            }
        }
    };
    handler.handle(tap_event)
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// Creates CoreGraphics taps for system-defined events.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacosTapBackend;

impl TapBackend for MacosTapBackend {
    fn create_tap(
        &self,
        location: TapLocation,
        handler: Weak<dyn TapEventHandler>,
    ) -> Result<Box<dyn EventTap>, TapCreateError> {
        let context = Box::new(CallbackContext { handler });
        let user_info = &*context as *const CallbackContext as *mut c_void;

        // SAFETY: `user_info` stays valid until the returned tap is dropped,
        // which invalidates the port first.
        let port = unsafe {
            CGEventTapCreate(
                location_code(location),
                HEAD_INSERT_EVENT_TAP,
                EVENT_TAP_OPTION_DEFAULT,
                SYSTEM_DEFINED_MASK,
                tap_callback,
                user_info,
            )
        };
        if port.is_null() {
            return Err(TapCreateError {
                location,
                reason: "CGEventTapCreate returned null".to_string(),
            });
        }
        let port = CfOwned(port);

        // SAFETY: `port` is a valid mach port from CGEventTapCreate.
        let source = unsafe { CFMachPortCreateRunLoopSource(ptr::null(), port.0, 0) };
        if source.is_null() {
            // SAFETY: as above; the port is released when `port` drops.
            unsafe { CFMachPortInvalidate(port.0) };
            return Err(TapCreateError {
                location,
                reason: "could not create run loop source".to_string(),
            });
        }

        // SAFETY: CFRunLoopGetCurrent follows the get rule; retain to own it.
        let run_loop = unsafe { CFRetain(CFRunLoopGetCurrent()) };

        Ok(Box::new(MacosEventTap {
            control: Arc::new(MacosTapControl {
                port,
                run_loop: CfOwned(run_loop),
                stopped: AtomicBool::new(false),
            }),
            source: CfOwned(source),
            attached: false,
            _context: context,
        }))
    }
}

//! Pointer location → display lookup.
//!
//! The tap reports the pointer in global display coordinates (origin at the
//! top-left of the main display), which is the space `CGGetDisplaysWithPoint`
//! expects.  Elsewhere there is no display information and
//! [`platform_locator`] returns a locator that never resolves.

use std::sync::Arc;

use crate::application::ports::DisplayLocator;

/// The best locator for the current platform.
pub fn platform_locator() -> Arc<dyn DisplayLocator> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(macos::CgDisplayLocator)
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(crate::application::ports::NoDisplays)
    }
}

#[cfg(target_os = "macos")]
pub mod macos {
    use core_graphics::geometry::CGPoint;
    use mediakeys_core::DisplayRef;
    use tracing::trace;

    use crate::application::ports::DisplayLocator;

    /// `kCGErrorSuccess`.
    const CG_SUCCESS: i32 = 0;

    #[link(name = "CoreGraphics", kind = "framework")]
    extern "C" {
        fn CGGetDisplaysWithPoint(
            point: CGPoint,
            max_displays: u32,
            displays: *mut u32,
            matching_display_count: *mut u32,
        ) -> i32;
    }

    /// Looks displays up through CoreGraphics.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct CgDisplayLocator;

    impl DisplayLocator for CgDisplayLocator {
        fn display_at(&self, x: f64, y: f64) -> Option<DisplayRef> {
            let mut display: u32 = 0;
            let mut count: u32 = 0;
            // SAFETY: both out-pointers reference live locals and
            // `max_displays` matches the single-slot buffer.
            let err =
                unsafe { CGGetDisplaysWithPoint(CGPoint::new(x, y), 1, &mut display, &mut count) };
            if err != CG_SUCCESS || count == 0 {
                trace!(x, y, err, "no display under pointer");
                return None;
            }
            Some(DisplayRef(display))
        }
    }
}

//! Platform Abstraction Layer
//!
//! Each supported chip implements the [`Platform`] trait and exposes its
//! register-level drivers; Cargo features pick the chip.
//!
//! # Usage
//!
//! ```no_run
//! use drivers::platform::{CurrentPlatform, Platform};
//!
//! let clocks = unsafe { CurrentPlatform::early_init() }.unwrap();
//! assert_eq!(clocks.sysclk, 180_000_000);
//! ```

/// Platform trait - implemented by each supported platform
pub trait Platform {
    /// Bus frequencies after bring-up.
    type Clocks: Copy + core::fmt::Debug;

    /// Bring-up failure.
    type Error: core::fmt::Debug;

    /// Platform name for debugging
    fn name() -> &'static str;

    /// Early platform initialization
    ///
    /// Called before any driver is created. Configures the clock tree.
    ///
    /// # Safety
    /// Must only be called once, very early in boot.
    unsafe fn early_init() -> Result<Self::Clocks, Self::Error>;
}

// Platform selection based on Cargo features
cfg_if::cfg_if! {
    if #[cfg(feature = "stm32f429")] {
        pub mod stm32f4;
        pub use stm32f4::Stm32f4Platform as CurrentPlatform;
    } else {
        compile_error!(
            "No platform selected!\n\
            Use: cargo build --features stm32f429"
        );
    }
}

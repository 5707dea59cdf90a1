//! STM32F429 reset and clock control.
//!
//! Brings the core from the 16 MHz HSI up to 180 MHz through the main PLL
//! and gates peripheral clocks.

use bitflags::bitflags;
use core::ptr::{read_volatile, write_volatile};

use super::{modify, set_bits};
use crate::hal::gpio::Port;

pub const RCC_BASE: usize = 0x4002_3800;
pub const PWR_BASE: usize = 0x4000_7000;
pub const FLASH_BASE: usize = 0x4002_3C00;

/// Internal RC oscillator frequency.
pub const HSI_HZ: u32 = 16_000_000;

/// Polls of a ready flag before bring-up gives up.
const READY_BUDGET: u32 = 1_000_000;

#[repr(C)]
struct Registers {
    cr: u32,
    pllcfgr: u32,
    cfgr: u32,
    cir: u32,
    ahb1rstr: u32,
    ahb2rstr: u32,
    ahb3rstr: u32,
    _r0: u32,
    apb1rstr: u32,
    apb2rstr: u32,
    _r1: [u32; 2],
    ahb1enr: u32,
    ahb2enr: u32,
    ahb3enr: u32,
    _r2: u32,
    apb1enr: u32,
    apb2enr: u32,
}

#[repr(C)]
struct PwrRegisters {
    cr: u32,
    csr: u32,
}

#[inline(always)]
fn regs() -> *mut Registers {
    RCC_BASE as *mut Registers
}

#[inline(always)]
fn pwr() -> *mut PwrRegisters {
    PWR_BASE as *mut PwrRegisters
}

#[inline(always)]
fn flash_acr() -> *mut u32 {
    FLASH_BASE as *mut u32
}

bitflags! {
    /// RCC_CR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control: u32 {
        const HSION  = 1 << 0;
        const HSIRDY = 1 << 1;
        const PLLON  = 1 << 24;
        const PLLRDY = 1 << 25;
    }

    /// RCC_APB1ENR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Apb1: u32 {
        const USART2 = 1 << 17;
        const USART3 = 1 << 18;
        const I2C1   = 1 << 21;
        const I2C2   = 1 << 22;
        const PWR    = 1 << 28;
    }

    /// RCC_APB2ENR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Apb2: u32 {
        const USART1 = 1 << 4;
        const SYSCFG = 1 << 14;
    }

    /// PWR_CR / PWR_CSR over-drive bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct OverDrive: u32 {
        const ON     = 1 << 16;
        const SWITCH = 1 << 17;
    }

    /// FLASH_ACR cache and prefetch enables.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct FlashAccel: u32 {
        const PRFTEN = 1 << 8;
        const ICEN   = 1 << 9;
        const DCEN   = 1 << 10;
    }
}

const PWR_CR_VOS_SCALE1: u32 = 0b11 << 14;
const CFGR_SW_PLL: u32 = 0b10;
const CFGR_SWS_SHIFT: u32 = 2;

/// Clock bring-up failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClockError {
    HsiNotReady,
    PllNotLocked,
    OverDriveNotReady,
    SwitchFailed,
}

/// Frequencies of the clock tree after bring-up.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Clocks {
    pub sysclk: u32,
    pub hclk: u32,
    pub pclk1: u32,
    pub pclk2: u32,
}

/// Main PLL and bus prescaler settings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClockConfig {
    pub pll_m: u32,
    pub pll_n: u32,
    pub pll_p: u32,
    pub pll_q: u32,
    pub ahb_div: u32,
    pub apb1_div: u32,
    pub apb2_div: u32,
    pub flash_latency: u32,
}

impl ClockConfig {
    /// HSI / 8 * 180 / 2 = 180 MHz; APB1 45 MHz, APB2 90 MHz.
    pub const MAX_180MHZ: ClockConfig = ClockConfig {
        pll_m: 8,
        pll_n: 180,
        pll_p: 2,
        pll_q: 4,
        ahb_div: 1,
        apb1_div: 4,
        apb2_div: 2,
        flash_latency: 5,
    };

    pub const fn clocks(&self) -> Clocks {
        let sysclk = HSI_HZ / self.pll_m * self.pll_n / self.pll_p;
        let hclk = sysclk / self.ahb_div;
        Clocks {
            sysclk,
            hclk,
            pclk1: hclk / self.apb1_div,
            pclk2: hclk / self.apb2_div,
        }
    }

    /// RCC_PLLCFGR value, HSI as PLL source.
    pub const fn pllcfgr(&self) -> u32 {
        self.pll_m | (self.pll_n << 6) | ((self.pll_p / 2 - 1) << 16) | (self.pll_q << 24)
    }

    /// RCC_CFGR prescaler fields, clock switch left on HSI.
    pub const fn cfgr_prescalers(&self) -> u32 {
        (ahb_code(self.ahb_div) << 4) | (apb_code(self.apb1_div) << 10) | (apb_code(self.apb2_div) << 13)
    }
}

const fn ahb_code(div: u32) -> u32 {
    match div {
        2 => 0b1000,
        4 => 0b1001,
        8 => 0b1010,
        16 => 0b1011,
        _ => 0,
    }
}

const fn apb_code(div: u32) -> u32 {
    match div {
        2 => 0b100,
        4 => 0b101,
        8 => 0b110,
        16 => 0b111,
        _ => 0,
    }
}

fn wait_for(mut ready: impl FnMut() -> bool, err: ClockError) -> Result<(), ClockError> {
    for _ in 0..READY_BUDGET {
        if ready() {
            return Ok(());
        }
        core::hint::spin_loop();
    }
    Err(err)
}

// ============================================================================
// Raw Hardware Functions
// ============================================================================

/// Run the bring-up sequence for `config`.
///
/// # Safety
///
/// Must run once, before any peripheral depending on bus clocks is set up.
pub unsafe fn init(config: &ClockConfig) -> Result<Clocks, ClockError> {
    unsafe {
        let rcc = regs();

        set_bits(&mut (*rcc).cr, Control::HSION.bits());
        wait_for(
            || read_volatile(&(*rcc).cr) & Control::HSIRDY.bits() != 0,
            ClockError::HsiNotReady,
        )?;

        set_bits(&mut (*rcc).apb1enr, Apb1::PWR.bits());
        set_bits(&mut (*pwr()).cr, PWR_CR_VOS_SCALE1);

        write_volatile(&mut (*rcc).pllcfgr, config.pllcfgr());
        set_bits(&mut (*rcc).cr, Control::PLLON.bits());
        wait_for(
            || read_volatile(&(*rcc).cr) & Control::PLLRDY.bits() != 0,
            ClockError::PllNotLocked,
        )?;

        // Above 168 MHz the regulator needs over-drive.
        set_bits(&mut (*pwr()).cr, OverDrive::ON.bits());
        wait_for(
            || read_volatile(&(*pwr()).csr) & OverDrive::ON.bits() != 0,
            ClockError::OverDriveNotReady,
        )?;
        set_bits(&mut (*pwr()).cr, OverDrive::SWITCH.bits());
        wait_for(
            || read_volatile(&(*pwr()).csr) & OverDrive::SWITCH.bits() != 0,
            ClockError::OverDriveNotReady,
        )?;

        let accel = FlashAccel::PRFTEN | FlashAccel::ICEN | FlashAccel::DCEN;
        write_volatile(flash_acr(), accel.bits() | config.flash_latency);

        write_volatile(&mut (*rcc).cfgr, config.cfgr_prescalers());
        modify(&mut (*rcc).cfgr, 0b11, CFGR_SW_PLL);
        wait_for(
            || (read_volatile(&(*rcc).cfgr) >> CFGR_SWS_SHIFT) & 0b11 == CFGR_SW_PLL,
            ClockError::SwitchFailed,
        )?;

        set_bits(&mut (*rcc).apb2enr, Apb2::SYSCFG.bits());
    }

    let clocks = config.clocks();
    log::debug!("clocks: {:?}", clocks);
    Ok(clocks)
}

/// Gate on the clock of a GPIO port.
pub fn enable_gpio(port: Port) {
    unsafe { set_bits(&mut (*regs()).ahb1enr, 1 << port.index()) }
}

pub fn enable_apb1(peripherals: Apb1) {
    unsafe { set_bits(&mut (*regs()).apb1enr, peripherals.bits()) }
}

pub fn enable_apb2(peripherals: Apb2) {
    unsafe { set_bits(&mut (*regs()).apb2enr, peripherals.bits()) }
}

/// Pulse the reset line of APB1 peripherals.
pub fn reset_apb1(peripherals: Apb1) {
    unsafe {
        let rstr = &mut (*regs()).apb1rstr;
        set_bits(rstr, peripherals.bits());
        modify(rstr, peripherals.bits(), 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tree_runs_at_180mhz() {
        assert_eq!(
            ClockConfig::MAX_180MHZ.clocks(),
            Clocks {
                sysclk: 180_000_000,
                hclk: 180_000_000,
                pclk1: 45_000_000,
                pclk2: 90_000_000,
            }
        );
    }

    #[test]
    fn pllcfgr_fields() {
        let value = ClockConfig::MAX_180MHZ.pllcfgr();
        assert_eq!(value & 0x3F, 8);
        assert_eq!((value >> 6) & 0x1FF, 180);
        assert_eq!((value >> 16) & 0b11, 0);
        assert_eq!((value >> 22) & 1, 0);
        assert_eq!((value >> 24) & 0xF, 4);
    }

    #[test]
    fn prescaler_fields() {
        let value = ClockConfig::MAX_180MHZ.cfgr_prescalers();
        assert_eq!((value >> 4) & 0xF, 0);
        assert_eq!((value >> 10) & 0b111, 0b101);
        assert_eq!((value >> 13) & 0b111, 0b100);
        assert_eq!(value & 0b11, 0);
    }

    #[test]
    fn bounded_wait_gives_up() {
        assert_eq!(wait_for(|| false, ClockError::PllNotLocked), Err(ClockError::PllNotLocked));

        let mut polls = 0;
        assert_eq!(
            wait_for(
                || {
                    polls += 1;
                    polls == 3
                },
                ClockError::PllNotLocked
            ),
            Ok(())
        );
    }
}

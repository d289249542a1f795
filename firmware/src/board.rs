//! CH32V203 board support
//!
//! 64KB Flash / 20KB RAM. Seven buttons on PB0..PB6, four LEDs on PA0..PA3,
//! internal temperature sensor and the heartbeat potentiometer (AN4, PA4)
//! on the ADC1 injected group.
//!
//! The input task starts one injected conversion per period and the
//! end-of-conversion interrupt mirrors both results into an [`AdcMirror`];
//! tasks only read the mirror. GPIO is read and written directly.

use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use hvac_core::{
    handle_setpoint_edge, AdcMirror, AdjustDirection, ButtonBank, HalError, HvacConfig,
    IndicatorOutput, IndicatorSet, InputSnapshot, SharedState,
};

/// CH32V203 pin assignment
pub mod pins {
    /// Setpoint up (EXTI0)
    pub const TEMP_PLUS: u8 = 0; // PB0
    /// Setpoint down (EXTI1)
    pub const TEMP_MINUS: u8 = 1; // PB1
    pub const FAN_ON: u8 = 2; // PB2
    pub const FAN_AUTO: u8 = 3; // PB3
    pub const SYSTEM_COOL: u8 = 4; // PB4
    pub const SYSTEM_OFF: u8 = 5; // PB5
    pub const SYSTEM_HEAT: u8 = 6; // PB6

    pub const FAN_LED: u8 = 0; // PA0
    pub const HEAT_LED: u8 = 1; // PA1
    pub const HEARTBEAT_LED: u8 = 2; // PA2
    pub const COOL_LED: u8 = 3; // PA3
    /// Heartbeat potentiometer, analog input
    pub const POT: u8 = 4; // PA4

    /// Mask of every button line on port B
    pub const BUTTON_MASK: u8 = 0x7f;
}

/// Register addresses used by the control loop
#[allow(dead_code)]
mod regs {
    pub const RCC_APB2PCENR: usize = 0x4002_1018;
    pub const AFIO_EXTICR1: usize = 0x4001_0008;
    pub const EXTI_INTENR: usize = 0x4001_0400;
    pub const EXTI_FTENR: usize = 0x4001_040C;
    pub const EXTI_INTFR: usize = 0x4001_0414;
    pub const GPIOA_CFGLR: usize = 0x4001_0800;
    pub const GPIOA_BSHR: usize = 0x4001_0810;
    pub const GPIOB_CFGLR: usize = 0x4001_0C00;
    pub const GPIOB_INDR: usize = 0x4001_0C08;
    pub const GPIOB_OUTDR: usize = 0x4001_0C0C;
    pub const ADC1_STATR: usize = 0x4001_2400;
    pub const ADC1_CTLR1: usize = 0x4001_2404;
    pub const ADC1_CTLR2: usize = 0x4001_2408;
    pub const ADC1_SAMPTR1: usize = 0x4001_240C;
    pub const ADC1_SAMPTR2: usize = 0x4001_2410;
    pub const ADC1_ISQR: usize = 0x4001_2438;
    pub const ADC1_IDATAR1: usize = 0x4001_243C;
    pub const ADC1_IDATAR2: usize = 0x4001_2440;
    pub const PFIC_IENR1: usize = 0xE000_E100;
    pub const PFIC_IENR2: usize = 0xE000_E104;

    // RCC_APB2PCENR
    pub const AFIOEN: u32 = 1 << 0;
    pub const IOPAEN: u32 = 1 << 2;
    pub const IOPBEN: u32 = 1 << 3;
    pub const ADC1EN: u32 = 1 << 9;

    /// Injected group end of conversion
    pub const STATR_JEOC: u32 = 1 << 2;
    pub const CTLR1_JEOCIE: u32 = 1 << 7;
    pub const CTLR1_SCAN: u32 = 1 << 8;
    pub const CTLR2_ADON: u32 = 1 << 0;
    /// JEXTSEL = JSWSTART
    pub const CTLR2_JEXTSEL_SW: u32 = 0b111 << 12;
    pub const CTLR2_JEXTTRIG: u32 = 1 << 15;
    pub const CTLR2_JSWSTART: u32 = 1 << 21;
    pub const CTLR2_TSVREFE: u32 = 1 << 23;

    /// Internal temperature sensor channel
    pub const TEMPERATURE_CHANNEL: u32 = 16;

    // Interrupt numbers
    pub const IRQ_EXTI0: usize = 22;
    pub const IRQ_EXTI1: usize = 23;
    pub const IRQ_ADC1_2: usize = 34;
}

/// Bring up clocks, GPIO, the setpoint interrupts and the ADC.
/// Tasks must not be spawned unless this succeeds.
pub fn init(config: &HvacConfig) -> Result<(), HalError> {
    config.validate()?;

    #[cfg(target_arch = "riscv32")]
    {
        // SAFETY: runs once before any task or interrupt touches these peripherals
        unsafe {
            use core::ptr::{read_volatile, write_volatile};

            let modify = |addr: usize, clear: u32, set: u32| {
                let reg = addr as *mut u32;
                write_volatile(reg, (read_volatile(reg) & !clear) | set);
            };

            modify(
                regs::RCC_APB2PCENR,
                0,
                regs::AFIOEN | regs::IOPAEN | regs::IOPBEN | regs::ADC1EN,
            );

            // PA0..PA3 push-pull 50MHz, PA4 analog
            modify(regs::GPIOA_CFGLR, 0x000F_FFFF, 0x0000_3333);
            // PB0..PB6 input with pull, direction from the idle levels
            modify(regs::GPIOB_CFGLR, 0x0FFF_FFFF, 0x0888_8888);
            modify(
                regs::GPIOB_OUTDR,
                pins::BUTTON_MASK as u32,
                crate::idle_levels(config.normal_state) as u32,
            );

            // EXTI0/EXTI1 on port B, falling edge
            modify(regs::AFIO_EXTICR1, 0xFF, 0x11);
            let adjust = (1 << pins::TEMP_PLUS) | (1 << pins::TEMP_MINUS);
            modify(regs::EXTI_FTENR, 0, adjust);
            modify(regs::EXTI_INTENR, 0, adjust);

            // Injected group: rank 1 temperature sensor, rank 2 potentiometer
            modify(regs::ADC1_SAMPTR1, 0b111 << 18, 0b111 << 18);
            modify(regs::ADC1_SAMPTR2, 0b111 << 12, 0b111 << 12);
            write_volatile(
                regs::ADC1_ISQR as *mut u32,
                (1 << 20) | (regs::TEMPERATURE_CHANNEL << 10) | ((pins::POT as u32) << 15),
            );
            modify(regs::ADC1_CTLR1, 0, regs::CTLR1_SCAN | regs::CTLR1_JEOCIE);
            modify(
                regs::ADC1_CTLR2,
                0,
                regs::CTLR2_ADON | regs::CTLR2_JEXTSEL_SW | regs::CTLR2_JEXTTRIG | regs::CTLR2_TSVREFE,
            );
            if read_volatile(regs::ADC1_CTLR2 as *const u32) & regs::CTLR2_ADON == 0 {
                return Err(HalError::NotInitialized);
            }

            write_volatile(
                regs::PFIC_IENR1 as *mut u32,
                (1 << regs::IRQ_EXTI0) | (1 << regs::IRQ_EXTI1),
            );
            write_volatile(regs::PFIC_IENR2 as *mut u32, 1 << (regs::IRQ_ADC1_2 - 32));
        }
    }

    #[cfg(feature = "defmt")]
    defmt::info!("🔌 CH32V203 board initialized");
    Ok(())
}

/// Start one injected conversion of both channels
pub fn start_conversion() {
    #[cfg(target_arch = "riscv32")]
    {
        let ctlr2 = regs::ADC1_CTLR2 as *mut u32;
        // SAFETY: JSWSTART is cleared by hardware once the group starts
        unsafe { core::ptr::write_volatile(ctlr2, core::ptr::read_volatile(ctlr2) | regs::CTLR2_JSWSTART) };
    }
}

/// Decode port levels into a snapshot
pub fn snapshot_from_levels(levels: u8) -> InputSnapshot {
    let bit = |pin: u8| levels & (1 << pin) != 0;
    InputSnapshot {
        temp_plus: bit(pins::TEMP_PLUS),
        temp_minus: bit(pins::TEMP_MINUS),
        fan_on: bit(pins::FAN_ON),
        fan_auto: bit(pins::FAN_AUTO),
        system_cool: bit(pins::SYSTEM_COOL),
        system_off: bit(pins::SYSTEM_OFF),
        system_heat: bit(pins::SYSTEM_HEAT),
    }
}

/// Button port (GPIOB)
pub struct ButtonPort {
    /// Levels seen by the last read, kept for diagnostics and host builds
    last_levels: AtomicU8,
}

impl ButtonPort {
    pub const fn new(idle_levels: u8) -> Self {
        Self {
            last_levels: AtomicU8::new(idle_levels),
        }
    }

    /// Read all seven lines at once
    pub fn read_levels(&self) -> u8 {
        #[cfg(target_arch = "riscv32")]
        {
            // SAFETY: INDR is a read-only input data register
            let idr = unsafe { core::ptr::read_volatile(regs::GPIOB_INDR as *const u32) };
            let levels = (idr as u8) & pins::BUTTON_MASK;
            self.last_levels.store(levels, Ordering::Relaxed);
            levels
        }
        #[cfg(not(target_arch = "riscv32"))]
        {
            self.last_levels.load(Ordering::Relaxed)
        }
    }
}

impl ButtonBank for &ButtonPort {
    fn read_snapshot(&mut self) -> Result<InputSnapshot, HalError> {
        Ok(snapshot_from_levels(self.read_levels()))
    }
}

/// EXTI0/EXTI1 handler body for the setpoint buttons.
/// Clears the pending flags, then applies at most one adjustment.
pub fn on_setpoint_interrupt(shared: &SharedState, port: &ButtonPort) -> Option<AdjustDirection> {
    #[cfg(target_arch = "riscv32")]
    {
        let pending = (1 << pins::TEMP_PLUS) | (1 << pins::TEMP_MINUS);
        // SAFETY: write-one-to-clear register, bits outside `pending` are unaffected
        unsafe { core::ptr::write_volatile(regs::EXTI_INTFR as *mut u32, pending) };
    }

    let snapshot = snapshot_from_levels(port.read_levels());
    handle_setpoint_edge(shared, &snapshot)
}

// Internal temperature sensor, datasheet typicals
const ADC_FULL_SCALE: f32 = 4095.0;
const VREF_MV: f32 = 3300.0;
const V25_MV: f32 = 1340.0;
const AVG_SLOPE_MV_PER_C: f32 = 4.3;

/// Convert a raw 12-bit internal sensor conversion to degrees Celsius
pub fn celsius_from_raw(raw: u16) -> f32 {
    let mv = raw as f32 * VREF_MV / ADC_FULL_SCALE;
    (V25_MV - mv) / AVG_SLOPE_MV_PER_C + 25.0
}

/// ADC1_2 interrupt body. Injected rank 1 is the temperature sensor,
/// rank 2 the potentiometer.
pub fn on_adc_interrupt(adc: &AdcMirror) {
    #[cfg(target_arch = "riscv32")]
    {
        // SAFETY: ADC1 status and injected data registers, owned by this handler
        unsafe {
            let status = core::ptr::read_volatile(regs::ADC1_STATR as *const u32);
            if status & regs::STATR_JEOC == 0 {
                return;
            }
            let temperature = core::ptr::read_volatile(regs::ADC1_IDATAR1 as *const u32);
            let pot = core::ptr::read_volatile(regs::ADC1_IDATAR2 as *const u32);
            core::ptr::write_volatile(regs::ADC1_STATR as *mut u32, status & !regs::STATR_JEOC);

            adc.on_temperature_conversion(celsius_from_raw((temperature & 0x0fff) as u16));
            adc.on_pot_conversion((pot & 0x0fff) as u16);
        }
    }
    #[cfg(not(target_arch = "riscv32"))]
    let _ = adc;
}

/// LED output pin on GPIOA
pub struct LedPin {
    pin: u8,
    state: AtomicBool,
}

impl LedPin {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            state: AtomicBool::new(false),
        }
    }
}

impl IndicatorOutput for LedPin {
    fn set_state(&mut self, state: bool) -> Result<(), HalError> {
        #[cfg(target_arch = "riscv32")]
        {
            // Low half sets, high half resets
            let bits = if state { 1u32 << self.pin } else { 1u32 << (self.pin + 16) };
            // SAFETY: BSHR writes are atomic per bit and touch only this pin
            unsafe { core::ptr::write_volatile(regs::GPIOA_BSHR as *mut u32, bits) };
        }
        self.state.store(state, Ordering::Relaxed);
        #[cfg(feature = "defmt")]
        defmt::trace!("LED PA{}: {}", self.pin, state);
        Ok(())
    }

    fn get_state(&self) -> Result<bool, HalError> {
        Ok(self.state.load(Ordering::Relaxed))
    }
}

/// Fan, heat and cool LEDs
pub type ControlLeds = IndicatorSet<LedPin, LedPin, LedPin>;

pub fn control_leds() -> ControlLeds {
    IndicatorSet::new(
        LedPin::new(pins::FAN_LED),
        LedPin::new(pins::HEAT_LED),
        LedPin::new(pins::COOL_LED),
    )
}

pub fn heartbeat_led() -> LedPin {
    LedPin::new(pins::HEARTBEAT_LED)
}

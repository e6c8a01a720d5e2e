//! TMC2130 stepper drivers (SPI mode)
//!
//! The unit carries three TMC2130s, one per axis, each on its own chip
//! select. All three are reprogrammed together whenever the driver
//! profile changes.
//!
//! # SPI Protocol
//!
//! Every transfer is a 40-bit datagram, MSB first:
//! - Address byte, bit 7 set for a write
//! - Data (4 bytes, big-endian)
//!
//! The reply to each datagram carries the SPI_STATUS byte followed by the
//! data requested by the *previous* datagram, so a register read takes two
//! transfers.
//!
//! # Profiles
//!
//! - Homing: spreadCycle with StallGuard routed to DIAG0
//! - Normal: spreadCycle at full current
//! - Stealth: StealthChop at reduced current

use embedded_hal::spi::SpiDevice;
use quintet_core::traits::{DriverError, DriverProfile, MotorDriver};

/// TMC2130 register addresses
pub mod reg {
    /// General configuration
    pub const GCONF: u8 = 0x00;
    /// Global status flags
    pub const GSTAT: u8 = 0x01;
    /// Hold/run current settings
    pub const IHOLD_IRUN: u8 = 0x10;
    /// Power down delay
    pub const TPOWERDOWN: u8 = 0x11;
    /// Upper velocity for StealthChop
    pub const TPWMTHRS: u8 = 0x13;
    /// Lower velocity for CoolStep/StallGuard
    pub const TCOOLTHRS: u8 = 0x14;
    /// Chopper configuration
    pub const CHOPCONF: u8 = 0x6C;
    /// CoolStep and StallGuard configuration
    pub const COOLCONF: u8 = 0x6D;
    /// Driver status
    pub const DRV_STATUS: u8 = 0x6F;
    /// StealthChop PWM configuration
    pub const PWMCONF: u8 = 0x70;
}

/// Address bit marking a write
const WRITE_FLAG: u8 = 0x80;

/// Datagrams sent per axis on (re)initialization
pub const INIT_DATAGRAMS: usize = 8;

/// The three axes, in chip-select order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Pulley = 0,
    Selector = 1,
    Idler = 2,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Pulley, Axis::Selector, Axis::Idler];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Run and hold current of one axis in milliamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisCurrents {
    pub run_ma: u16,
    pub hold_ma: u16,
}

impl AxisCurrents {
    pub const fn new(run_ma: u16, hold_ma: u16) -> Self {
        Self { run_ma, hold_ma }
    }
}

/// Driver configuration shared by the three axes
#[derive(Debug, Clone)]
pub struct Tmc2130Config {
    /// Microstepping (1, 2, 4, 8, 16, 32, 64, 128, 256)
    pub microsteps: u16,
    /// Currents in the homing profile, indexed by [`Axis`]
    pub homing: [AxisCurrents; 3],
    /// Currents in the normal profile
    pub normal: [AxisCurrents; 3],
    /// Currents in the stealth profile
    pub stealth: [AxisCurrents; 3],
    /// StallGuard threshold per axis (-64..=63, lower = more sensitive)
    pub stallguard_threshold: [i8; 3],
}

impl Default for Tmc2130Config {
    fn default() -> Self {
        Self {
            microsteps: 16,
            homing: [
                AxisCurrents::new(400, 20),
                AxisCurrents::new(560, 320),
                AxisCurrents::new(560, 240),
            ],
            normal: [
                AxisCurrents::new(600, 20),
                AxisCurrents::new(620, 320),
                AxisCurrents::new(620, 240),
            ],
            stealth: [
                AxisCurrents::new(280, 20),
                AxisCurrents::new(420, 200),
                AxisCurrents::new(480, 160),
            ],
            stallguard_threshold: [0, 3, 5],
        }
    }
}

impl Tmc2130Config {
    /// Convert microsteps to MRES register value
    pub fn mres(&self) -> u8 {
        match self.microsteps {
            256 => 0,
            128 => 1,
            64 => 2,
            32 => 3,
            16 => 4,
            8 => 5,
            4 => 6,
            2 => 7,
            1 => 8,
            _ => 4, // Default to 16 microsteps
        }
    }

    /// Convert current in mA to IRUN/IHOLD register value (0-31)
    /// Based on Rsense = 0.2 ohm with the high-sensitivity range (vsense = 1)
    pub fn current_to_cs(current_ma: u16) -> u8 {
        // CS = (I_rms * 32 * 1.41 * Rsense) / Vfs - 1
        // With Rsense = 0.2, Vfs = 0.18 (vsense = 1)
        // CS ≈ I_rms * 50.1 - 1
        // For milliamps: CS = (I_mA * 501 / 10000) - 1
        // For 600mA: CS ≈ 30 - 1 = 29
        let cs = (u32::from(current_ma) * 501 / 10000).saturating_sub(1);
        cs.min(31) as u8
    }

    fn currents(&self, profile: DriverProfile, axis: Axis) -> AxisCurrents {
        let table = match profile {
            DriverProfile::Homing => &self.homing,
            DriverProfile::Normal => &self.normal,
            DriverProfile::Stealth => &self.stealth,
        };
        table[axis.index()]
    }

    /// Build GCONF register value
    pub fn gconf(&self, profile: DriverProfile) -> u32 {
        match profile {
            // Bit 7: diag0_stall, Bit 12: diag0_int_pushpull
            DriverProfile::Homing => (1 << 7) | (1 << 12),
            DriverProfile::Normal => 0,
            // Bit 2: en_pwm_mode
            DriverProfile::Stealth => 1 << 2,
        }
    }

    /// Build CHOPCONF register value
    pub fn chopconf(&self) -> u32 {
        let mut chopconf = 0u32;

        // TOFF = 3 (off time, must be > 0 for driver to work)
        chopconf |= 3;
        // HSTRT = 5 (hysteresis start)
        chopconf |= 5 << 4;
        // HEND = 1 (hysteresis end)
        chopconf |= 1 << 7;
        // TBL = 2 (blanking time)
        chopconf |= 2 << 15;
        // vsense = 1 (high sensitivity, low sense resistor voltage)
        chopconf |= 1 << 17;
        // MRES = microstep resolution
        chopconf |= u32::from(self.mres()) << 24;
        // intpol = 1 (interpolate to 256 microsteps)
        chopconf |= 1 << 28;

        chopconf
    }

    /// Build IHOLD_IRUN register value
    pub fn ihold_irun(&self, profile: DriverProfile, axis: Axis) -> u32 {
        let currents = self.currents(profile, axis);
        let ihold = u32::from(Self::current_to_cs(currents.hold_ma));
        let irun = u32::from(Self::current_to_cs(currents.run_ma));
        let iholddelay = 6u32;

        ((iholddelay & 0x0F) << 16) | ((irun & 0x1F) << 8) | (ihold & 0x1F)
    }

    /// Build COOLCONF register value (StallGuard threshold only)
    pub fn coolconf(&self, axis: Axis) -> u32 {
        let sgt = self.stallguard_threshold[axis.index()].clamp(-64, 63);
        // SGT is a 7-bit two's complement field at bit 16
        (u32::from(sgt as u8) & 0x7F) << 16
    }

    /// Build PWMCONF register value for StealthChop
    pub fn pwmconf(&self) -> u32 {
        let mut pwmconf = 0u32;

        // PWM_AMPL = 200
        pwmconf |= 200;
        // PWM_GRAD = 1
        pwmconf |= 1 << 8;
        // pwm_freq = 2 (fPWM = 2/683 fCLK)
        pwmconf |= 2 << 16;
        // pwm_autoscale = 1
        pwmconf |= 1 << 18;

        pwmconf
    }

    /// StallGuard stays active at every velocity while homing
    pub fn tcoolthrs(&self, profile: DriverProfile) -> u32 {
        match profile {
            DriverProfile::Homing => 0x000F_FFFF,
            DriverProfile::Normal | DriverProfile::Stealth => 0,
        }
    }

    /// Get register write datagrams for one axis
    pub fn init_datagrams(&self, profile: DriverProfile, axis: Axis) -> [[u8; 5]; INIT_DATAGRAMS] {
        [
            // Clear reset and error flags (write 1 to clear)
            build_write_datagram(reg::GSTAT, 0x7),
            build_write_datagram(reg::CHOPCONF, self.chopconf()),
            build_write_datagram(reg::IHOLD_IRUN, self.ihold_irun(profile, axis)),
            build_write_datagram(reg::TPOWERDOWN, 20),
            build_write_datagram(reg::TCOOLTHRS, self.tcoolthrs(profile)),
            build_write_datagram(reg::COOLCONF, self.coolconf(axis)),
            build_write_datagram(reg::PWMCONF, self.pwmconf()),
            // GCONF last so the chopper mode switches with the rest in place
            build_write_datagram(reg::GCONF, self.gconf(profile)),
        ]
    }
}

/// Build a write datagram
pub fn build_write_datagram(reg: u8, data: u32) -> [u8; 5] {
    let [b0, b1, b2, b3] = data.to_be_bytes();
    [reg | WRITE_FLAG, b0, b1, b2, b3]
}

/// Build a read request datagram
pub fn build_read_request(reg: u8) -> [u8; 5] {
    [reg & !WRITE_FLAG, 0, 0, 0, 0]
}

/// SPI_STATUS byte returned with every datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiStatus(pub u8);

impl SpiStatus {
    /// GSTAT.reset is set (driver was reset since last cleared)
    pub fn reset_flag(self) -> bool {
        self.0 & 0x01 != 0
    }

    /// GSTAT.drv_err is set (overtemperature or short)
    pub fn driver_error(self) -> bool {
        self.0 & 0x02 != 0
    }

    /// DRV_STATUS.stallGuard
    pub fn stalled(self) -> bool {
        self.0 & 0x04 != 0
    }

    /// DRV_STATUS.standstill
    pub fn standstill(self) -> bool {
        self.0 & 0x08 != 0
    }
}

/// Split a reply into status and data
pub fn parse_response(response: &[u8; 5]) -> (SpiStatus, u32) {
    let [status, b0, b1, b2, b3] = *response;
    (SpiStatus(status), u32::from_be_bytes([b0, b1, b2, b3]))
}

/// TMC2130 communication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tmc2130Error {
    /// SPI transfer failed
    Spi(Axis),
    /// GCONF read back differs from what was written
    Readback(Axis),
    /// Driver reports overtemperature or a short
    DriverFault(Axis),
}

impl From<Tmc2130Error> for DriverError {
    fn from(err: Tmc2130Error) -> Self {
        match err {
            Tmc2130Error::Spi(_) => DriverError::Communication,
            Tmc2130Error::Readback(_) | Tmc2130Error::DriverFault(_) => DriverError::InvalidConfig,
        }
    }
}

/// The three axis drivers, one SPI device each
pub struct Tmc2130Bank<S> {
    devices: [S; 3],
    config: Tmc2130Config,
    profile: Option<DriverProfile>,
}

impl<S: SpiDevice> Tmc2130Bank<S> {
    /// Devices in [`Axis`] order: pulley, selector, idler
    pub fn new(devices: [S; 3], config: Tmc2130Config) -> Self {
        Self {
            devices,
            config,
            profile: None,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Tmc2130Config {
        &self.config
    }

    /// Profile applied by the last successful init
    pub fn profile(&self) -> Option<DriverProfile> {
        self.profile
    }

    fn transfer(&mut self, axis: Axis, datagram: [u8; 5]) -> Result<(SpiStatus, u32), Tmc2130Error> {
        let mut buffer = datagram;
        self.devices[axis.index()]
            .transfer_in_place(&mut buffer)
            .map_err(|_| Tmc2130Error::Spi(axis))?;
        Ok(parse_response(&buffer))
    }

    /// Read a register (two transfers)
    pub fn read_register(&mut self, axis: Axis, reg: u8) -> Result<u32, Tmc2130Error> {
        self.transfer(axis, build_read_request(reg))?;
        let (_, data) = self.transfer(axis, build_read_request(reg))?;
        Ok(data)
    }

    /// Program one axis and verify GCONF
    pub fn configure_axis(&mut self, axis: Axis, profile: DriverProfile) -> Result<(), Tmc2130Error> {
        let datagrams = self.config.init_datagrams(profile, axis);
        for datagram in datagrams {
            self.transfer(axis, datagram)?;
        }

        let expected = self.config.gconf(profile);
        let gconf = self.read_register(axis, reg::GCONF)?;
        if gconf != expected {
            return Err(Tmc2130Error::Readback(axis));
        }

        let (status, _) = self.transfer(axis, build_read_request(reg::DRV_STATUS))?;
        if status.driver_error() {
            return Err(Tmc2130Error::DriverFault(axis));
        }
        Ok(())
    }
}

impl<S: SpiDevice> MotorDriver for Tmc2130Bank<S> {
    fn init(&mut self, profile: DriverProfile) -> Result<(), DriverError> {
        for axis in Axis::ALL {
            if let Err(err) = self.configure_axis(axis, profile) {
                #[cfg(feature = "defmt")]
                defmt::error!("TMC2130 init failed: {:?}", err);
                self.profile = None;
                return Err(err.into());
            }
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("TMC2130 profile {:?} applied", profile);
        self.profile = Some(profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::spi::{ErrorType, Operation};

    /// Register file answering with the TMC2130's one-datagram lag
    struct MockTmc {
        regs: [u32; 0x80],
        pending: u32,
        status: u8,
        writes: Vec<(u8, u32)>,
        /// Bits forced to zero on readback
        stuck_low: u32,
    }

    impl Default for MockTmc {
        fn default() -> Self {
            Self {
                regs: [0; 0x80],
                pending: 0,
                status: 0,
                writes: Vec::new(),
                stuck_low: 0,
            }
        }
    }

    impl ErrorType for MockTmc {
        type Error = Infallible;
    }

    impl SpiDevice for MockTmc {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
            for op in operations.iter_mut() {
                if let Operation::TransferInPlace(buf) = op {
                    let address = buf[0];
                    let data = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
                    let reply = self.pending;
                    let reg = usize::from(address & !WRITE_FLAG);
                    if address & WRITE_FLAG != 0 {
                        self.regs[reg] = data;
                        self.writes.push((address & !WRITE_FLAG, data));
                    } else {
                        self.pending = self.regs[reg] & !self.stuck_low;
                    }
                    buf[0] = self.status;
                    buf[1..5].copy_from_slice(&reply.to_be_bytes());
                }
            }
            Ok(())
        }
    }

    fn bank() -> Tmc2130Bank<MockTmc> {
        Tmc2130Bank::new(Default::default(), Tmc2130Config::default())
    }

    #[test]
    fn test_mres_conversion() {
        let mut config = Tmc2130Config::default();

        config.microsteps = 256;
        assert_eq!(config.mres(), 0);

        config.microsteps = 16;
        assert_eq!(config.mres(), 4);

        config.microsteps = 3;
        assert_eq!(config.mres(), 4);
    }

    #[test]
    fn test_current_conversion() {
        assert_eq!(Tmc2130Config::current_to_cs(600), 29);
        assert_eq!(Tmc2130Config::current_to_cs(2000), 31);
        assert_eq!(Tmc2130Config::current_to_cs(0), 0);
        assert!(Tmc2130Config::current_to_cs(280) < Tmc2130Config::current_to_cs(600));
    }

    #[test]
    fn test_datagram_layout() {
        assert_eq!(
            build_write_datagram(reg::GCONF, 0x0000_1080),
            [0x80, 0x00, 0x00, 0x10, 0x80]
        );
        assert_eq!(build_read_request(reg::DRV_STATUS), [0x6F, 0, 0, 0, 0]);
        let (status, data) = parse_response(&[0x0A, 0x12, 0x34, 0x56, 0x78]);
        assert_eq!(data, 0x1234_5678);
        assert!(status.driver_error());
        assert!(status.standstill());
        assert!(!status.stalled());
    }

    #[test]
    fn test_profiles_select_chopper_mode() {
        let config = Tmc2130Config::default();
        assert_eq!(config.gconf(DriverProfile::Stealth) & (1 << 2), 1 << 2);
        assert_eq!(config.gconf(DriverProfile::Normal) & (1 << 2), 0);
        assert_ne!(config.gconf(DriverProfile::Homing) & (1 << 7), 0);
        assert_eq!(config.tcoolthrs(DriverProfile::Normal), 0);
        assert_ne!(config.tcoolthrs(DriverProfile::Homing), 0);
    }

    #[test]
    fn test_stealth_lowers_run_current() {
        let config = Tmc2130Config::default();
        for axis in Axis::ALL {
            let normal = (config.ihold_irun(DriverProfile::Normal, axis) >> 8) & 0x1F;
            let stealth = (config.ihold_irun(DriverProfile::Stealth, axis) >> 8) & 0x1F;
            assert!(stealth < normal);
        }
    }

    #[test]
    fn test_negative_stallguard_threshold() {
        let mut config = Tmc2130Config::default();
        config.stallguard_threshold[1] = -1;
        assert_eq!(config.coolconf(Axis::Selector), 0x7F << 16);
    }

    #[test]
    fn test_init_programs_every_axis() {
        let mut bank = bank();
        bank.init(DriverProfile::Stealth).unwrap();
        assert_eq!(bank.profile(), Some(DriverProfile::Stealth));

        for (index, device) in bank.devices.iter().enumerate() {
            let axis = Axis::ALL[index];
            assert_eq!(device.writes.len(), INIT_DATAGRAMS);
            assert_eq!(device.writes.last(), Some(&(reg::GCONF, 1 << 2)));
            assert_eq!(
                device.regs[usize::from(reg::IHOLD_IRUN)],
                bank.config.ihold_irun(DriverProfile::Stealth, axis)
            );
        }
    }

    #[test]
    fn test_readback_mismatch() {
        let mut bank = bank();
        bank.devices[2].stuck_low = 1 << 7;
        assert_eq!(
            bank.configure_axis(Axis::Idler, DriverProfile::Homing),
            Err(Tmc2130Error::Readback(Axis::Idler))
        );
        assert_eq!(bank.init(DriverProfile::Homing), Err(DriverError::InvalidConfig));
        assert_eq!(bank.profile(), None);
    }

    #[test]
    fn test_driver_fault_reported() {
        let mut bank = bank();
        bank.devices[0].status = 0x02;
        assert_eq!(
            bank.configure_axis(Axis::Pulley, DriverProfile::Normal),
            Err(Tmc2130Error::DriverFault(Axis::Pulley))
        );
    }
}

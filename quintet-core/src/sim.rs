//! Simulated board for host tests
//!
//! Models a tip position per slot along the filament path. The selector
//! sensor reads present when the strand of the slot under the selector
//! has reached `sensor_at`. Time only advances through the delay
//! collaborator.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use quintet_hal::{
    FlashError, InputPin, SerialPort, SettingsStorage, StorageKey, UartConfig, UartRx, UartTx,
};

use crate::board::{Board, Platform};
use crate::config::{EXTRUDERS, PARK_POSITION};
use crate::led::LedPattern;
use crate::traits::{
    Button, Buttons, DriverError, DriverProfile, Indicator, Motion, MotionError, MotorDriver,
    PulleyDirection, PulleySpeed, ReceiveInterrupt, SystemControl,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IrqEvent {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndicatorEntry {
    pub at_ms: u64,
    pub pattern: u16,
    pub irq_enabled: bool,
}

struct World {
    now_ns: u64,
    sensor_at: i32,
    tips: [i32; EXTRUDERS],
    max_tips: [i32; EXTRUDERS],
    stuck: [bool; EXTRUDERS],
    sensor_override: Option<bool>,
    present_until_ms: Option<u64>,
    selector: u8,
    idler_slot: u8,
    idler_engaged: bool,
    motion_error: Option<MotionError>,
    homing_fails: bool,
    driver_error: Option<DriverError>,
    pulley_moves: usize,
    cuts: usize,
    homes: Vec<u64>,
    clicks: VecDeque<(u64, Button)>,
    indicator: Vec<IndicatorEntry>,
    irq_enabled: bool,
    irq_log: Vec<IrqEvent>,
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    driver_inits: Vec<DriverProfile>,
    serial_inits: usize,
    resets: usize,
    menus: usize,
    settings: Option<Vec<u8>>,
    events: Vec<&'static str>,
}

impl World {
    fn new() -> Self {
        Self {
            now_ns: 0,
            sensor_at: 30,
            tips: [0; EXTRUDERS],
            max_tips: [0; EXTRUDERS],
            stuck: [false; EXTRUDERS],
            sensor_override: None,
            present_until_ms: None,
            selector: 0,
            idler_slot: 0,
            idler_engaged: false,
            motion_error: None,
            homing_fails: false,
            driver_error: None,
            pulley_moves: 0,
            cuts: 0,
            homes: Vec::new(),
            clicks: VecDeque::new(),
            indicator: Vec::new(),
            irq_enabled: false,
            irq_log: Vec::new(),
            rx: VecDeque::new(),
            tx: Vec::new(),
            driver_inits: Vec::new(),
            serial_inits: 0,
            resets: 0,
            menus: 0,
            settings: None,
            events: Vec::new(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.now_ns / 1_000_000
    }

    fn filament_present(&self) -> bool {
        if let Some(level) = self.sensor_override {
            return level;
        }
        if let Some(until) = self.present_until_ms {
            return self.now_ms() < until;
        }
        let slot = usize::from(self.selector);
        slot < EXTRUDERS && self.tips[slot] >= self.sensor_at
    }

    fn motion_check(&self) -> Result<(), MotionError> {
        match self.motion_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

type Shared = Rc<RefCell<World>>;

/// Handle to the simulated world; every collaborator shares it
#[derive(Clone)]
pub(crate) struct Sim {
    world: Shared,
}

pub(crate) struct SimIndicator(Shared);
pub(crate) struct SimButtons(Shared);
pub(crate) struct SimSensor(Shared);
pub(crate) struct SimMotion(Shared);
pub(crate) struct SimDriver(Shared);
pub(crate) struct SimSerial(Shared);
pub(crate) struct SimIrq(Shared);
pub(crate) struct SimDelay(Shared);
pub(crate) struct SimStorage(Shared);
pub(crate) struct SimSystem(Shared);

pub(crate) struct SimPlatform;

impl Platform for SimPlatform {
    type Indicator = SimIndicator;
    type Buttons = SimButtons;
    type Sensor = SimSensor;
    type Motion = SimMotion;
    type Driver = SimDriver;
    type Serial = SimSerial;
    type RxIrq = SimIrq;
    type Delay = SimDelay;
    type Storage = SimStorage;
    type System = SimSystem;
}

impl Sim {
    pub fn new() -> Self {
        Self {
            world: Rc::new(RefCell::new(World::new())),
        }
    }

    pub fn board(&self) -> Board<SimPlatform> {
        let w = &self.world;
        Board {
            indicator: SimIndicator(w.clone()),
            buttons: SimButtons(w.clone()),
            sensor: SimSensor(w.clone()),
            motion: SimMotion(w.clone()),
            driver: SimDriver(w.clone()),
            serial: SimSerial(w.clone()),
            rx_irq: SimIrq(w.clone()),
            delay: SimDelay(w.clone()),
            storage: SimStorage(w.clone()),
            system: SimSystem(w.clone()),
        }
    }

    // Scenario setup

    pub fn set_stuck(&self, slot: usize, stuck: bool) {
        self.world.borrow_mut().stuck[slot] = stuck;
    }

    pub fn set_sensor_override(&self, level: Option<bool>) {
        self.world.borrow_mut().sensor_override = level;
    }

    pub fn set_present_until(&self, ms: Option<u64>) {
        self.world.borrow_mut().present_until_ms = ms;
    }

    pub fn set_motion_error(&self, err: Option<MotionError>) {
        self.world.borrow_mut().motion_error = err;
    }

    pub fn set_homing_fails(&self, fails: bool) {
        self.world.borrow_mut().homing_fails = fails;
    }

    pub fn set_driver_error(&self, err: Option<DriverError>) {
        self.world.borrow_mut().driver_error = err;
    }

    pub fn set_settings(&self, bytes: &[u8]) {
        self.world.borrow_mut().settings = Some(bytes.to_vec());
    }

    /// Button held from `at_ms`, seen by exactly one sample
    pub fn schedule_click(&self, at_ms: u64, button: Button) {
        self.world.borrow_mut().clicks.push_back((at_ms, button));
    }

    pub fn push_rx(&self, bytes: &[u8]) {
        self.world.borrow_mut().rx.extend(bytes.iter().copied());
    }

    pub fn clear_logs(&self) {
        let mut w = self.world.borrow_mut();
        w.indicator.clear();
        w.irq_log.clear();
        w.events.clear();
    }

    // Observation

    pub fn now_ms(&self) -> u64 {
        self.world.borrow().now_ms()
    }

    pub fn sensor_at(&self) -> i32 {
        self.world.borrow().sensor_at
    }

    pub fn tip(&self, slot: usize) -> i32 {
        self.world.borrow().tips[slot]
    }

    pub fn max_tip(&self, slot: usize) -> i32 {
        self.world.borrow().max_tips[slot]
    }

    pub fn filament_present(&self) -> bool {
        self.world.borrow().filament_present()
    }

    pub fn selector(&self) -> u8 {
        self.world.borrow().selector
    }

    pub fn idler_engaged(&self) -> bool {
        self.world.borrow().idler_engaged
    }

    pub fn pulley_moves(&self) -> usize {
        self.world.borrow().pulley_moves
    }

    pub fn cuts(&self) -> usize {
        self.world.borrow().cuts
    }

    pub fn homes(&self) -> Vec<u64> {
        self.world.borrow().homes.clone()
    }

    pub fn rx_pending(&self) -> usize {
        self.world.borrow().rx.len()
    }

    /// Everything transmitted since the last call
    pub fn take_tx(&self) -> String {
        let bytes = std::mem::take(&mut self.world.borrow_mut().tx);
        String::from_utf8(bytes).expect("tx is ASCII")
    }

    pub fn indicator_log(&self) -> Vec<IndicatorEntry> {
        self.world.borrow().indicator.clone()
    }

    pub fn irq_log(&self) -> Vec<IrqEvent> {
        self.world.borrow().irq_log.clone()
    }

    pub fn irq_enabled(&self) -> bool {
        self.world.borrow().irq_enabled
    }

    pub fn driver_inits(&self) -> Vec<DriverProfile> {
        self.world.borrow().driver_inits.clone()
    }

    pub fn serial_inits(&self) -> usize {
        self.world.borrow().serial_inits
    }

    pub fn resets(&self) -> usize {
        self.world.borrow().resets
    }

    pub fn menus(&self) -> usize {
        self.world.borrow().menus
    }

    /// Bring-up and homing calls in order
    pub fn events(&self) -> Vec<&'static str> {
        self.world.borrow().events.clone()
    }
}

impl Indicator for SimIndicator {
    fn init(&mut self) {
        self.0.borrow_mut().events.push("indicator");
    }

    fn set(&mut self, pattern: LedPattern) {
        let mut w = self.0.borrow_mut();
        let entry = IndicatorEntry {
            at_ms: w.now_ms(),
            pattern: pattern.bits(),
            irq_enabled: w.irq_enabled,
        };
        w.indicator.push(entry);
    }
}

impl Buttons for SimButtons {
    fn init(&mut self) {
        self.0.borrow_mut().events.push("buttons");
    }

    fn clicked(&mut self) -> Option<Button> {
        let mut w = self.0.borrow_mut();
        let now = w.now_ms();
        let due = matches!(w.clicks.front(), Some(&(at, _)) if at <= now);
        if due {
            w.clicks.pop_front().map(|(_, button)| button)
        } else {
            None
        }
    }
}

impl InputPin for SimSensor {
    fn is_high(&mut self) -> bool {
        self.0.borrow().filament_present()
    }
}

impl Motion for SimMotion {
    fn init_bus(&mut self) -> Result<(), MotionError> {
        let mut w = self.0.borrow_mut();
        w.motion_check()?;
        w.events.push("motion_bus");
        Ok(())
    }

    fn init_axes(&mut self) -> Result<(), MotionError> {
        let mut w = self.0.borrow_mut();
        w.motion_check()?;
        w.events.push("axes");
        Ok(())
    }

    fn home(&mut self) -> Result<(), MotionError> {
        let mut w = self.0.borrow_mut();
        w.motion_check()?;
        if w.homing_fails {
            return Err(MotionError::HomingFailed);
        }
        w.events.push("home");
        let now = w.now_ms();
        w.homes.push(now);
        w.selector = 0;
        w.idler_slot = 0;
        w.idler_engaged = false;
        Ok(())
    }

    fn select(&mut self, slot: u8) -> Result<(), MotionError> {
        let mut w = self.0.borrow_mut();
        w.motion_check()?;
        assert!(slot <= PARK_POSITION, "slot {} out of range", slot);
        w.selector = slot;
        w.idler_slot = slot;
        Ok(())
    }

    fn park_selector(&mut self) -> Result<(), MotionError> {
        let mut w = self.0.borrow_mut();
        w.motion_check()?;
        w.selector = PARK_POSITION;
        Ok(())
    }

    fn set_idler(&mut self, engaged: bool) -> Result<(), MotionError> {
        let mut w = self.0.borrow_mut();
        w.motion_check()?;
        w.idler_engaged = engaged;
        Ok(())
    }

    fn pulley(
        &mut self,
        direction: PulleyDirection,
        mm: u16,
        _speed: PulleySpeed,
    ) -> Result<(), MotionError> {
        let mut guard = self.0.borrow_mut();
        let w = &mut *guard;
        w.motion_check()?;
        w.pulley_moves += 1;
        let slot = usize::from(w.idler_slot);
        if !w.idler_engaged || slot >= EXTRUDERS || w.stuck[slot] {
            return Ok(());
        }
        let delta = i32::from(mm);
        w.tips[slot] += match direction {
            PulleyDirection::Feed => delta,
            PulleyDirection::Retract => -delta,
        };
        w.max_tips[slot] = w.max_tips[slot].max(w.tips[slot]);
        Ok(())
    }

    fn cut(&mut self) -> Result<(), MotionError> {
        let mut guard = self.0.borrow_mut();
        let w = &mut *guard;
        w.motion_check()?;
        w.cuts += 1;
        let slot = usize::from(w.selector);
        if slot < EXTRUDERS && w.tips[slot] > w.sensor_at {
            w.tips[slot] = w.sensor_at;
        }
        Ok(())
    }
}

impl MotorDriver for SimDriver {
    fn init(&mut self, profile: DriverProfile) -> Result<(), DriverError> {
        let mut w = self.0.borrow_mut();
        if let Some(err) = w.driver_error {
            return Err(err);
        }
        w.driver_inits.push(profile);
        w.events.push("driver");
        Ok(())
    }
}

impl UartTx for SimSerial {
    type Error = core::convert::Infallible;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0.borrow_mut().tx.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl UartRx for SimSerial {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.0.borrow_mut().rx.pop_front()
    }
}

impl SerialPort for SimSerial {
    fn init(&mut self, _config: &UartConfig) {
        let mut w = self.0.borrow_mut();
        w.serial_inits += 1;
        w.events.push("serial");
    }
}

impl ReceiveInterrupt for SimIrq {
    fn enable(&mut self) {
        let mut w = self.0.borrow_mut();
        w.irq_enabled = true;
        w.irq_log.push(IrqEvent::Enable);
    }

    fn disable(&mut self) {
        let mut w = self.0.borrow_mut();
        w.irq_enabled = false;
        w.irq_log.push(IrqEvent::Disable);
    }

    fn is_enabled(&self) -> bool {
        self.0.borrow().irq_enabled
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().now_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().now_ns += u64::from(ms) * 1_000_000;
    }
}

impl SettingsStorage for SimStorage {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let w = self.0.borrow();
        if key != StorageKey::Settings {
            return Err(FlashError::NotFound);
        }
        let data = w.settings.as_ref().ok_or(FlashError::NotFound)?;
        let dest = buffer
            .get_mut(..data.len())
            .ok_or(FlashError::BufferTooSmall)?;
        dest.copy_from_slice(data);
        Ok(data.len())
    }
}

impl SystemControl for SimSystem {
    fn reset(&mut self) {
        self.0.borrow_mut().resets += 1;
    }

    fn enter_setup_menu(&mut self) {
        self.0.borrow_mut().menus += 1;
    }
}

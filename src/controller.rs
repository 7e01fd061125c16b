//! BLE HID controller
//!
//! Owns the compiled descriptor and the live input state of every profile,
//! and pushes encoded reports to the transport.
//!
//! ```text
//! application --> BleController --> encode --> HidTransport --> host
//!                      ^                            |
//!                      +---- ConnectionStatus <-----+
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{ControllerConfig, GamepadConfig};
use crate::connection::ConnectionStatus;
use crate::descriptor::{self, ReportDescriptor};
use crate::error::{ControllerError, Result};
use crate::hid::keymap::{self, modifier};
use crate::hid::{Axis, KeyboardModifiers, Profile, SimulationControl, SpecialButton};
use crate::pairing::{PairingSession, PairingState};
use crate::report::{self, GamepadState, KeyboardReport, MouseReport};
use crate::transport::{ChannelHandle, HidTransport, PeerAddress, ReportDirection};

/// Channels registered by `start`
#[derive(Debug, Clone, Copy, Default)]
struct Channels {
    gamepad: Option<ChannelHandle>,
    keyboard: Option<ChannelHandle>,
    mouse: Option<ChannelHandle>,
    output: Option<ChannelHandle>,
}

impl Channels {
    fn input(&self, profile: Profile) -> Option<ChannelHandle> {
        match profile {
            Profile::Gamepad => self.gamepad,
            Profile::Keyboard => self.keyboard,
            Profile::Mouse => self.mouse,
        }
    }
}

#[derive(Debug)]
struct LiveState {
    gamepad: GamepadState,
    keyboard: KeyboardReport,
    mouse: MouseReport,
}

/// Gamepad, keyboard and mouse over one BLE HID session
pub struct BleController {
    config: Arc<ControllerConfig>,
    descriptor: ReportDescriptor,
    transport: Arc<dyn HidTransport>,
    status: Arc<ConnectionStatus>,
    pairing: PairingSession,
    state: Mutex<LiveState>,
    channels: OnceLock<Channels>,
    started: AtomicBool,
}

impl BleController {
    /// Validate the configuration and compile its descriptor
    ///
    /// Configuration errors surface here, before the transport is touched.
    /// Out-of-range key and button counts are clamped first.
    pub fn new(
        mut config: ControllerConfig,
        transport: Arc<dyn HidTransport>,
        status: Arc<ConnectionStatus>,
    ) -> Result<Self> {
        config.normalize();
        let descriptor = descriptor::compile(&config)?;
        let state = LiveState {
            gamepad: GamepadState::new(),
            keyboard: KeyboardReport::with_slots(config.keyboard.key_count as usize),
            mouse: MouseReport::default(),
        };

        Ok(Self {
            config: Arc::new(config),
            descriptor,
            pairing: PairingSession::new(transport.clone(), status.clone()),
            transport,
            status,
            state: Mutex::new(state),
            channels: OnceLock::new(),
            started: AtomicBool::new(false),
        })
    }

    /// Publish the descriptor and register the report channels
    pub async fn start(&self) -> Result<()> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ControllerError::AlreadyStarted);
        }

        match self.register().await {
            Ok(channels) => {
                // Only this call gets past the `started` guard
                let _ = self.channels.set(channels);
                Ok(())
            }
            Err(e) => {
                self.started.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    async fn register(&self) -> Result<Channels> {
        self.transport
            .publish_descriptor(self.descriptor.as_bytes())
            .await?;

        let mut channels = Channels::default();
        for profile in self.config.profiles.iter() {
            let report_id = self.config.report_id(profile);
            let channel = self
                .transport
                .register_report_channel(report_id, ReportDirection::Input)
                .await?;
            match profile {
                Profile::Gamepad => channels.gamepad = Some(channel),
                Profile::Keyboard => channels.keyboard = Some(channel),
                Profile::Mouse => channels.mouse = Some(channel),
            }
            debug!(%profile, report_id, channel = channel.0, "Input report channel registered");
        }

        let gamepad = &self.config.gamepad;
        if self.config.profiles.gamepad && gamepad.output_report {
            let channel = self
                .transport
                .register_report_channel(gamepad.report_id, ReportDirection::Output)
                .await?;
            channels.output = Some(channel);
            self.status
                .set_output_capacity(gamepad.output_report_length as usize);
        }

        let peers = self.transport.list_connected_peers().await;
        self.status.sync_peers(&peers);

        info!(
            transport = self.transport.name(),
            descriptor_len = self.descriptor.len(),
            gamepad_report_len = self.gamepad_report_size(),
            "BLE controller started"
        );
        Ok(channels)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &ReportDescriptor {
        &self.descriptor
    }

    pub fn gamepad_report_size(&self) -> usize {
        report::gamepad_report_size(&self.config.gamepad)
    }

    pub fn is_started(&self) -> bool {
        self.channels.get().is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    pub fn connection(&self) -> &Arc<ConnectionStatus> {
        &self.status
    }

    /// Transmit a payload on a profile's channel
    ///
    /// Not started, profile disabled and no peer are all silent skips. Transmit
    /// failures are logged and dropped so one bad report never ends a session.
    async fn send(&self, profile: Profile, payload: &[u8]) {
        let Some(channel) = self.channels.get().and_then(|c| c.input(profile)) else {
            trace!(%profile, "Report skipped, no channel");
            return;
        };
        if !self.status.is_connected() {
            trace!(%profile, "Report skipped, no peer connected");
            return;
        }
        if let Err(e) = self.transport.transmit(channel, payload).await {
            warn!(%profile, len = payload.len(), "Failed to transmit report: {}", e);
        }
    }

    // ========================================================================
    // Gamepad
    // ========================================================================

    /// Apply a change to the gamepad state; auto-report if it changed anything
    async fn update_gamepad<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut GamepadState, &GamepadConfig) -> Result<bool> + Send,
    {
        let (changed, report) = {
            let mut state = self.state.lock();
            let changed = f(&mut state.gamepad, &self.config.gamepad)?;
            let report = (changed && self.config.auto_report)
                .then(|| state.gamepad.encode(&self.config.gamepad));
            (changed, report)
        };
        if let Some(report) = report {
            self.send(Profile::Gamepad, &report).await;
        }
        Ok(changed)
    }

    /// Press an ordinary button (1-based)
    pub async fn press(&self, button: u8) -> Result<()> {
        self.update_gamepad(|state, config| state.press(config, button).map(|_| true))
            .await
            .map(|_| ())
    }

    /// Release an ordinary button (1-based)
    pub async fn release(&self, button: u8) -> Result<()> {
        self.update_gamepad(|state, config| state.release(config, button).map(|_| true))
            .await
            .map(|_| ())
    }

    pub fn is_pressed(&self, button: u8) -> bool {
        self.state.lock().gamepad.is_pressed(&self.config.gamepad, button)
    }

    /// Clear all ordinary buttons without sending a report
    pub fn reset_buttons(&self) {
        self.state.lock().gamepad.reset_buttons();
    }

    /// Press a special button; returns false if it is not enabled
    pub async fn press_special(&self, button: SpecialButton) -> Result<bool> {
        self.set_special(button, true).await
    }

    /// Release a special button; returns false if it is not enabled
    pub async fn release_special(&self, button: SpecialButton) -> Result<bool> {
        self.set_special(button, false).await
    }

    async fn set_special(&self, button: SpecialButton, pressed: bool) -> Result<bool> {
        let enabled = self
            .update_gamepad(|state, config| state.set_special(config, button, pressed))
            .await?;
        if !enabled {
            debug!(?button, "Special button not enabled, ignored");
        }
        Ok(enabled)
    }

    pub async fn press_start(&self) -> Result<bool> {
        self.press_special(SpecialButton::Start).await
    }

    pub async fn release_start(&self) -> Result<bool> {
        self.release_special(SpecialButton::Start).await
    }

    pub async fn press_select(&self) -> Result<bool> {
        self.press_special(SpecialButton::Select).await
    }

    pub async fn release_select(&self) -> Result<bool> {
        self.release_special(SpecialButton::Select).await
    }

    pub async fn press_menu(&self) -> Result<bool> {
        self.press_special(SpecialButton::Menu).await
    }

    pub async fn release_menu(&self) -> Result<bool> {
        self.release_special(SpecialButton::Menu).await
    }

    pub async fn press_home(&self) -> Result<bool> {
        self.press_special(SpecialButton::Home).await
    }

    pub async fn release_home(&self) -> Result<bool> {
        self.release_special(SpecialButton::Home).await
    }

    pub async fn press_back(&self) -> Result<bool> {
        self.press_special(SpecialButton::Back).await
    }

    pub async fn release_back(&self) -> Result<bool> {
        self.release_special(SpecialButton::Back).await
    }

    pub async fn press_volume_inc(&self) -> Result<bool> {
        self.press_special(SpecialButton::VolumeInc).await
    }

    pub async fn release_volume_inc(&self) -> Result<bool> {
        self.release_special(SpecialButton::VolumeInc).await
    }

    pub async fn press_volume_dec(&self) -> Result<bool> {
        self.press_special(SpecialButton::VolumeDec).await
    }

    pub async fn release_volume_dec(&self) -> Result<bool> {
        self.release_special(SpecialButton::VolumeDec).await
    }

    pub async fn press_volume_mute(&self) -> Result<bool> {
        self.press_special(SpecialButton::VolumeMute).await
    }

    pub async fn release_volume_mute(&self) -> Result<bool> {
        self.release_special(SpecialButton::VolumeMute).await
    }

    /// Set all eight axes, arguments in logical order
    #[allow(clippy::too_many_arguments)]
    pub async fn set_axes(
        &self,
        x: i16,
        y: i16,
        z: i16,
        rx: i16,
        ry: i16,
        rz: i16,
        slider1: i16,
        slider2: i16,
    ) -> Result<()> {
        self.set_axis_values(&[
            (Axis::X, x),
            (Axis::Y, y),
            (Axis::Z, z),
            (Axis::Rx, rx),
            (Axis::Ry, ry),
            (Axis::Rz, rz),
            (Axis::Slider1, slider1),
            (Axis::Slider2, slider2),
        ])
        .await
    }

    /// Set all eight axes, arguments in report order (Z, Rz before Rx, Ry)
    #[allow(clippy::too_many_arguments)]
    pub async fn set_hid_axes(
        &self,
        x: i16,
        y: i16,
        z: i16,
        rz: i16,
        rx: i16,
        ry: i16,
        slider1: i16,
        slider2: i16,
    ) -> Result<()> {
        self.set_axes(x, y, z, rx, ry, rz, slider1, slider2).await
    }

    async fn set_axis_values(&self, values: &[(Axis, i16)]) -> Result<()> {
        self.update_gamepad(|state, _| {
            for (axis, value) in values {
                state.set_axis(*axis, *value);
            }
            Ok(true)
        })
        .await
        .map(|_| ())
    }

    pub async fn set_axis(&self, axis: Axis, value: i16) -> Result<()> {
        self.set_axis_values(&[(axis, value)]).await
    }

    pub async fn set_x(&self, value: i16) -> Result<()> {
        self.set_axis(Axis::X, value).await
    }

    pub async fn set_y(&self, value: i16) -> Result<()> {
        self.set_axis(Axis::Y, value).await
    }

    pub async fn set_z(&self, value: i16) -> Result<()> {
        self.set_axis(Axis::Z, value).await
    }

    pub async fn set_rx(&self, value: i16) -> Result<()> {
        self.set_axis(Axis::Rx, value).await
    }

    pub async fn set_ry(&self, value: i16) -> Result<()> {
        self.set_axis(Axis::Ry, value).await
    }

    pub async fn set_rz(&self, value: i16) -> Result<()> {
        self.set_axis(Axis::Rz, value).await
    }

    pub async fn set_slider1(&self, value: i16) -> Result<()> {
        self.set_axis(Axis::Slider1, value).await
    }

    pub async fn set_slider2(&self, value: i16) -> Result<()> {
        self.set_axis(Axis::Slider2, value).await
    }

    pub async fn set_sliders(&self, slider1: i16, slider2: i16) -> Result<()> {
        self.set_axis_values(&[(Axis::Slider1, slider1), (Axis::Slider2, slider2)])
            .await
    }

    pub async fn set_left_thumb(&self, x: i16, y: i16) -> Result<()> {
        self.set_axis_values(&[(Axis::X, x), (Axis::Y, y)]).await
    }

    pub async fn set_right_thumb(&self, z: i16, rz: i16) -> Result<()> {
        self.set_axis_values(&[(Axis::Z, z), (Axis::Rz, rz)]).await
    }

    /// Right thumb on Z and Rx, the mapping Android expects
    pub async fn set_right_thumb_android(&self, z: i16, rx: i16) -> Result<()> {
        self.set_axis_values(&[(Axis::Z, z), (Axis::Rx, rx)]).await
    }

    pub async fn set_left_trigger(&self, rx: i16) -> Result<()> {
        self.set_axis(Axis::Rx, rx).await
    }

    pub async fn set_right_trigger(&self, ry: i16) -> Result<()> {
        self.set_axis(Axis::Ry, ry).await
    }

    pub async fn set_triggers(&self, rx: i16, ry: i16) -> Result<()> {
        self.set_axis_values(&[(Axis::Rx, rx), (Axis::Ry, ry)]).await
    }

    /// Set hat `index` (0-based) to a direction from [`crate::hid::hat`]
    pub async fn set_hat(&self, index: usize, value: i8) -> Result<()> {
        if index >= self.config.gamepad.hat_switch_count as usize {
            return Err(ControllerError::Config(format!(
                "hat {} not configured ({} hats)",
                index, self.config.gamepad.hat_switch_count
            )));
        }
        self.update_gamepad(|state, _| {
            state.set_hat(index, value);
            Ok(true)
        })
        .await
        .map(|_| ())
    }

    pub async fn set_hats(&self, values: [i8; 4]) -> Result<()> {
        self.update_gamepad(|state, _| {
            for (index, value) in values.into_iter().enumerate() {
                state.set_hat(index, value);
            }
            Ok(true)
        })
        .await
        .map(|_| ())
    }

    pub async fn set_simulation(&self, control: SimulationControl, value: i16) -> Result<()> {
        self.update_gamepad(|state, _| {
            state.set_simulation(control, value);
            Ok(true)
        })
        .await
        .map(|_| ())
    }

    pub async fn set_rudder(&self, value: i16) -> Result<()> {
        self.set_simulation(SimulationControl::Rudder, value).await
    }

    pub async fn set_throttle(&self, value: i16) -> Result<()> {
        self.set_simulation(SimulationControl::Throttle, value).await
    }

    pub async fn set_accelerator(&self, value: i16) -> Result<()> {
        self.set_simulation(SimulationControl::Accelerator, value)
            .await
    }

    pub async fn set_brake(&self, value: i16) -> Result<()> {
        self.set_simulation(SimulationControl::Brake, value).await
    }

    pub async fn set_steering(&self, value: i16) -> Result<()> {
        self.set_simulation(SimulationControl::Steering, value).await
    }

    /// Set rudder, throttle, accelerator, brake and steering at once
    pub async fn set_simulation_controls(&self, values: [i16; 5]) -> Result<()> {
        self.update_gamepad(|state, _| {
            for (control, value) in SimulationControl::ALL.into_iter().zip(values) {
                state.set_simulation(control, value);
            }
            Ok(true)
        })
        .await
        .map(|_| ())
    }

    pub async fn set_gyroscope(&self, values: [i16; 3]) -> Result<()> {
        self.update_gamepad(|state, _| {
            state.set_gyroscope(values);
            Ok(true)
        })
        .await
        .map(|_| ())
    }

    pub async fn set_accelerometer(&self, values: [i16; 3]) -> Result<()> {
        self.update_gamepad(|state, _| {
            state.set_accelerometer(values);
            Ok(true)
        })
        .await
        .map(|_| ())
    }

    pub async fn set_motion_controls(&self, gyroscope: [i16; 3], accelerometer: [i16; 3]) -> Result<()> {
        self.update_gamepad(|state, _| {
            state.set_gyroscope(gyroscope);
            state.set_accelerometer(accelerometer);
            Ok(true)
        })
        .await
        .map(|_| ())
    }

    /// Encode the current gamepad state
    pub fn gamepad_report(&self) -> Vec<u8> {
        self.state.lock().gamepad.encode(&self.config.gamepad)
    }

    /// Send the gamepad report now
    pub async fn send_report(&self) {
        let report = self.gamepad_report();
        self.send(Profile::Gamepad, &report).await;
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    async fn update_keyboard<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut KeyboardReport) -> bool + Send,
    {
        let (changed, report) = {
            let mut state = self.state.lock();
            let changed = f(&mut state.keyboard);
            let report = (changed && self.config.auto_report).then(|| state.keyboard.to_bytes());
            (changed, report)
        };
        if let Some(report) = report {
            self.send(Profile::Keyboard, &report).await;
        }
        changed
    }

    /// Press a key; modifier usages (0xE0-0xE7) set the modifier bit
    ///
    /// Returns false if the key was already down or no slot was free.
    pub async fn keyboard_press(&self, key: u8) -> bool {
        let changed = self
            .update_keyboard(|report| match keymap::modifier_bit(key) {
                Some(bit) => {
                    let before = report.modifiers;
                    report.modifiers |= bit;
                    report.modifiers != before
                }
                None => report.add_key(key),
            })
            .await;
        if !changed {
            trace!(key, "Key press ignored");
        }
        changed
    }

    /// Release a key; returns false if it was not down
    pub async fn keyboard_release(&self, key: u8) -> bool {
        self.update_keyboard(|report| match keymap::modifier_bit(key) {
            Some(bit) => {
                let before = report.modifiers;
                report.modifiers &= !bit;
                report.modifiers != before
            }
            None => report.remove_key(key),
        })
        .await
    }

    pub async fn keyboard_release_all(&self) {
        self.update_keyboard(|report| {
            report.clear();
            true
        })
        .await;
    }

    pub async fn set_keyboard_modifiers(&self, modifiers: KeyboardModifiers) {
        self.update_keyboard(|report| {
            report.modifiers = modifiers.to_hid_byte();
            true
        })
        .await;
    }

    /// Current keyboard payload
    pub fn keyboard_report(&self) -> [u8; report::KEYBOARD_REPORT_LEN] {
        self.state.lock().keyboard.to_bytes()
    }

    pub async fn send_keyboard_report(&self) {
        let report = self.keyboard_report();
        self.send(Profile::Keyboard, &report).await;
    }

    /// Tap a key: one press report, one release report
    pub async fn keyboard_write(&self, key: u8) {
        self.tap_key(key, 0).await;
    }

    async fn tap_key(&self, key: u8, modifiers: u8) {
        let (down, up) = {
            let mut state = self.state.lock();
            let keyboard = &mut state.keyboard;
            let held = keyboard.modifiers;
            keyboard.modifiers |= modifiers;
            let added = keyboard.add_key(key);
            let down = keyboard.to_bytes();
            if added {
                keyboard.remove_key(key);
            }
            keyboard.modifiers = held;
            (down, keyboard.to_bytes())
        };

        self.send(Profile::Keyboard, &down).await;
        self.key_delay().await;
        self.send(Profile::Keyboard, &up).await;
    }

    async fn key_delay(&self) {
        let delay = self.config.keyboard.key_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    /// Type ASCII text on a US layout
    ///
    /// Returns the number of characters typed; unmapped characters are skipped.
    pub async fn keyboard_print(&self, text: &str) -> usize {
        let mut typed = 0;
        for c in text.chars() {
            let key = keymap::ascii_to_hid(c);
            if key == 0 {
                debug!(?c, "No key for character, skipped");
                continue;
            }
            let modifiers = if keymap::needs_shift(c) {
                modifier::LEFT_SHIFT
            } else {
                0
            };
            self.tap_key(key, modifiers).await;
            self.key_delay().await;
            typed += 1;
        }
        typed
    }

    // ========================================================================
    // Mouse
    // ========================================================================

    async fn update_mouse(&self, buttons: impl FnOnce(u8) -> u8 + Send) {
        let report = {
            let mut state = self.state.lock();
            let mouse = &mut state.mouse;
            let before = mouse.buttons;
            mouse.buttons = buttons(before);
            (mouse.buttons != before && self.config.auto_report).then(|| mouse.to_bytes())
        };
        if let Some(report) = report {
            self.send(Profile::Mouse, &report).await;
        }
    }

    pub async fn mouse_press(&self, buttons: u8) {
        self.update_mouse(|held| held | buttons).await;
    }

    pub async fn mouse_release(&self, buttons: u8) {
        self.update_mouse(|held| held & !buttons).await;
    }

    pub async fn mouse_release_all(&self) {
        self.update_mouse(|_| 0).await;
    }

    pub fn mouse_buttons(&self) -> u8 {
        self.state.lock().mouse.buttons
    }

    /// Send one relative movement; the deltas are not retained
    pub async fn mouse_move(&self, dx: i8, dy: i8) {
        self.mouse_motion(dx, dy, 0).await;
    }

    /// Send one wheel step; the delta is not retained
    pub async fn mouse_scroll(&self, delta: i8) {
        self.mouse_motion(0, 0, delta).await;
    }

    async fn mouse_motion(&self, x: i8, y: i8, wheel: i8) {
        let buttons = self.state.lock().mouse.buttons;
        let report = MouseReport::new(buttons, x, y, wheel).to_bytes();
        self.send(Profile::Mouse, &report).await;
    }

    /// Press and release buttons
    pub async fn mouse_click(&self, buttons: u8) {
        let held = self.state.lock().mouse.buttons;
        self.send(Profile::Mouse, &MouseReport::new(held | buttons, 0, 0, 0).to_bytes())
            .await;
        self.send(Profile::Mouse, &MouseReport::new(held, 0, 0, 0).to_bytes())
            .await;
    }

    pub async fn send_mouse_report(&self) {
        let report = self.state.lock().mouse.to_bytes();
        self.send(Profile::Mouse, &report).await;
    }

    // ========================================================================
    // Raw reports
    // ========================================================================

    /// Send a caller-built gamepad payload verbatim
    pub async fn raw_gamepad_action(&self, payload: &[u8]) {
        self.send(Profile::Gamepad, payload).await;
    }

    /// Send a caller-built keyboard payload verbatim
    pub async fn raw_keyboard_action(&self, payload: &[u8]) {
        self.send(Profile::Keyboard, payload).await;
    }

    /// Send a caller-built mouse payload verbatim
    pub async fn raw_mouse_action(&self, payload: &[u8]) {
        self.send(Profile::Mouse, payload).await;
    }

    // ========================================================================
    // Output reports and pairing
    // ========================================================================

    /// Whether the host wrote an output report since the last call
    pub fn is_output_received(&self) -> bool {
        self.status.is_output_received()
    }

    /// Copy of the last output report
    pub fn output_buffer(&self) -> Vec<u8> {
        self.status.output_buffer()
    }

    /// Drop the current peer and wait for a different one to connect
    pub async fn enter_pairing_mode(
        &self,
        cancel: CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<PeerAddress> {
        if !self.is_started() {
            return Err(ControllerError::NotStarted);
        }
        self.pairing.enter_pairing_mode(cancel, timeout).await
    }

    pub fn pairing_state(&self) -> PairingState {
        self.pairing.state()
    }
}

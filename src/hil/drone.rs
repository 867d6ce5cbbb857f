use std::path::Path;

use log::{debug, info};
use mavlink::common::{
    HilActuatorControlsFlags, MavCmd, MavMessage, MavModeFlag, MavResult, COMMAND_ACK_DATA,
    COMMAND_LONG_DATA, HIL_ACTUATOR_CONTROLS_DATA,
};
use mavlink::Message;
use nalgebra::{Vector1, Vector2, Vector4};

use crate::config::{ConfigError, DroneConfig};
use crate::dynamics::state::{self, DerivVec, StateVec};
use crate::dynamics::MixedEom;
use crate::hil::clock::Clock;
use crate::hil::encoder::StateEncoder;
use crate::hil::environment::EnvironmentProvider;
use crate::hil::relay::{MessageQueue, MessageRelay};
use crate::sim::{rk4_step, GroundContact};

// ---------------------------------------------------------------------------
// HIL loop controller
// ---------------------------------------------------------------------------

/// Ticks the publish gate stays open before the first autopilot
/// acknowledgment; covers the autopilot's own boot and EKF alignment.
const LOCKSTEP_BOOTSTRAP_WINDOW: u32 = 300;

/// SYSTEM_TIME goes out on one published tick in this many.
const SYSTEM_TIME_THROTTLE: u32 = 1000;

/// The simulated vehicle: equations of motion, ground contact, sensor
/// encoder and the lockstep loop tying them to the autopilot link.
///
/// `update` drives one tick: drain inbound frames, advance the dynamics,
/// clamp at the runway, publish telemetry gated on lockstep.
pub struct Drone<R, C, E> {
    relay: R,
    clock: C,
    environment: E,
    queue: MessageQueue,
    eom: MixedEom,
    ground: GroundContact,
    encoder: StateEncoder,
    state: StateVec,
    dx: DerivVec,
    armed: bool,
    should_reply_lockstep: bool,
    hil_actuator_controls_msg_n: u32,
    sys_time_throttle_counter: u32,
    last_autopilot_telemetry_us: u64,
    /// Emission period of HIL_STATE_QUATERNION (us); settable over the wire
    /// through SET_MESSAGE_INTERVAL. Zero publishes on every gated tick.
    hil_state_quaternion_period_us: u64,
}

impl<R, C, E> Drone<R, C, E>
where
    R: MessageRelay,
    C: Clock,
    E: EnvironmentProvider,
{
    pub fn from_config_file(
        path: &Path,
        relay: R,
        clock: C,
        environment: E,
    ) -> Result<Self, ConfigError> {
        Self::new(DroneConfig::from_file(path)?, relay, clock, environment)
    }

    pub fn new(
        config: DroneConfig,
        mut relay: R,
        clock: C,
        environment: E,
    ) -> Result<Self, ConfigError> {
        let queue = MessageQueue::new();
        relay.add_message_handler(queue.handle());

        Ok(Self {
            relay,
            clock,
            environment,
            queue,
            eom: MixedEom::new(&config)?,
            ground: GroundContact::default(),
            encoder: StateEncoder::default(),
            state: state::seeded(),
            dx: DerivVec::zeros(),
            armed: false,
            should_reply_lockstep: false,
            hil_actuator_controls_msg_n: 0,
            sys_time_throttle_counter: 0,
            last_autopilot_telemetry_us: 0,
            hil_state_quaternion_period_us: 0,
        })
    }

    /// One simulation tick of `dt_us` microseconds.
    pub fn update(&mut self, dt_us: u64) {
        let dt = dt_us as f64 / 1e6;

        self.process_inbound();
        self.advance_dynamics(dt);
        self.ground
            .apply(dt, &mut self.eom, &mut self.state, &mut self.dx);
        self.publish_state();
    }

    pub fn state(&self) -> &StateVec {
        &self.state
    }

    pub fn derivative(&self) -> &DerivVec {
        &self.dx
    }

    pub fn armed(&self) -> bool {
        self.armed
    }

    pub fn airborne(&self) -> bool {
        self.eom.airborne()
    }

    pub fn connection_open(&self) -> bool {
        self.relay.connection_open()
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    fn process_inbound(&mut self) {
        while let Some(msg) = self.queue.try_pop() {
            self.dispatch(msg);
        }
    }

    fn dispatch(&mut self, msg: MavMessage) {
        match msg {
            MavMessage::HEARTBEAT(_) => debug!("MSG: HEARTBEAT"),
            MavMessage::HIL_ACTUATOR_CONTROLS(ref controls) => {
                debug!("MSG: HIL_ACTUATOR_CONTROLS");
                self.process_hil_actuator_controls(controls);
            }
            MavMessage::COMMAND_LONG(ref command) => {
                debug!("MSG: COMMAND_LONG");
                self.process_command_long(command);
            }
            other => debug!("unhandled message id {}", other.message_id()),
        }
    }

    /// Route the 16-channel control vector onto the three actuator banks:
    /// channels 0..3 lift rotors, 4..5 flaperons, 8 forward thrust.
    fn process_hil_actuator_controls(&mut self, controls: &HIL_ACTUATOR_CONTROLS_DATA) {
        self.should_reply_lockstep = true;
        self.hil_actuator_controls_msg_n += 1;
        self.armed = controls
            .mode
            .contains(MavModeFlag::MAV_MODE_FLAG_SAFETY_ARMED);

        let ch = &controls.controls;
        let bank = self.eom.actuators_mut();
        bank.vtol_propellers.set_control(Vector4::new(
            ch[0] as f64,
            ch[1] as f64,
            ch[2] as f64,
            ch[3] as f64,
        ));
        bank.ailerons
            .set_control(Vector2::new(ch[4] as f64, ch[5] as f64));
        bank.thrust_propellers
            .set_control(Vector1::new(ch[8] as f64));
    }

    fn process_command_long(&mut self, command: &COMMAND_LONG_DATA) {
        match command.command {
            MavCmd::MAV_CMD_SET_MESSAGE_INTERVAL => {
                info!(
                    "autopilot telemetry interval set to {} us",
                    command.param2
                );
                self.hil_state_quaternion_period_us = command.param2 as u64;
            }
            other => debug!("unknown COMMAND_LONG id {:?}", other),
        }

        // Every command is acknowledged as accepted, known or not.
        if self.relay.connection_open() {
            self.relay.enqueue_message(MavMessage::COMMAND_ACK(COMMAND_ACK_DATA {
                command: command.command,
                result: MavResult::MAV_RESULT_ACCEPTED,
                progress: 0,
                result_param2: 0,
                target_system: command.target_system,
                target_component: command.target_component,
            }));
        }
    }

    // -----------------------------------------------------------------------
    // Dynamics
    // -----------------------------------------------------------------------

    fn advance_dynamics(&mut self, dt: f64) {
        let t0 = self.clock.current_time_us() as f64 / 1e6;
        let eom = &mut self.eom;
        eom.actuators_mut().advance(dt);
        self.dx = rk4_step(&mut |t, x| eom.evaluate(t, x), t0, dt, &mut self.state);
        state::wrap_angles(&mut self.state);
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    fn publish_state(&mut self) {
        if !self.relay.connection_open() {
            return;
        }

        let bootstrap = self.hil_actuator_controls_msg_n < LOCKSTEP_BOOTSTRAP_WINDOW;
        if !(self.should_reply_lockstep || bootstrap) {
            // the autopilot has not consumed the previous tick yet
            return;
        }
        if !self.should_reply_lockstep {
            // an unacknowledged publish consumes one slot of the window
            self.hil_actuator_controls_msg_n += 1;
        }

        self.clock.unlock_time();
        let t_us = self.clock.current_time_us();

        if self.sys_time_throttle_counter % SYSTEM_TIME_THROTTLE == 0 {
            let msg = self.encoder.system_time(t_us);
            self.relay.enqueue_message(msg);
        }
        self.sys_time_throttle_counter += 1;

        let gps = self.encoder.hil_gps(t_us, &self.state, &self.dx);
        self.relay.enqueue_message(gps);
        let sensor = self.encoder.hil_sensor(
            t_us,
            &self.state,
            &self.dx,
            self.environment.temperature(),
        );
        self.relay.enqueue_message(sensor);
        self.should_reply_lockstep = false;

        if t_us - self.last_autopilot_telemetry_us > self.hil_state_quaternion_period_us {
            self.last_autopilot_telemetry_us = t_us;
            let quat = self.encoder.hil_state_quaternion(
                t_us,
                &self.state,
                &self.dx,
                &self.environment.environment_wind(),
            );
            self.relay.enqueue_message(quat);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::hil::environment::ConstantEnvironment;
    use crate::hil::relay::InboundHandle;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT_US: u64 = 10_000;

    /// Relay recording every outbound frame; open/closed is switchable.
    #[derive(Clone, Default)]
    struct RecordingRelay {
        sent: Rc<RefCell<Vec<MavMessage>>>,
        closed: Rc<RefCell<bool>>,
        handlers: Rc<RefCell<Vec<InboundHandle>>>,
    }

    impl RecordingRelay {
        fn sent(&self) -> Vec<MavMessage> {
            self.sent.borrow().clone()
        }

        fn clear(&self) {
            self.sent.borrow_mut().clear();
        }

        fn close(&self) {
            *self.closed.borrow_mut() = true;
        }

        fn inject(&self, msg: MavMessage) {
            for h in self.handlers.borrow().iter() {
                h.push(msg.clone());
            }
        }
    }

    impl MessageRelay for RecordingRelay {
        fn add_message_handler(&mut self, handler: InboundHandle) {
            self.handlers.borrow_mut().push(handler);
        }

        fn enqueue_message(&mut self, msg: MavMessage) {
            self.sent.borrow_mut().push(msg);
        }

        fn connection_open(&self) -> bool {
            !*self.closed.borrow()
        }
    }

    /// Manually advanced clock; `unlock_time` is counted.
    #[derive(Clone, Default)]
    struct ManualClock {
        time_us: Rc<RefCell<u64>>,
        unlocks: Rc<RefCell<u32>>,
    }

    impl ManualClock {
        fn advance(&self, dt_us: u64) {
            *self.time_us.borrow_mut() += dt_us;
        }

        fn unlocks(&self) -> u32 {
            *self.unlocks.borrow()
        }
    }

    impl Clock for ManualClock {
        fn current_time_us(&self) -> u64 {
            *self.time_us.borrow()
        }

        fn unlock_time(&self) {
            *self.unlocks.borrow_mut() += 1;
        }
    }

    struct Rig {
        drone: Drone<RecordingRelay, ManualClock, ConstantEnvironment>,
        relay: RecordingRelay,
        clock: ManualClock,
    }

    fn rig() -> Rig {
        let relay = RecordingRelay::default();
        let clock = ManualClock::default();
        let drone = Drone::new(
            test_config(),
            relay.clone(),
            clock.clone(),
            ConstantEnvironment::default(),
        )
        .unwrap();
        Rig {
            drone,
            relay,
            clock,
        }
    }

    impl Rig {
        fn tick(&mut self) {
            self.clock.advance(DT_US);
            self.drone.update(DT_US);
        }
    }

    fn actuator_controls(controls: [f32; 16], armed: bool) -> MavMessage {
        MavMessage::HIL_ACTUATOR_CONTROLS(HIL_ACTUATOR_CONTROLS_DATA {
            time_usec: 0,
            flags: HilActuatorControlsFlags::empty(),
            controls,
            mode: if armed {
                MavModeFlag::MAV_MODE_FLAG_SAFETY_ARMED
            } else {
                MavModeFlag::empty()
            },
        })
    }

    fn count<F: Fn(&MavMessage) -> bool>(msgs: &[MavMessage], pred: F) -> usize {
        msgs.iter().filter(|m| pred(m)).count()
    }

    fn is_gps(m: &MavMessage) -> bool {
        matches!(m, MavMessage::HIL_GPS(_))
    }

    fn is_sensor(m: &MavMessage) -> bool {
        matches!(m, MavMessage::HIL_SENSOR(_))
    }

    #[test]
    fn every_tick_emits_gps_and_sensor_during_bootstrap() {
        let mut r = rig();
        r.tick();
        let sent = r.relay.sent();
        assert_eq!(count(&sent, is_gps), 1);
        assert_eq!(count(&sent, is_sensor), 1);
        assert_eq!(
            count(&sent, |m| matches!(m, MavMessage::SYSTEM_TIME(_))),
            1,
            "first published tick carries SYSTEM_TIME"
        );
        assert_eq!(r.clock.unlocks(), 1);
    }

    #[test]
    fn outbound_order_is_gps_then_sensor_then_quaternion() {
        let mut r = rig();
        r.tick();
        let sent = r.relay.sent();
        let gps = sent.iter().position(is_gps).unwrap();
        let sensor = sent.iter().position(is_sensor).unwrap();
        let quat = sent
            .iter()
            .position(|m| matches!(m, MavMessage::HIL_STATE_QUATERNION(_)))
            .unwrap();
        assert!(gps < sensor && sensor < quat);
    }

    #[test]
    fn lockstep_bootstrap_window_closes_after_300_ticks() {
        let mut r = rig();
        for _ in 0..300 {
            r.tick();
        }
        assert_eq!(count(&r.relay.sent(), is_gps), 300);

        r.relay.clear();
        r.tick(); // tick 301: gate closed
        assert!(r.relay.sent().is_empty());
        assert_eq!(r.clock.unlocks(), 300);
    }

    #[test]
    fn actuator_message_reopens_the_gate_for_one_tick() {
        let mut r = rig();
        for _ in 0..301 {
            r.tick();
        }
        r.relay.clear();

        r.relay.inject(actuator_controls([0.0; 16], false));
        r.tick();
        assert_eq!(count(&r.relay.sent(), is_gps), 1);

        r.relay.clear();
        r.tick(); // no new acknowledgment: closed again
        assert!(r.relay.sent().is_empty());
    }

    #[test]
    fn closed_relay_never_enqueues() {
        let mut r = rig();
        r.relay.close();
        for _ in 0..10 {
            r.tick();
        }
        assert!(r.relay.sent().is_empty());
        assert_eq!(r.clock.unlocks(), 0, "lockstep must not unlock while closed");
    }

    #[test]
    fn closed_relay_keeps_dynamics_running() {
        let mut r = rig();
        r.relay.close();
        let before = *r.drone.state();
        for _ in 0..10 {
            r.tick();
        }
        assert_ne!(*r.drone.state(), before, "the seeded vehicle keeps moving");
    }

    #[test]
    fn actuator_channels_route_to_the_three_banks() {
        let mut r = rig();
        let mut ch = [0.0_f32; 16];
        ch[0] = 0.1;
        ch[1] = 0.2;
        ch[2] = 0.3;
        ch[3] = 0.4;
        ch[4] = -0.5;
        ch[5] = 0.5;
        ch[8] = 0.9;
        r.relay.inject(actuator_controls(ch, true));
        r.tick();

        let bank = r.drone.eom.actuators();
        // test descriptors: vtol scale 1.0, ailerons 0.35, thrust 30.0
        assert_eq!(
            bank.vtol_propellers.control(),
            Vector4::new(0.1, 0.2, 0.3, 0.4)
        );
        let ail = bank.ailerons.control();
        assert!((ail[0] - -0.175).abs() < 1e-9 && (ail[1] - 0.175).abs() < 1e-9);
        assert!((bank.thrust_propellers.control()[0] - 27.0).abs() < 1e-9);
        assert!(r.drone.armed());
    }

    #[test]
    fn disarmed_mode_flag_clears_armed() {
        let mut r = rig();
        r.relay.inject(actuator_controls([0.0; 16], true));
        r.tick();
        assert!(r.drone.armed());
        r.relay.inject(actuator_controls([0.0; 16], false));
        r.tick();
        assert!(!r.drone.armed());
    }

    #[test]
    fn set_message_interval_acks_and_updates_the_period() {
        let mut r = rig();
        r.relay.inject(MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
            param1: 0.0,
            param2: 50_000.0,
            param3: 0.0,
            param4: 0.0,
            param5: 0.0,
            param6: 0.0,
            param7: 0.0,
            command: MavCmd::MAV_CMD_SET_MESSAGE_INTERVAL,
            target_system: 1,
            target_component: 1,
            confirmation: 0,
        }));
        r.tick();

        let acks: Vec<_> = r
            .relay
            .sent()
            .into_iter()
            .filter_map(|m| match m {
                MavMessage::COMMAND_ACK(a) => Some(a),
                _ => None,
            })
            .collect();
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].command, MavCmd::MAV_CMD_SET_MESSAGE_INTERVAL);
        assert_eq!(acks[0].result, MavResult::MAV_RESULT_ACCEPTED);
        assert_eq!(r.drone.hil_state_quaternion_period_us, 50_000);
    }

    #[test]
    fn quaternion_telemetry_honours_the_interval() {
        let mut r = rig();
        r.relay.inject(MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
            param2: 50_000.0,
            command: MavCmd::MAV_CMD_SET_MESSAGE_INTERVAL,
            ..Default::default()
        }));
        r.tick();
        r.relay.clear();

        // 10 ms ticks against a 50 ms interval: the strict elapsed-time
        // comparison publishes every sixth tick
        let mut quats = 0;
        for _ in 0..30 {
            r.tick();
            quats += count(&r.relay.sent(), |m| {
                matches!(m, MavMessage::HIL_STATE_QUATERNION(_))
            });
            r.relay.clear();
        }
        assert_eq!(quats, 5);
    }

    #[test]
    fn unknown_command_long_is_still_acked() {
        let mut r = rig();
        r.relay.inject(MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
            command: MavCmd::MAV_CMD_NAV_TAKEOFF,
            ..Default::default()
        }));
        r.tick();
        assert_eq!(
            count(&r.relay.sent(), |m| matches!(m, MavMessage::COMMAND_ACK(_))),
            1
        );
    }

    #[test]
    fn heartbeat_is_consumed_silently() {
        let mut r = rig();
        r.relay
            .inject(MavMessage::HEARTBEAT(Default::default()));
        r.tick();
        assert_eq!(
            count(&r.relay.sent(), |m| matches!(m, MavMessage::COMMAND_ACK(_))),
            0
        );
    }

    #[test]
    fn touchdown_is_clamped_at_the_runway() {
        let mut r = rig();
        // sinking onto the runway with zero thrust
        let mut x = StateVec::zeros();
        x[2] = -0.0005;
        x[5] = 1.0;
        r.drone.state = x;

        r.tick();

        let s = r.drone.state();
        assert_eq!(s[2], 0.0);
        assert_eq!(s[5], 0.0);
        assert_eq!(r.drone.derivative()[5], 9.81);
    }
}

//! A generic, table-driven finite-state machine.
//!
//! States and flags are small enum-like keys ([`MachineKey`]). The
//! transition table is a dense `states x flags` array, so a lookup is one
//! index computation. Each state owns a boxed [`StateBehavior`] whose
//! configuration is fixed when it is registered.
//!
//! # Hooks and flags
//!
//! Behaviors never hold a reference back to the machine. A hook raises flags
//! through its [`StateCx`]; once the hook returns, the machine applies the
//! queued flags in order, running `exit -> switch -> enter` for each mapped
//! one. A flag raised during an enter hook is therefore applied after that
//! hook finishes, and may itself trigger further transitions. The machine
//! does not guard against cycles: a table whose enter hooks keep raising
//! mapped flags never settles.
//!
//! Every applied transition is returned to the caller as a [`Transition`].

use std::collections::VecDeque;
use std::fmt::Debug;

/// A state or flag identifier usable as a table index.
pub trait MachineKey: Copy + Eq + Debug + 'static {
    /// Number of distinct keys.
    const COUNT: usize;

    /// Dense index in `0..COUNT`.
    fn index(self) -> usize;
}

/// One applied transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S, F> {
    /// State left.
    pub from: S,
    /// Flag that triggered the move.
    pub flag: F,
    /// State entered.
    pub to: S,
}

/// What a hook can see and do: its agent-local data, the shared
/// environment, and the flag queue.
pub struct StateCx<'a, F, L, E: ?Sized> {
    /// Data owned by the agent running the machine.
    pub local: &'a mut L,
    /// Shared, read-mostly environment.
    pub env: &'a E,
    raised: &'a mut VecDeque<F>,
}

impl<F, L, E: ?Sized> StateCx<'_, F, L, E> {
    /// Queue a flag. It is applied after the current hook returns.
    pub fn raise(&mut self, flag: F) {
        self.raised.push_back(flag);
    }
}

/// Behavior attached to one state.
///
/// All hooks default to doing nothing.
#[allow(unused_variables)]
pub trait StateBehavior<F, L, E: ?Sized>: Send {
    /// Runs when the state becomes current.
    fn on_enter(&mut self, cx: &mut StateCx<'_, F, L, E>) {}

    /// Runs once per machine tick while the state is current.
    fn on_tick(&mut self, cx: &mut StateCx<'_, F, L, E>, dt: f32) {}

    /// Runs when the state stops being current.
    fn on_exit(&mut self, cx: &mut StateCx<'_, F, L, E>) {}
}

/// A boxed state behavior.
pub type BoxedBehavior<F, L, E> = Box<dyn StateBehavior<F, L, E>>;

#[derive(Clone, Copy)]
enum Hook {
    Enter,
    Tick(f32),
    Exit,
}

/// The machine.
pub struct StateMachine<S, F, L, E: ?Sized> {
    current: Option<S>,
    table: Vec<Option<S>>,
    states: Vec<Option<BoxedBehavior<F, L, E>>>,
}

impl<S: MachineKey, F: MachineKey, L, E: ?Sized> Default for StateMachine<S, F, L, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, F, L, E: ?Sized> Debug for StateMachine<S, F, L, E>
where
    S: MachineKey,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("registered", &self.states.iter().filter(|s| s.is_some()).count())
            .finish_non_exhaustive()
    }
}

impl<S: MachineKey, F: MachineKey, L, E: ?Sized> StateMachine<S, F, L, E> {
    /// An empty machine: no states, no transitions, current state unset.
    pub fn new() -> Self {
        Self {
            current: None,
            table: vec![None; S::COUNT.saturating_mul(F::COUNT)],
            states: (0..S::COUNT).map(|_| None).collect(),
        }
    }

    /// Register the behavior of a state. The first registration wins;
    /// later ones are dropped and `false` is returned.
    pub fn add_state(&mut self, id: S, behavior: BoxedBehavior<F, L, E>) -> bool {
        let Some(slot) = self.states.get_mut(id.index()) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(behavior);
        true
    }

    /// Map `(from, flag)` to `to`, replacing any previous entry.
    pub fn set_transition(&mut self, from: S, flag: F, to: S) {
        if let Some(entry) = self.table.get_mut(Self::cell(from, flag)) {
            *entry = Some(to);
        }
    }

    /// The target of `(from, flag)`, if mapped.
    pub fn transition(&self, from: S, flag: F) -> Option<S> {
        self.table.get(Self::cell(from, flag)).copied().flatten()
    }

    /// The current state, or `None` before the first forced state.
    pub const fn current(&self) -> Option<S> {
        self.current
    }

    /// Whether a behavior is registered for `id`.
    pub fn is_registered(&self, id: S) -> bool {
        self.states.get(id.index()).is_some_and(Option::is_some)
    }

    /// Move to `id` unconditionally: exit the current state, set `id`, enter
    /// it. Hooks of unregistered states are skipped. Returns the transitions
    /// triggered by flags the hooks raised.
    pub fn force_state(&mut self, id: S, local: &mut L, env: &E) -> Vec<Transition<S, F>> {
        let mut queue = VecDeque::new();
        if let Some(current) = self.current {
            self.run_hook(current, Hook::Exit, local, env, &mut queue);
        }
        self.current = Some(id);
        self.run_hook(id, Hook::Enter, local, env, &mut queue);
        self.drain(queue, local, env)
    }

    /// Raise a flag from outside the machine.
    ///
    /// An unmapped flag is ignored: no hook runs and the result is empty.
    /// Otherwise the result starts with the transition the flag caused.
    pub fn raise_flag(&mut self, flag: F, local: &mut L, env: &E) -> Vec<Transition<S, F>> {
        self.drain(VecDeque::from([flag]), local, env)
    }

    /// Run the current state's tick hook. Ticking an unset or unregistered
    /// state does nothing.
    pub fn tick(&mut self, local: &mut L, env: &E, dt: f32) -> Vec<Transition<S, F>> {
        let Some(current) = self.current else {
            return Vec::new();
        };
        let mut queue = VecDeque::new();
        self.run_hook(current, Hook::Tick(dt), local, env, &mut queue);
        self.drain(queue, local, env)
    }

    fn cell(from: S, flag: F) -> usize {
        from.index() * F::COUNT + flag.index()
    }

    fn run_hook(&mut self, id: S, hook: Hook, local: &mut L, env: &E, queue: &mut VecDeque<F>) {
        let Some(Some(behavior)) = self.states.get_mut(id.index()) else {
            return;
        };
        let mut cx = StateCx {
            local,
            env,
            raised: queue,
        };
        match hook {
            Hook::Enter => behavior.on_enter(&mut cx),
            Hook::Tick(dt) => behavior.on_tick(&mut cx, dt),
            Hook::Exit => behavior.on_exit(&mut cx),
        }
    }

    fn drain(&mut self, mut queue: VecDeque<F>, local: &mut L, env: &E) -> Vec<Transition<S, F>> {
        let mut applied = Vec::new();
        while let Some(flag) = queue.pop_front() {
            let Some(from) = self.current else {
                continue;
            };
            let Some(to) = self.transition(from, flag) else {
                continue;
            };
            self.run_hook(from, Hook::Exit, local, env, &mut queue);
            self.current = Some(to);
            self.run_hook(to, Hook::Enter, local, env, &mut queue);
            applied.push(Transition { from, flag, to });
        }
        applied
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
        Amber,
    }

    impl MachineKey for Light {
        const COUNT: usize = 3;
        fn index(self) -> usize {
            self as usize
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Signal {
        Go,
        Slow,
        Stop,
    }

    impl MachineKey for Signal {
        const COUNT: usize = 3;
        fn index(self) -> usize {
            self as usize
        }
    }

    /// Hook log shared through the local data.
    #[derive(Default)]
    struct Log(Vec<String>);

    struct Recorder {
        name: &'static str,
        raise_on_enter: Option<Signal>,
        raise_on_tick: Option<Signal>,
    }

    impl Recorder {
        fn plain(name: &'static str) -> BoxedBehavior<Signal, Log, ()> {
            Box::new(Self {
                name,
                raise_on_enter: None,
                raise_on_tick: None,
            })
        }
    }

    impl StateBehavior<Signal, Log, ()> for Recorder {
        fn on_enter(&mut self, cx: &mut StateCx<'_, Signal, Log, ()>) {
            cx.local.0.push(format!("enter {}", self.name));
            if let Some(flag) = self.raise_on_enter {
                cx.raise(flag);
            }
        }

        fn on_tick(&mut self, cx: &mut StateCx<'_, Signal, Log, ()>, _dt: f32) {
            cx.local.0.push(format!("tick {}", self.name));
            if let Some(flag) = self.raise_on_tick {
                cx.raise(flag);
            }
        }

        fn on_exit(&mut self, cx: &mut StateCx<'_, Signal, Log, ()>) {
            cx.local.0.push(format!("exit {}", self.name));
        }
    }

    fn traffic() -> StateMachine<Light, Signal, Log, ()> {
        let mut m = StateMachine::new();
        m.add_state(Light::Red, Recorder::plain("red"));
        m.add_state(Light::Green, Recorder::plain("green"));
        m.add_state(Light::Amber, Recorder::plain("amber"));
        m.set_transition(Light::Red, Signal::Go, Light::Green);
        m.set_transition(Light::Green, Signal::Slow, Light::Amber);
        m.set_transition(Light::Amber, Signal::Stop, Light::Red);
        m
    }

    #[test]
    fn first_registration_wins() {
        let mut m = traffic();
        assert!(!m.add_state(Light::Red, Recorder::plain("impostor")));
        let mut log = Log::default();
        m.force_state(Light::Red, &mut log, &());
        assert_eq!(log.0, vec!["enter red"]);
    }

    #[test]
    fn force_state_runs_exit_then_enter() {
        let mut m = traffic();
        let mut log = Log::default();
        m.force_state(Light::Red, &mut log, &());
        m.force_state(Light::Amber, &mut log, &());
        assert_eq!(log.0, vec!["enter red", "exit red", "enter amber"]);
        assert_eq!(m.current(), Some(Light::Amber));
    }

    #[test]
    fn mapped_flag_exits_switches_enters() {
        let mut m = traffic();
        let mut log = Log::default();
        m.force_state(Light::Red, &mut log, &());
        log.0.clear();
        let applied = m.raise_flag(Signal::Go, &mut log, &());
        assert_eq!(
            applied,
            vec![Transition {
                from: Light::Red,
                flag: Signal::Go,
                to: Light::Green
            }]
        );
        assert_eq!(log.0, vec!["exit red", "enter green"]);
    }

    #[test]
    fn unmapped_flag_is_inert() {
        let mut m = traffic();
        let mut log = Log::default();
        m.force_state(Light::Red, &mut log, &());
        log.0.clear();
        assert!(m.raise_flag(Signal::Stop, &mut log, &()).is_empty());
        assert_eq!(m.current(), Some(Light::Red));
        assert!(log.0.is_empty());
    }

    #[test]
    fn unset_and_unregistered_ticks_are_noops() {
        let mut m: StateMachine<Light, Signal, Log, ()> = StateMachine::new();
        let mut log = Log::default();
        assert!(m.tick(&mut log, &(), 0.1).is_empty());
        assert_eq!(m.current(), None);

        m.force_state(Light::Green, &mut log, &());
        assert!(!m.is_registered(Light::Green));
        assert!(m.tick(&mut log, &(), 0.1).is_empty());
        assert_eq!(m.current(), Some(Light::Green));
        assert!(log.0.is_empty());
    }

    #[test]
    fn flags_raised_in_hooks_chain_after_the_hook() {
        let mut m: StateMachine<Light, Signal, Log, ()> = StateMachine::new();
        m.add_state(
            Light::Red,
            Box::new(Recorder {
                name: "red",
                raise_on_enter: None,
                raise_on_tick: Some(Signal::Go),
            }),
        );
        m.add_state(
            Light::Green,
            Box::new(Recorder {
                name: "green",
                raise_on_enter: Some(Signal::Slow),
                raise_on_tick: None,
            }),
        );
        m.add_state(Light::Amber, Recorder::plain("amber"));
        m.set_transition(Light::Red, Signal::Go, Light::Green);
        m.set_transition(Light::Green, Signal::Slow, Light::Amber);

        let mut log = Log::default();
        m.force_state(Light::Red, &mut log, &());
        log.0.clear();
        let applied = m.tick(&mut log, &(), 0.1);

        assert_eq!(applied.len(), 2);
        assert_eq!(applied[1].to, Light::Amber);
        assert_eq!(m.current(), Some(Light::Amber));
        assert_eq!(
            log.0,
            vec!["tick red", "exit red", "enter green", "exit green", "enter amber"]
        );
    }

    /// Raises `flag` on every enter until `budget` enters have happened,
    /// counted in the shared log.
    struct Bouncer {
        name: &'static str,
        flag: Signal,
        budget: usize,
    }

    impl StateBehavior<Signal, Log, ()> for Bouncer {
        fn on_enter(&mut self, cx: &mut StateCx<'_, Signal, Log, ()>) {
            cx.local.0.push(format!("enter {}", self.name));
            if cx.local.0.len() < self.budget {
                cx.raise(self.flag);
            }
        }
    }

    #[test]
    fn enter_hooks_raising_mapped_flags_cycle_until_they_stop() {
        let mut m: StateMachine<Light, Signal, Log, ()> = StateMachine::new();
        m.add_state(
            Light::Red,
            Box::new(Bouncer {
                name: "red",
                flag: Signal::Go,
                budget: 5,
            }),
        );
        m.add_state(
            Light::Green,
            Box::new(Bouncer {
                name: "green",
                flag: Signal::Stop,
                budget: 5,
            }),
        );
        m.set_transition(Light::Red, Signal::Go, Light::Green);
        m.set_transition(Light::Green, Signal::Stop, Light::Red);

        let mut log = Log::default();
        let applied = m.force_state(Light::Red, &mut log, &());

        let go = Transition {
            from: Light::Red,
            flag: Signal::Go,
            to: Light::Green,
        };
        let stop = Transition {
            from: Light::Green,
            flag: Signal::Stop,
            to: Light::Red,
        };
        assert_eq!(applied, vec![go, stop, go, stop]);
        assert_eq!(log.0, vec!["enter red", "enter green", "enter red", "enter green", "enter red"]);
        assert_eq!(m.current(), Some(Light::Red));
    }

    #[test]
    fn table_lookup_is_per_state() {
        let m = traffic();
        assert_eq!(m.transition(Light::Red, Signal::Go), Some(Light::Green));
        assert_eq!(m.transition(Light::Green, Signal::Go), None);
        assert_eq!(m.transition(Light::Amber, Signal::Stop), Some(Light::Red));
    }
}

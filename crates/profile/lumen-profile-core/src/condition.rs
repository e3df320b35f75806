//! Per-element activity state machine.
//!
//! A condition decides, once per tick and before the timeline advances,
//! whether its element is `Idle`, `Active` or `Stopping` (draining the End
//! segment). Event and static variants read a boolean signal from a node
//! script; the policy enums decide what an actionable trigger is and what a
//! trigger means while the element is already running.
//!
//! Script failures never abort the tick: the element is treated as idle for
//! that frame and the error lands in the frame report.

use serde::{Deserialize, Serialize};

use lumen_timeline_core::Timeline;

use crate::scripting::{ScriptContext, ScriptSource};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityState {
    #[default]
    Idle,
    Active,
    /// Stop requested; the End segment is draining and the element is still
    /// visible until it completes.
    Stopping,
}

impl ActivityState {
    /// Whether the element should render this tick.
    pub fn is_visible(&self) -> bool {
        !matches!(self, ActivityState::Idle)
    }
}

/// Which shape of the boolean signal counts as a trigger.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    #[default]
    RisingEdge,
    FallingEdge,
    /// Active exactly while the signal is high; dropping low requests a stop.
    Level,
}

/// What a trigger does while the element is already active.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapMode {
    /// Restart playback from position 0.
    #[default]
    Restart,
    /// Drop the trigger.
    Ignore,
    /// Remember one pending trigger and fire it when the current pass ends.
    Queue,
}

/// Whether a trigger while active toggles the element off instead of
/// following the overlap policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleOffMode {
    #[default]
    Ignore,
    Toggle,
}

/// How a play-once element starts when triggered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    #[default]
    FromStart,
    /// Continue an interrupted pass from where it left off.
    Resume,
}

/// Whether a second trigger can cut a play-once pass short.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopMode {
    /// Further triggers are ignored until the pass completes.
    #[default]
    Finish,
    /// A second trigger jumps straight into the End segment.
    SkipMain,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventCondition {
    pub trigger_mode: TriggerMode,
    pub overlap_mode: OverlapMode,
    pub toggle_off_mode: ToggleOffMode,
    /// Boolean trigger script. `None` means the element is only triggered
    /// externally (editor preview, host events).
    pub script: Option<ScriptSource>,
    #[serde(skip)]
    prev_signal: bool,
    #[serde(skip)]
    queued: bool,
}

impl EventCondition {
    pub fn new(
        trigger_mode: TriggerMode,
        overlap_mode: OverlapMode,
        toggle_off_mode: ToggleOffMode,
    ) -> Self {
        Self {
            trigger_mode,
            overlap_mode,
            toggle_off_mode,
            ..Default::default()
        }
    }

    pub fn with_script(mut self, script: ScriptSource) -> Self {
        self.script = Some(script);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayOnceCondition {
    pub play_mode: PlayMode,
    pub stop_mode: StopMode,
    pub script: Option<ScriptSource>,
    #[serde(skip)]
    prev_signal: bool,
}

impl PlayOnceCondition {
    pub fn new(play_mode: PlayMode, stop_mode: StopMode) -> Self {
        Self {
            play_mode,
            stop_mode,
            ..Default::default()
        }
    }

    pub fn with_script(mut self, script: ScriptSource) -> Self {
        self.script = Some(script);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCondition {
    pub script: ScriptSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Condition {
    AlwaysOn,
    Event(EventCondition),
    PlayOnce(PlayOnceCondition),
    Static(StaticCondition),
}

impl Default for Condition {
    fn default() -> Self {
        Condition::AlwaysOn
    }
}

impl Condition {
    /// Run one transition step. Called before the timeline advances.
    /// `external_trigger` is a host-supplied trigger pulse for this tick,
    /// OR-ed with the condition's own script signal.
    pub fn step(
        &mut self,
        activity: &mut ActivityState,
        timeline: &mut Timeline,
        external_trigger: bool,
        ctx: &mut ScriptContext<'_>,
    ) {
        match self {
            Condition::AlwaysOn => {
                *activity = ActivityState::Active;
                if !timeline.is_playing() {
                    timeline.trigger();
                }
            }
            Condition::Event(event) => {
                let signal = match read_signal(&mut event.script, external_trigger, ctx) {
                    Some(signal) => signal,
                    None => {
                        *activity = ActivityState::Idle;
                        return;
                    }
                };
                let fired = match event.trigger_mode {
                    TriggerMode::RisingEdge => signal && !event.prev_signal,
                    TriggerMode::FallingEdge => !signal && event.prev_signal,
                    TriggerMode::Level => signal,
                };
                event.prev_signal = signal;

                if event.trigger_mode == TriggerMode::Level {
                    step_level(activity, timeline, signal);
                    return;
                }
                if !fired {
                    return;
                }
                match *activity {
                    ActivityState::Idle => {
                        timeline.trigger();
                        *activity = ActivityState::Active;
                    }
                    ActivityState::Active => {
                        if event.toggle_off_mode == ToggleOffMode::Toggle {
                            timeline.request_stop();
                            *activity = ActivityState::Stopping;
                        } else {
                            match event.overlap_mode {
                                OverlapMode::Restart => timeline.trigger(),
                                OverlapMode::Ignore => {}
                                OverlapMode::Queue => event.queued = true,
                            }
                        }
                    }
                    // End is interruptible: a fresh trigger jumps back to Start.
                    ActivityState::Stopping => {
                        timeline.trigger();
                        *activity = ActivityState::Active;
                    }
                }
            }
            Condition::PlayOnce(once) => {
                let signal = match read_signal(&mut once.script, external_trigger, ctx) {
                    Some(signal) => signal,
                    None => {
                        *activity = ActivityState::Idle;
                        return;
                    }
                };
                let fired = signal && !once.prev_signal;
                once.prev_signal = signal;
                if !fired {
                    return;
                }
                match *activity {
                    ActivityState::Idle => {
                        match once.play_mode {
                            PlayMode::FromStart => timeline.trigger(),
                            PlayMode::Resume => timeline.resume(),
                        }
                        *activity = ActivityState::Active;
                    }
                    ActivityState::Active | ActivityState::Stopping => {
                        if once.stop_mode == StopMode::SkipMain
                            && *activity == ActivityState::Active
                        {
                            timeline.request_stop();
                            *activity = ActivityState::Stopping;
                        }
                    }
                }
            }
            Condition::Static(stat) => {
                let truthy = match stat.script.evaluate_bool(ctx) {
                    Ok(truthy) => truthy,
                    Err(err) => {
                        ctx.errors.push(err);
                        false
                    }
                } || external_trigger;
                if truthy {
                    *activity = ActivityState::Active;
                    if !timeline.is_playing() {
                        timeline.trigger();
                    }
                } else {
                    // No stop delay: visibility tracks the script directly.
                    *activity = ActivityState::Idle;
                    timeline.reset();
                }
            }
        }
    }

    /// Settle state after the timeline has advanced. `completed` is the
    /// timeline's report that End finished on this tick.
    pub fn after_advance(
        &mut self,
        activity: &mut ActivityState,
        timeline: &mut Timeline,
        completed: bool,
    ) {
        if !completed {
            return;
        }
        *activity = ActivityState::Idle;
        if let Condition::Event(event) = self {
            if event.queued {
                event.queued = false;
                timeline.trigger();
                *activity = ActivityState::Active;
            }
        }
    }
}

/// Combine the script signal with the host trigger. `None` marks a script
/// failure, which idles the element for this tick.
fn read_signal(
    script: &mut Option<ScriptSource>,
    external_trigger: bool,
    ctx: &mut ScriptContext<'_>,
) -> Option<bool> {
    let scripted = match script {
        Some(source) => match source.evaluate_bool(ctx) {
            Ok(value) => value,
            Err(err) => {
                ctx.errors.push(err);
                return None;
            }
        },
        None => false,
    };
    Some(scripted || external_trigger)
}

fn step_level(activity: &mut ActivityState, timeline: &mut Timeline, high: bool) {
    match (*activity, high) {
        (ActivityState::Idle, true) => {
            timeline.trigger();
            *activity = ActivityState::Active;
        }
        (ActivityState::Active, false) => {
            timeline.request_stop();
            *activity = ActivityState::Stopping;
        }
        (ActivityState::Stopping, true) => {
            timeline.trigger();
            *activity = ActivityState::Active;
        }
        _ => {}
    }
}

//! Frame runtime
//!
//! Owns the active achievements and leaderboards and evaluates all of them
//! once per emulated frame. Edits coming from other threads go through a
//! [`RuntimeHandle`] and are applied at the start of the next frame, so the
//! evaluation thread never shares a trigger with an editor.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::events::{EventCallback, EventHandler, RuntimeEvent};
use super::state::{AchievementStatus, LeaderboardStatus, RuntimeState, TriggerState};
use crate::config::{AchievementSetDocument, EngineConfig};
use crate::error::{Error, Result};
use crate::leaderboards::{Leaderboard, LeaderboardEvent, LeaderboardState, ValueFormat};
use crate::memory::MemoryReader;
use crate::notes::CodeNotes;
use crate::richpresence::RichPresence;
use crate::triggers::{parse_trigger, ParseMode, Trigger};

fn build_leaderboard(definition: &str, mode: ParseMode, format: Option<ValueFormat>) -> Result<Leaderboard> {
    let leaderboard = Leaderboard::parse(definition, mode)?;
    Ok(match format {
        Some(format) => leaderboard.with_default_format(format),
        None => leaderboard,
    })
}

struct Achievement {
    trigger: Trigger,
    state: TriggerState,
    measured: Option<(u32, u32)>,
}

impl Achievement {
    fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            state: TriggerState::Waiting,
            measured: None,
        }
    }
}

/// Edit queued by a [`RuntimeHandle`]
enum Edit {
    AddAchievement(u32, Trigger),
    RemoveAchievement(u32),
    ResetAchievement(u32),
    AddLeaderboard(u32, Leaderboard),
    RemoveLeaderboard(u32),
    Reset,
}

/// Thread-safe handle for editing a running [`Runtime`] and reading its
/// published state
#[derive(Clone)]
pub struct RuntimeHandle {
    pending: Arc<Mutex<Vec<Edit>>>,
    state: Arc<Mutex<RuntimeState>>,
    parse_mode: ParseMode,
}

impl RuntimeHandle {
    /// Queue a new or replacement achievement. The definition is parsed
    /// here, on the caller's thread.
    pub fn add_achievement(&self, id: u32, definition: &str) -> Result<()> {
        let trigger = parse_trigger(definition, self.parse_mode)?;
        self.pending.lock().push(Edit::AddAchievement(id, trigger));
        Ok(())
    }

    pub fn remove_achievement(&self, id: u32) {
        self.pending.lock().push(Edit::RemoveAchievement(id));
    }

    pub fn reset_achievement(&self, id: u32) {
        self.pending.lock().push(Edit::ResetAchievement(id));
    }

    pub fn add_leaderboard(&self, id: u32, definition: &str, format: Option<ValueFormat>) -> Result<()> {
        let leaderboard = build_leaderboard(definition, self.parse_mode, format)?;
        self.pending.lock().push(Edit::AddLeaderboard(id, leaderboard));
        Ok(())
    }

    pub fn remove_leaderboard(&self, id: u32) {
        self.pending.lock().push(Edit::RemoveLeaderboard(id));
    }

    /// Queue a reset of every achievement and leaderboard
    pub fn reset(&self) {
        self.pending.lock().push(Edit::Reset);
    }

    /// Number of edits waiting for the next frame
    pub fn pending_edits(&self) -> usize {
        self.pending.lock().len()
    }

    /// State published after the last frame
    pub fn state(&self) -> RuntimeState {
        self.state.lock().clone()
    }
}

/// Evaluates achievements and leaderboards frame by frame
pub struct Runtime {
    config: EngineConfig,
    achievements: BTreeMap<u32, Achievement>,
    leaderboards: BTreeMap<u32, Leaderboard>,
    notes: CodeNotes,
    rich_presence: Option<RichPresence>,
    /// Rich presence text from the last frame
    presence_text: Option<String>,
    unlocked: Vec<u32>,
    frame: u64,
    /// Edits queued by handles
    pending: Arc<Mutex<Vec<Edit>>>,
    /// Snapshot published after every frame
    state: Arc<Mutex<RuntimeState>>,
    /// Event handler for state change callbacks
    events: Arc<Mutex<EventHandler>>,
}

impl Runtime {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            achievements: BTreeMap::new(),
            leaderboards: BTreeMap::new(),
            notes: CodeNotes::new(),
            rich_presence: None,
            presence_text: None,
            unlocked: Vec::new(),
            frame: 0,
            pending: Arc::new(Mutex::new(Vec::new())),
            state: Arc::new(Mutex::new(RuntimeState::default())),
            events: Arc::new(Mutex::new(EventHandler::new())),
        }
    }

    /// Build a runtime from an achievement set. Definitions that fail to
    /// parse are skipped with a warning.
    pub fn from_document(document: &AchievementSetDocument, config: EngineConfig) -> Self {
        let mut runtime = Self::new(config);

        for achievement in &document.achievements {
            if let Err(e) = runtime.add_achievement(achievement.id, &achievement.trigger) {
                log::warn!("skipping achievement {} ({}): {}", achievement.id, achievement.title, e);
            }
        }
        for leaderboard in &document.leaderboards {
            if let Err(e) = runtime.add_leaderboard(leaderboard.id, &leaderboard.definition, leaderboard.format) {
                log::warn!("skipping leaderboard {} ({}): {}", leaderboard.id, leaderboard.title, e);
            }
        }
        runtime.notes = document.notes.iter().cloned().collect();
        if let Some(script) = &document.rich_presence {
            runtime.set_rich_presence(script);
        }

        log::info!(
            "runtime started for game {} with {} achievements and {} leaderboards",
            document.game.id,
            runtime.achievements.len(),
            runtime.leaderboards.len()
        );
        runtime
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle for queueing edits from other threads
    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            pending: Arc::clone(&self.pending),
            state: Arc::clone(&self.state),
            parse_mode: self.config.parse_mode,
        }
    }

    /// Register a callback for runtime events
    pub fn on_event(&self, callback: EventCallback) {
        self.events.lock().on_event(callback);
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn notes(&self) -> &CodeNotes {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut CodeNotes {
        &mut self.notes
    }

    /// Add or replace an achievement
    pub fn add_achievement(&mut self, id: u32, definition: &str) -> Result<()> {
        let trigger = parse_trigger(definition, self.config.parse_mode)?;
        self.add_achievement_trigger(id, trigger);
        Ok(())
    }

    pub fn add_achievement_trigger(&mut self, id: u32, trigger: Trigger) {
        if trigger.is_malformed() {
            log::warn!("achievement {} is malformed and will never trigger", id);
        }
        self.unlocked.retain(|&u| u != id);
        if self.achievements.insert(id, Achievement::new(trigger)).is_some() {
            log::debug!("achievement {} replaced", id);
        }
    }

    pub fn remove_achievement(&mut self, id: u32) -> Result<()> {
        self.achievements
            .remove(&id)
            .map(|_| self.unlocked.retain(|&u| u != id))
            .ok_or(Error::UnknownAchievement(id))
    }

    /// Clear an achievement's hits and history; it starts waiting again
    pub fn reset_achievement(&mut self, id: u32) -> Result<()> {
        let achievement = self.achievements.get_mut(&id).ok_or(Error::UnknownAchievement(id))?;
        achievement.trigger.reset();
        achievement.state = TriggerState::Waiting;
        achievement.measured = None;
        self.unlocked.retain(|&u| u != id);
        Ok(())
    }

    /// Enable or disable evaluation of an achievement
    pub fn set_achievement_active(&mut self, id: u32, active: bool) -> Result<()> {
        let achievement = self.achievements.get_mut(&id).ok_or(Error::UnknownAchievement(id))?;
        match (active, achievement.state) {
            (false, _) => achievement.state = TriggerState::Inactive,
            (true, TriggerState::Inactive) => {
                achievement.trigger.reset();
                achievement.state = TriggerState::Waiting;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn achievement_state(&self, id: u32) -> Option<TriggerState> {
        self.achievements.get(&id).map(|a| a.state)
    }

    pub fn trigger(&self, id: u32) -> Option<&Trigger> {
        self.achievements.get(&id).map(|a| &a.trigger)
    }

    /// Human-readable description of one condition, annotated with code notes
    pub fn describe_condition(&self, id: u32, group: usize, index: usize) -> Option<String> {
        let cond = self.trigger(id)?.group(group)?.get(index)?;
        Some(cond.describe(Some(&self.notes)))
    }

    /// Add or replace a leaderboard. `format` applies when the definition
    /// has no `FOR:` part.
    pub fn add_leaderboard(&mut self, id: u32, definition: &str, format: Option<ValueFormat>) -> Result<()> {
        let leaderboard = build_leaderboard(definition, self.config.parse_mode, format)?;
        self.leaderboards.insert(id, leaderboard);
        Ok(())
    }

    pub fn remove_leaderboard(&mut self, id: u32) -> Result<()> {
        self.leaderboards
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::UnknownLeaderboard(id))
    }

    pub fn reset_leaderboard(&mut self, id: u32) -> Result<()> {
        self.leaderboards
            .get_mut(&id)
            .map(Leaderboard::reset)
            .ok_or(Error::UnknownLeaderboard(id))
    }

    pub fn leaderboard(&self, id: u32) -> Option<&Leaderboard> {
        self.leaderboards.get(&id)
    }

    /// Reset every achievement and leaderboard, e.g. after the game is
    /// reset or a state is loaded
    pub fn reset(&mut self) {
        for achievement in self.achievements.values_mut() {
            achievement.trigger.reset();
            achievement.measured = None;
            if achievement.state != TriggerState::Inactive {
                achievement.state = TriggerState::Waiting;
            }
        }
        for leaderboard in self.leaderboards.values_mut() {
            leaderboard.reset();
        }
        if let Some(presence) = &mut self.rich_presence {
            presence.reset();
        }
        self.presence_text = None;
        self.unlocked.clear();
        log::info!("runtime reset");
    }

    /// Evaluate one frame
    pub fn do_frame(&mut self, reader: &dyn MemoryReader) {
        self.apply_pending();
        self.frame += 1;

        let mut events = Vec::new();
        let unlock_on_first_frame = self.config.unlock_on_first_frame;

        for (&id, achievement) in self.achievements.iter_mut() {
            if matches!(achievement.state, TriggerState::Inactive | TriggerState::Triggered) {
                continue;
            }

            let result = achievement.trigger.evaluate(reader);
            achievement.measured = result.measured.map(|m| (m.value.as_u32(), m.target));

            let waiting = achievement.state == TriggerState::Waiting;
            let next = if waiting && result.is_true && !unlock_on_first_frame {
                // already true: hold off until it has been false once
                achievement.trigger.reset_hits();
                TriggerState::Waiting
            } else if result.is_true {
                TriggerState::Triggered
            } else if result.is_paused {
                TriggerState::Paused
            } else if result.was_reset {
                TriggerState::Reset
            } else if result.is_primed {
                TriggerState::Primed
            } else {
                TriggerState::Active
            };

            if next != achievement.state {
                log::debug!("achievement {}: {:?} -> {:?}", id, achievement.state, next);
                achievement.state = next;
                events.push(RuntimeEvent::AchievementStateChanged { id, state: next });

                if next == TriggerState::Triggered {
                    log::info!("achievement {} unlocked", id);
                    self.unlocked.push(id);
                    events.push(RuntimeEvent::AchievementTriggered { id });
                }
            }
        }

        for (&id, leaderboard) in self.leaderboards.iter_mut() {
            let value = match leaderboard.update(reader) {
                Some(event) => (event, leaderboard.value()),
                None => continue,
            };
            events.push(match value {
                (LeaderboardEvent::Started, value) => {
                    log::info!("leaderboard {} started", id);
                    RuntimeEvent::LeaderboardStarted { id, value }
                }
                (LeaderboardEvent::Canceled, value) => {
                    log::info!("leaderboard {} canceled", id);
                    RuntimeEvent::LeaderboardCanceled { id, value }
                }
                (LeaderboardEvent::Submitted, value) => {
                    log::info!("leaderboard {} submitted: {}", id, leaderboard.formatted_value());
                    RuntimeEvent::LeaderboardSubmitted { id, value }
                }
            });
        }

        if let Some(presence) = &mut self.rich_presence {
            self.presence_text = Some(presence.evaluate(reader));
        }

        self.publish();

        let handler = self.events.lock();
        if handler.has_listeners() {
            for event in events {
                handler.emit(event);
            }
        }
    }

    /// Replace the rich presence script. A script without a default display
    /// line disables rich presence.
    pub fn set_rich_presence(&mut self, script: &str) {
        let presence = RichPresence::parse(script);
        if presence.is_enabled() {
            log::info!("rich presence enabled");
            self.rich_presence = Some(presence);
        } else {
            log::warn!("rich presence script has no display line");
            self.rich_presence = None;
        }
        self.presence_text = None;
    }

    /// Rich presence text from the last frame
    pub fn rich_presence(&self) -> Option<&str> {
        self.presence_text.as_deref()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> RuntimeState {
        self.state.lock().clone()
    }

    /// Current state as JSON
    pub fn state_json(&self) -> Result<String> {
        self.state.lock().to_json()
    }

    fn apply_pending(&mut self) {
        let edits = std::mem::take(&mut *self.pending.lock());
        for edit in edits {
            let outcome = match edit {
                Edit::AddAchievement(id, trigger) => {
                    self.add_achievement_trigger(id, trigger);
                    Ok(())
                }
                Edit::RemoveAchievement(id) => self.remove_achievement(id),
                Edit::ResetAchievement(id) => self.reset_achievement(id),
                Edit::AddLeaderboard(id, leaderboard) => {
                    self.leaderboards.insert(id, leaderboard);
                    Ok(())
                }
                Edit::RemoveLeaderboard(id) => self.remove_leaderboard(id),
                Edit::Reset => {
                    self.reset();
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                log::debug!("queued edit ignored: {}", e);
            }
        }
    }

    fn publish(&self) {
        let state = RuntimeState {
            frame: self.frame,
            unlocked: self.unlocked.clone(),
            active_leaderboards: self
                .leaderboards
                .iter()
                .filter(|(_, lb)| lb.state() == LeaderboardState::Started)
                .map(|(&id, _)| id)
                .collect(),
            achievements: self
                .achievements
                .iter()
                .map(|(&id, a)| AchievementStatus {
                    id,
                    state: a.state,
                    measured: a.measured,
                })
                .collect(),
            leaderboards: self
                .leaderboards
                .iter()
                .map(|(&id, lb)| LeaderboardStatus {
                    id,
                    state: lb.state(),
                    value: lb.value(),
                    formatted_value: lb.formatted_value(),
                })
                .collect(),
            rich_presence: self.presence_text.clone(),
        };
        *self.state.lock() = state;
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlock;

    fn collect_events(runtime: &Runtime) -> Arc<Mutex<Vec<RuntimeEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        runtime.on_event(Box::new(move |event| sink.lock().push(event)));
        events
    }

    #[test]
    fn test_waits_until_false_before_unlocking() {
        let mut runtime = Runtime::default();
        runtime.add_achievement(1, "0xH0000=1").unwrap();
        let events = collect_events(&runtime);

        let mut mem = MemoryBlock::from_bytes(vec![1]);
        runtime.do_frame(&mem);
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Waiting));

        mem.write_u8(0, 0);
        runtime.do_frame(&mem);
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Active));

        mem.write_u8(0, 1);
        runtime.do_frame(&mem);
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Triggered));
        assert!(runtime.state().is_unlocked(1));

        assert_eq!(
            *events.lock(),
            vec![
                RuntimeEvent::AchievementStateChanged { id: 1, state: TriggerState::Active },
                RuntimeEvent::AchievementStateChanged { id: 1, state: TriggerState::Triggered },
                RuntimeEvent::AchievementTriggered { id: 1 },
            ]
        );
    }

    #[test]
    fn test_unlock_on_first_frame() {
        let config = EngineConfig {
            unlock_on_first_frame: true,
            ..Default::default()
        };
        let mut runtime = Runtime::new(config);
        runtime.add_achievement(1, "0xH0000=1").unwrap();
        runtime.do_frame(&MemoryBlock::from_bytes(vec![1]));
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Triggered));
    }

    #[test]
    fn test_triggered_latches_until_reset() {
        let mut runtime = Runtime::default();
        runtime.add_achievement(1, "0xH0000=1").unwrap();
        let mut mem = MemoryBlock::new(1);
        runtime.do_frame(&mem);
        mem.write_u8(0, 1);
        runtime.do_frame(&mem);
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Triggered));

        mem.write_u8(0, 0);
        runtime.do_frame(&mem);
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Triggered));

        runtime.reset_achievement(1).unwrap();
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Waiting));
        assert!(runtime.reset_achievement(99).is_err());
    }

    #[test]
    fn test_paused_and_reset_states() {
        let mut runtime = Runtime::default();
        runtime.add_achievement(1, "0xH0000=1.5._P:0xH0001=1_R:0xH0002=1").unwrap();
        let mut mem = MemoryBlock::new(3);
        runtime.do_frame(&mem);
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Active));

        mem.write_u8(1, 1);
        runtime.do_frame(&mem);
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Paused));

        mem.write_u8(1, 0);
        mem.write_u8(2, 1);
        runtime.do_frame(&mem);
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Reset));
    }

    #[test]
    fn test_primed_state() {
        let mut runtime = Runtime::default();
        runtime.add_achievement(1, "0xH0000=1_T:0xH0001=1").unwrap();
        let mut mem = MemoryBlock::new(2);
        runtime.do_frame(&mem);
        mem.write_u8(0, 1);
        runtime.do_frame(&mem);
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Primed));
        mem.write_u8(1, 1);
        runtime.do_frame(&mem);
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Triggered));
    }

    #[test]
    fn test_inactive_achievement_is_skipped() {
        let mut runtime = Runtime::default();
        runtime.add_achievement(1, "0xH0000=1").unwrap();
        runtime.set_achievement_active(1, false).unwrap();
        let mem = MemoryBlock::new(1);
        runtime.do_frame(&mem);
        runtime.do_frame(&MemoryBlock::from_bytes(vec![1]));
        assert_eq!(runtime.achievement_state(1), Some(TriggerState::Inactive));
    }

    #[test]
    fn test_strict_mode_rejects_bad_definition() {
        let config = EngineConfig {
            parse_mode: ParseMode::Strict,
            ..Default::default()
        };
        let mut runtime = Runtime::new(config);
        assert!(matches!(runtime.add_achievement(1, "0xH0000=zz"), Err(Error::Parse(_))));
        assert!(runtime.trigger(1).is_none());
    }

    #[test]
    fn test_handle_edits_apply_on_next_frame() {
        let mut runtime = Runtime::default();
        let handle = runtime.handle();

        let editor = std::thread::spawn(move || {
            handle.add_achievement(7, "0xH0000=2").unwrap();
            handle
        });
        let handle = editor.join().unwrap();
        assert_eq!(handle.pending_edits(), 1);
        assert!(runtime.trigger(7).is_none());

        runtime.do_frame(&MemoryBlock::new(1));
        assert_eq!(handle.pending_edits(), 0);
        assert_eq!(runtime.achievement_state(7), Some(TriggerState::Active));
        assert_eq!(handle.state().frame, 1);

        handle.remove_achievement(7);
        runtime.do_frame(&MemoryBlock::new(1));
        assert!(runtime.trigger(7).is_none());
    }

    #[test]
    fn test_leaderboard_events() {
        let mut runtime = Runtime::default();
        runtime
            .add_leaderboard(3, "STA:0xH0000=1::CAN:0xH0001=1::SUB:0xH0002=1::VAL:0xH0003", Some(ValueFormat::Score))
            .unwrap();
        let events = collect_events(&runtime);

        runtime.do_frame(&MemoryBlock::from_bytes(vec![1, 0, 0, 4]));
        assert_eq!(runtime.state().active_leaderboards, vec![3]);
        runtime.do_frame(&MemoryBlock::from_bytes(vec![1, 0, 1, 18]));

        assert_eq!(
            *events.lock(),
            vec![
                RuntimeEvent::LeaderboardStarted { id: 3, value: 4 },
                RuntimeEvent::LeaderboardSubmitted { id: 3, value: 18 },
            ]
        );
        let state = runtime.state();
        assert!(state.active_leaderboards.is_empty());
        assert_eq!(state.leaderboard(3).unwrap().formatted_value, "000018 Points");
    }

    #[test]
    fn test_state_json_export() {
        let mut runtime = Runtime::default();
        runtime.add_achievement(1, "M:0xH0000=10").unwrap();
        runtime.do_frame(&MemoryBlock::from_bytes(vec![4]));

        let json = runtime.state_json().unwrap();
        let state = RuntimeState::from_json(&json).unwrap();
        assert_eq!(state.frame, 1);
        assert_eq!(state.achievement(1).unwrap().measured, Some((4, 10)));
    }

    #[test]
    fn test_from_document_skips_bad_definitions() {
        let document = AchievementSetDocument::from_toml_str(
            r#"
            [game]
            id = 1

            [[achievements]]
            id = 1
            trigger = "0xH0000=1"

            [[achievements]]
            id = 2
            trigger = "0xH0000=zz"

            [[leaderboards]]
            id = 5
            definition = "STA:0xH0000=1"

            [[notes]]
            address = 0
            note = "Lives"
        "#,
        )
        .unwrap();
        let config = EngineConfig {
            parse_mode: ParseMode::Strict,
            ..Default::default()
        };
        let runtime = Runtime::from_document(&document, config);
        assert!(runtime.trigger(1).is_some());
        assert!(runtime.trigger(2).is_none());
        assert!(runtime.leaderboard(5).is_none());
        assert_eq!(runtime.describe_condition(1, 0, 0).unwrap(), "8-bit 0x0000 (Lives) = 1");
    }

    #[test]
    fn test_declared_format_takes_precedence() {
        let document = AchievementSetDocument::from_toml_str(
            r#"
            [[leaderboards]]
            id = 1
            definition = "STA:0xH0000=1::CAN:0xH0001=1::SUB:0xH0002=1::VAL:0xH0003::FOR:SCORE"

            [[leaderboards]]
            id = 2
            definition = "STA:0xH0000=1::CAN:0xH0001=1::SUB:0xH0002=1::VAL:0xH0003::FOR:SCORE"
            format = "frames"

            [[leaderboards]]
            id = 3
            definition = "STA:0xH0000=1::CAN:0xH0001=1::SUB:0xH0002=1::VAL:0xH0003"
            format = "frames"
        "#,
        )
        .unwrap();
        let runtime = Runtime::from_document(&document, EngineConfig::default());
        assert_eq!(runtime.leaderboard(1).unwrap().format(), ValueFormat::Score);
        assert_eq!(runtime.leaderboard(2).unwrap().format(), ValueFormat::Score);
        assert_eq!(runtime.leaderboard(3).unwrap().format(), ValueFormat::Frames);
    }

    #[test]
    fn test_rich_presence_published() {
        let mut runtime = Runtime::default();
        runtime.set_rich_presence("Lookup:Stage\n1=Forest\n2=Castle\n*=Map\n\nDisplay:\nIn the @Stage(0xH0000)");
        let mut mem = MemoryBlock::new(4);
        assert_eq!(runtime.rich_presence(), None);

        runtime.do_frame(&mem);
        assert_eq!(runtime.rich_presence(), Some("In the Map"));

        mem.write_u8(0, 2);
        runtime.do_frame(&mem);
        assert_eq!(runtime.state().rich_presence.as_deref(), Some("In the Castle"));

        runtime.reset();
        assert_eq!(runtime.rich_presence(), None);
    }

    #[test]
    fn test_rich_presence_without_display_disabled() {
        let mut runtime = Runtime::default();
        runtime.set_rich_presence("Lookup:Stage\n1=Forest");
        runtime.do_frame(&MemoryBlock::new(4));
        assert_eq!(runtime.state().rich_presence, None);
    }
}

//! Triggers: a core group plus alt groups

use std::fmt;
use std::str::FromStr;

use super::evaluator::{evaluate_group, EvaluationContext, GroupOutcome, Measurement, Pass};
use super::types::OperandRefs;
use super::{indirect, parser, serializer, ConditionGroup, ConditionType, Operand, TypedValue};
use crate::error::ParseError;
use crate::memory::{MemRefs, MemoryReader};

/// Outcome of one frame of evaluation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriggerResult {
    /// Core and (any alt, or no alts) held this frame
    pub is_true: bool,
    /// A ResetIf held and every hit count was cleared
    pub was_reset: bool,
    /// A PauseIf held; nothing else was evaluated
    pub is_paused: bool,
    /// Everything except the Trigger conditions held
    pub is_primed: bool,
    /// Largest measured value across groups
    pub measured: Option<Measurement>,
}

/// A parsed trigger or value expression with its memory history
#[derive(Debug, Clone)]
pub struct Trigger {
    core: ConditionGroup,
    alts: Vec<ConditionGroup>,
    memrefs: MemRefs,
    requires_comparison: bool,
    has_pause: bool,
    /// Parsed with lenient repairs; never reports true
    malformed: bool,
    last_measured: Option<Measurement>,
}

impl Trigger {
    /// Build an achievement trigger from its core and alt groups
    pub fn new(core: ConditionGroup, alts: Vec<ConditionGroup>) -> Self {
        let mut trigger = Self {
            core,
            alts,
            memrefs: MemRefs::new(),
            requires_comparison: true,
            has_pause: false,
            malformed: false,
            last_measured: None,
        };
        trigger.bind();
        trigger
    }

    /// Build a value expression. Groups are alternatives; the largest
    /// measured value wins.
    pub fn new_value(core: ConditionGroup, alts: Vec<ConditionGroup>) -> Self {
        let mut trigger = Self::new(core, alts);
        trigger.requires_comparison = false;
        trigger
    }

    /// Parse leniently. Malformed pieces become zero constants.
    pub fn parse(text: &str) -> Self {
        parser::parse_trigger_lenient(text)
    }

    pub(crate) fn with_malformed(mut self, malformed: bool) -> Self {
        self.malformed = malformed;
        self
    }

    /// Whether the definition needed lenient repairs when parsed
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    /// Whether this is an achievement trigger (true) or a value (false)
    pub fn requires_comparison(&self) -> bool {
        self.requires_comparison
    }

    pub fn core(&self) -> &ConditionGroup {
        &self.core
    }

    pub fn alts(&self) -> &[ConditionGroup] {
        &self.alts
    }

    /// Group by index: 0 is the core, 1.. are the alts
    pub fn group(&self, index: usize) -> Option<&ConditionGroup> {
        match index {
            0 => Some(&self.core),
            n => self.alts.get(n - 1),
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = &ConditionGroup> {
        std::iter::once(&self.core).chain(self.alts.iter())
    }

    fn groups_mut(&mut self) -> impl Iterator<Item = &mut ConditionGroup> {
        std::iter::once(&mut self.core).chain(self.alts.iter_mut())
    }

    /// Current hit count of a condition
    pub fn hits(&self, group: usize, index: usize) -> Option<u32> {
        self.group(group)?.get(index).map(|c| c.current_hits)
    }

    /// Whether any condition has accumulated hits
    pub fn has_hits(&self) -> bool {
        self.groups()
            .flat_map(|g| g.conditions())
            .any(|c| c.current_hits > 0)
    }

    pub fn measured(&self) -> Option<Measurement> {
        self.last_measured
    }

    /// Clear every hit count
    pub fn reset_hits(&mut self) {
        for group in self.groups_mut() {
            group.reset_hits();
        }
    }

    /// Clear hit counts and memory history
    pub fn reset(&mut self) {
        self.reset_hits();
        self.last_measured = None;
        self.bind();
    }

    /// Assign memory slots to every memory operand
    fn bind(&mut self) {
        let mut memrefs = MemRefs::new();
        let mut has_pause = false;

        for group in std::iter::once(&mut self.core).chain(self.alts.iter_mut()) {
            has_pause |= group.has_pause();
            let mut after_add_address = false;
            for cond in group.conditions_mut() {
                let indirect = after_add_address;
                let mut alloc = |operand: &Operand| match *operand {
                    Operand::Memory { size, address, .. } if indirect => Some(memrefs.alloc_indirect(address, size)),
                    Operand::Memory { size, address, .. } => Some(memrefs.alloc(address, size)),
                    _ => None,
                };
                cond.refs = OperandRefs {
                    source: alloc(&cond.source),
                    target: cond.target.as_ref().and_then(&mut alloc),
                    indirect,
                };
                after_add_address = cond.condition_type == ConditionType::AddAddress;
            }
        }

        self.memrefs = memrefs;
        self.has_pause = has_pause;
    }

    /// Advance memory history and evaluate one frame
    pub fn evaluate(&mut self, reader: &dyn MemoryReader) -> TriggerResult {
        let Trigger {
            core,
            alts,
            memrefs,
            has_pause,
            malformed,
            last_measured,
            ..
        } = self;

        memrefs.update(reader);
        let mut ctx = EvaluationContext::new(reader, memrefs);

        if *has_pause {
            for group in std::iter::once(&mut *core).chain(alts.iter_mut()) {
                if evaluate_group(group, &mut ctx, Pass::PauseChains).is_paused {
                    log::trace!("trigger paused");
                    return TriggerResult {
                        is_paused: true,
                        measured: *last_measured,
                        ..Default::default()
                    };
                }
            }
        }

        let core_outcome = evaluate_group(core, &mut ctx, Pass::Main);
        let alt_outcomes: Vec<GroupOutcome> = alts
            .iter_mut()
            .map(|g| evaluate_group(g, &mut ctx, Pass::Main))
            .collect();

        let was_reset = core_outcome.was_reset || alt_outcomes.iter().any(|o| o.was_reset);
        let any_alt = |f: fn(&GroupOutcome) -> bool| alt_outcomes.is_empty() || alt_outcomes.iter().any(f);
        let is_true = !*malformed && !was_reset && core_outcome.is_true && any_alt(|o| o.is_true);
        let is_primed = !*malformed && !was_reset && core_outcome.is_primed && any_alt(|o| o.is_primed);

        let measured = std::iter::once(&core_outcome)
            .chain(alt_outcomes.iter())
            .filter_map(|o| {
                o.measured.map(|m| {
                    if o.measure_blocked {
                        Measurement {
                            value: TypedValue::Unsigned(0),
                            target: m.target,
                        }
                    } else {
                        m
                    }
                })
            })
            .fold(None, |best: Option<Measurement>, m| match best {
                Some(b) if b.value.as_f64() >= m.value.as_f64() => Some(b),
                _ => Some(m),
            });

        *last_measured = measured;
        if was_reset {
            self.reset_hits();
        }

        TriggerResult {
            is_true,
            was_reset,
            is_paused: false,
            is_primed,
            measured,
        }
    }

    /// Evaluate a value expression for one frame
    pub fn evaluate_value(&mut self, reader: &dyn MemoryReader) -> TypedValue {
        self.evaluate(reader)
            .measured
            .map(|m| m.value)
            .unwrap_or_default()
    }

    /// Effective source address of a condition, following the AddAddress
    /// chain in front of it against the current memory contents.
    /// Memory history is not advanced.
    pub fn resolve_address(&self, group: usize, index: usize, reader: &dyn MemoryReader) -> Option<u32> {
        let group = self.group(group)?;
        let cond = group.get(index)?;
        let chain = &group.conditions()[group.indirect_chain(index)];

        let mut memrefs = self.memrefs.clone();
        memrefs.update(reader);
        let mut ctx = EvaluationContext::new(reader, &mut memrefs);
        indirect::resolve_address(chain, cond, &mut ctx)
    }
}

impl FromStr for Trigger {
    type Err = ParseError;

    /// Strict parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse_trigger(s, parser::ParseMode::Strict)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serializer::serialize_trigger(self))
    }
}
